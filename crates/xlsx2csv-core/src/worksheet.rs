//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellValue};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely in row-major order. Reading goes through
/// [`Worksheet::rows`], which fills the gaps back in.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell values keyed by row, then column
    cells: BTreeMap<u32, BTreeMap<u16, CellValue>>,
    /// Bottom-right corner of every cell element seen, valued or not
    last_cell: Option<CellAddress>,
    /// Bottom-right corner of the `<dimension>` the file declared
    declared_end: Option<CellAddress>,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a cell value by row/column index (0-based)
    ///
    /// Storing [`CellValue::Empty`] still counts toward the sheet's extent,
    /// the way a styled but blank cell does.
    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        Self::validate_cell_position(row, col)?;
        self.touch(row, col);

        let value = value.into();
        if !value.is_empty() {
            self.cells.entry(row).or_default().insert(col, value);
        }
        Ok(())
    }

    /// Get a cell value by row/column index (0-based)
    pub fn get_value_at(&self, row: u32, col: u16) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells
            .get(&row)
            .and_then(|r| r.get(&col))
            .unwrap_or(&EMPTY)
    }

    /// Get a cell value by A1-style address
    pub fn get_value(&self, address: &str) -> Result<&CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Record the `<dimension>` range declared by the file
    pub fn set_declared_end(&mut self, end: CellAddress) {
        self.declared_end = Some(end);
    }

    /// Number of rows and columns to emit, counted from A1
    ///
    /// Returns `None` for a sheet without any cell elements, whatever
    /// dimension it declares.
    pub fn extent(&self) -> Option<(u32, u16)> {
        let last = self.last_cell?;
        let (row, col) = match self.declared_end {
            Some(d) => (last.row.max(d.row), last.col.max(d.col)),
            None => (last.row, last.col),
        };
        Some((row + 1, col + 1))
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    /// Iterate over every row from the top, each padded to the full width
    pub fn rows(&self) -> Rows<'_> {
        let (row_count, col_count) = self.extent().unwrap_or((0, 0));
        Rows {
            sheet: self,
            next_row: 0,
            row_count,
            col_count,
        }
    }

    fn touch(&mut self, row: u32, col: u16) {
        self.last_cell = Some(match self.last_cell {
            Some(last) => CellAddress::new(last.row.max(row), last.col.max(col)),
            None => CellAddress::new(row, col),
        });
    }

    fn validate_cell_position(row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
        }
        Ok(())
    }
}

/// Iterator over the dense rows of a [`Worksheet`]
#[derive(Debug)]
pub struct Rows<'a> {
    sheet: &'a Worksheet,
    next_row: u32,
    row_count: u32,
    col_count: u16,
}

impl Iterator for Rows<'_> {
    type Item = Vec<CellValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row >= self.row_count {
            return None;
        }
        let row_idx = self.next_row;
        self.next_row += 1;

        let mut row = vec![CellValue::Empty; self.col_count as usize];
        if let Some(cells) = self.sheet.cells.get(&row_idx) {
            for (&col, value) in cells {
                if let Some(slot) = row.get_mut(col as usize) {
                    *slot = value.clone();
                }
            }
        }
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.row_count - self.next_row) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(sheet: &Worksheet) -> Vec<Vec<String>> {
        sheet
            .rows()
            .map(|r| r.iter().map(CellValue::to_text).collect())
            .collect()
    }

    #[test]
    fn test_empty_sheet_has_no_rows() {
        let mut sheet = Worksheet::new("Empty");
        assert_eq!(sheet.extent(), None);
        assert_eq!(sheet.rows().count(), 0);

        // A declared dimension alone does not create rows
        sheet.set_declared_end(CellAddress::new(0, 0));
        assert_eq!(sheet.rows().count(), 0);
    }

    #[test]
    fn test_rows_are_padded_and_gaps_filled() {
        let mut sheet = Worksheet::new("Data");
        sheet.set_value_at(0, 0, "Name").unwrap();
        sheet.set_value_at(0, 1, "Age").unwrap();
        sheet.set_value_at(2, 0, "Bo").unwrap();

        assert_eq!(sheet.extent(), Some((3, 2)));
        assert_eq!(
            texts(&sheet),
            vec![vec!["Name", "Age"], vec!["", ""], vec!["Bo", ""]]
        );
    }

    #[test]
    fn test_rows_start_at_a1() {
        let mut sheet = Worksheet::new("Offset");
        sheet.set_value_at(1, 2, 5.0).unwrap();
        assert_eq!(
            texts(&sheet),
            vec![vec!["", "", ""], vec!["", "", "5"]]
        );
    }

    #[test]
    fn test_valueless_cell_extends_extent() {
        let mut sheet = Worksheet::new("Styled");
        sheet.set_value_at(0, 0, "x").unwrap();
        sheet.set_value_at(3, 4, CellValue::Empty).unwrap();
        assert_eq!(sheet.extent(), Some((4, 5)));
        assert_eq!(sheet.cell_count(), 1);
    }

    #[test]
    fn test_declared_dimension_extends_extent() {
        let mut sheet = Worksheet::new("Dim");
        sheet.set_value_at(0, 0, "x").unwrap();
        sheet.set_declared_end(CellAddress::new(2, 1));
        assert_eq!(sheet.extent(), Some((3, 2)));

        // Cells beyond a stale dimension still count
        sheet.set_value_at(5, 0, "y").unwrap();
        assert_eq!(sheet.extent(), Some((6, 2)));
    }

    #[test]
    fn test_get_value() {
        let mut sheet = Worksheet::new("S");
        sheet.set_value_at(1, 1, true).unwrap();
        assert_eq!(sheet.get_value("B2").unwrap(), &CellValue::Boolean(true));
        assert_eq!(sheet.get_value("C9").unwrap(), &CellValue::Empty);
        assert!(sheet.get_value("9C").is_err());
    }

    #[test]
    fn test_bounds_are_validated() {
        let mut sheet = Worksheet::new("S");
        assert!(sheet.set_value_at(MAX_ROWS, 0, 1.0).is_err());
        assert!(sheet.set_value_at(0, MAX_COLS, 1.0).is_err());
    }

    #[test]
    fn test_rows_exact_size() {
        let mut sheet = Worksheet::new("S");
        sheet.set_value_at(9, 0, 1.0).unwrap();
        let mut rows = sheet.rows();
        assert_eq!(rows.len(), 10);
        rows.next();
        assert_eq!(rows.len(), 9);
    }
}
