//! Workbook type - the main document structure

use crate::cell::datetime::DateSystem;
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;

/// What kind of sheet occupies a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    /// A regular grid of cells
    Worksheet,
    /// A chartsheet, dialogsheet or anything else without cell data
    Other,
}

/// One tab of the workbook, in display order
#[derive(Debug, Clone)]
pub struct SheetEntry {
    /// Sheet name as shown on the tab
    pub name: String,
    /// Sheet kind
    pub kind: SheetKind,
    /// Cell data, present only for worksheets that were loaded
    pub worksheet: Option<Worksheet>,
}

/// A workbook (spreadsheet document)
///
/// Sheets are kept in tab order. Only the sheets a reader chose to load
/// carry cell data.
#[derive(Debug, Default)]
pub struct Workbook {
    /// Tabs in display order
    sheets: Vec<SheetEntry>,
    /// Active sheet index, as recorded in the file
    active_sheet: usize,
    /// Date system used for serial dates
    date_system: DateSystem,
}

impl Workbook {
    /// Create an empty workbook with no sheets
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the number of sheets (of any kind)
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Iterate over sheet names in tab order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Get a sheet entry by index
    pub fn sheet(&self, index: usize) -> Option<&SheetEntry> {
        self.sheets.get(index)
    }

    /// Get a loaded worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index).and_then(|s| s.worksheet.as_ref())
    }

    /// Append a sheet entry, returning its index
    pub fn push_sheet(&mut self, entry: SheetEntry) -> usize {
        self.sheets.push(entry);
        self.sheets.len() - 1
    }

    /// Attach loaded cell data to an existing worksheet entry
    pub fn attach_worksheet(&mut self, index: usize, worksheet: Worksheet) -> Result<()> {
        let count = self.sheets.len();
        let entry = self
            .sheets
            .get_mut(index)
            .ok_or_else(|| Error::other(format!("Sheet index {} out of bounds (count: {})", index, count)))?;
        entry.worksheet = Some(worksheet);
        Ok(())
    }

    /// Set the active sheet index
    ///
    /// The index is not validated here; [`Workbook::active_worksheet`]
    /// reports an index that names no sheet.
    pub fn set_active_sheet(&mut self, index: usize) {
        self.active_sheet = index;
    }

    /// Get the date system
    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Set the date system
    pub fn set_date_system(&mut self, system: DateSystem) {
        self.date_system = system;
    }

    /// Resolve the active sheet to its worksheet
    pub fn active_worksheet(&self) -> Result<&Worksheet> {
        if self.sheets.is_empty() {
            return Err(Error::NoSheets);
        }
        let entry = self
            .sheets
            .get(self.active_sheet)
            .ok_or(Error::ActiveSheetOutOfRange(self.active_sheet, self.sheets.len()))?;

        match (entry.kind, &entry.worksheet) {
            (SheetKind::Worksheet, Some(ws)) => Ok(ws),
            (SheetKind::Worksheet, None) => Err(Error::other(format!(
                "Active sheet '{}' was not loaded",
                entry.name
            ))),
            (SheetKind::Other, _) => Err(Error::NotAWorksheet(entry.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: SheetKind) -> SheetEntry {
        SheetEntry {
            name: name.to_string(),
            kind,
            worksheet: None,
        }
    }

    #[test]
    fn test_no_sheets() {
        let wb = Workbook::empty();
        assert!(matches!(wb.active_worksheet(), Err(Error::NoSheets)));
    }

    #[test]
    fn test_active_worksheet() {
        let mut wb = Workbook::empty();
        wb.push_sheet(entry("First", SheetKind::Worksheet));
        let idx = wb.push_sheet(entry("Second", SheetKind::Worksheet));
        wb.attach_worksheet(idx, Worksheet::new("Second")).unwrap();
        wb.set_active_sheet(idx);

        assert_eq!(wb.active_worksheet().unwrap().name(), "Second");
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["First", "Second"]);
    }

    #[test]
    fn test_active_out_of_range() {
        let mut wb = Workbook::empty();
        wb.push_sheet(entry("Only", SheetKind::Worksheet));
        wb.set_active_sheet(3);
        assert!(matches!(
            wb.active_worksheet(),
            Err(Error::ActiveSheetOutOfRange(3, 1))
        ));
    }

    #[test]
    fn test_active_chartsheet() {
        let mut wb = Workbook::empty();
        wb.push_sheet(entry("Chart1", SheetKind::Other));
        assert!(matches!(
            wb.active_worksheet(),
            Err(Error::NotAWorksheet(name)) if name == "Chart1"
        ));
    }

    #[test]
    fn test_attach_out_of_bounds() {
        let mut wb = Workbook::empty();
        assert!(wb.attach_worksheet(0, Worksheet::new("x")).is_err());
    }
}
