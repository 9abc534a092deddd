//! In-memory XLSX builder for tests
//!
//! Produces the smallest package the reader accepts: content types, the
//! workbook and its relationships, optional shared strings and styles, and
//! one part per sheet.
//!
//! ```rust,ignore
//! use xlsx2csv_xlsx::fixture::{FixtureCell, XlsxFixture};
//! use xlsx2csv_xlsx::XlsxReader;
//! use std::io::Cursor;
//!
//! let bytes = XlsxFixture::new()
//!     .sheet("Data", vec![vec![FixtureCell::text("Name"), FixtureCell::number(30.0)]])
//!     .build()
//!     .unwrap();
//!
//! let workbook = XlsxReader::read(Cursor::new(bytes)).unwrap();
//! assert_eq!(workbook.active_worksheet().unwrap().name(), "Data");
//! ```

use std::io::{Cursor, Write};
use std::path::Path;

use crate::error::XlsxResult;
use xlsx2csv_core::CellAddress;

/// One cell of a fixture row
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureCell {
    /// No `<c>` element at all
    Absent,
    /// A `<c>` element without a value
    Blank,
    /// Shared string
    Text(String),
    /// Inline string (`t="inlineStr"`)
    Inline(String),
    /// Number, optionally with a `cellXfs` index
    Number(f64, Option<u32>),
    /// Boolean
    Bool(bool),
    /// Cached error code
    Error(String),
    /// Formula with an optional cached string result
    Formula(String, Option<String>),
    /// Verbatim cell XML; `{r}` is replaced by the cell reference
    Raw(String),
}

impl FixtureCell {
    /// Shared string cell
    pub fn text<S: Into<String>>(s: S) -> Self {
        FixtureCell::Text(s.into())
    }

    /// Plain number cell
    pub fn number(n: f64) -> Self {
        FixtureCell::Number(n, None)
    }

    /// Number cell formatted by `cellXfs` entry `xf`
    pub fn styled(n: f64, xf: u32) -> Self {
        FixtureCell::Number(n, Some(xf))
    }
}

#[derive(Debug, Clone)]
enum FixtureSheet {
    Rows {
        name: String,
        rows: Vec<Vec<FixtureCell>>,
        dimension: Option<String>,
    },
    Xml {
        name: String,
        sheet_data: String,
    },
    Chart {
        name: String,
    },
}

impl FixtureSheet {
    fn name(&self) -> &str {
        match self {
            FixtureSheet::Rows { name, .. }
            | FixtureSheet::Xml { name, .. }
            | FixtureSheet::Chart { name } => name,
        }
    }
}

/// Builder for minimal XLSX packages
#[derive(Debug, Clone, Default)]
pub struct XlsxFixture {
    sheets: Vec<FixtureSheet>,
    active_tab: Option<usize>,
    date1904: bool,
    num_fmts: Vec<(u32, String)>,
    cell_xfs: Vec<u32>,
    workbook_name: Option<String>,
    shared_strings_name: Option<String>,
}

impl XlsxFixture {
    /// Start an empty workbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet built from rows of cells
    pub fn sheet<S: Into<String>>(mut self, name: S, rows: Vec<Vec<FixtureCell>>) -> Self {
        self.sheets.push(FixtureSheet::Rows {
            name: name.into(),
            rows,
            dimension: None,
        });
        self
    }

    /// Add a worksheet with a declared `<dimension ref>`
    pub fn sheet_with_dimension<S: Into<String>>(
        mut self,
        name: S,
        dimension: &str,
        rows: Vec<Vec<FixtureCell>>,
    ) -> Self {
        self.sheets.push(FixtureSheet::Rows {
            name: name.into(),
            rows,
            dimension: Some(dimension.to_string()),
        });
        self
    }

    /// Add a worksheet whose `<sheetData>` content is given verbatim
    pub fn sheet_xml<S: Into<String>>(mut self, name: S, sheet_data: &str) -> Self {
        self.sheets.push(FixtureSheet::Xml {
            name: name.into(),
            sheet_data: sheet_data.to_string(),
        });
        self
    }

    /// Add a chartsheet tab
    pub fn chartsheet<S: Into<String>>(mut self, name: S) -> Self {
        self.sheets.push(FixtureSheet::Chart { name: name.into() });
        self
    }

    /// Record `activeTab` in the workbook view
    pub fn active(mut self, tab: usize) -> Self {
        self.active_tab = Some(tab);
        self
    }

    /// Use the 1904 date system
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Declare a custom number format
    pub fn num_fmt(mut self, id: u32, code: &str) -> Self {
        self.num_fmts.push((id, code.to_string()));
        self
    }

    /// Append a `cellXfs` entry; its index is the order of calls
    pub fn cell_xf(mut self, num_fmt_id: u32) -> Self {
        self.cell_xfs.push(num_fmt_id);
        self
    }

    /// Store the workbook part as `xl/<name>` instead of `xl/workbook.xml`
    pub fn workbook_part_name(mut self, name: &str) -> Self {
        self.workbook_name = Some(name.to_string());
        self
    }

    /// Store shared strings as `xl/<name>` instead of `xl/sharedStrings.xml`
    pub fn shared_strings_part_name(mut self, name: &str) -> Self {
        self.shared_strings_name = Some(name.to_string());
        self
    }

    fn has_styles(&self) -> bool {
        !self.cell_xfs.is_empty() || !self.num_fmts.is_empty()
    }

    fn workbook_name(&self) -> &str {
        self.workbook_name.as_deref().unwrap_or("workbook.xml")
    }

    fn shared_strings_name(&self) -> &str {
        self.shared_strings_name.as_deref().unwrap_or("sharedStrings.xml")
    }

    /// Write the package to a file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let bytes = self.build()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Build the package bytes
    pub fn build(&self) -> XlsxResult<Vec<u8>> {
        let mut shared_strings = Vec::new();
        let sheet_parts: Vec<Option<String>> = self
            .sheets
            .iter()
            .map(|sheet| match sheet {
                FixtureSheet::Rows {
                    rows, dimension, ..
                } => Some(sheet_xml(
                    dimension.as_deref(),
                    &rows_xml(rows, &mut shared_strings),
                )),
                FixtureSheet::Xml { sheet_data, .. } => Some(sheet_xml(None, sheet_data)),
                FixtureSheet::Chart { .. } => None,
            })
            .collect();

        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("[Content_Types].xml", options)?;
            zip.write_all(self.content_types(&sheet_parts).as_bytes())?;

            zip.start_file("_rels/.rels", options)?;
            zip.write_all(self.root_rels().as_bytes())?;

            zip.start_file(format!("xl/{}", self.workbook_name()), options)?;
            zip.write_all(self.workbook_xml().as_bytes())?;

            zip.start_file(format!("xl/_rels/{}.rels", self.workbook_name()), options)?;
            zip.write_all(
                self.workbook_rels(&sheet_parts, !shared_strings.is_empty())
                    .as_bytes(),
            )?;

            if !shared_strings.is_empty() {
                zip.start_file(format!("xl/{}", self.shared_strings_name()), options)?;
                zip.write_all(shared_strings_xml(&shared_strings).as_bytes())?;
            }

            if self.has_styles() {
                zip.start_file("xl/styles.xml", options)?;
                zip.write_all(self.styles_xml().as_bytes())?;
            }

            for (i, part) in sheet_parts.iter().enumerate() {
                match part {
                    Some(xml) => {
                        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
                        zip.write_all(xml.as_bytes())?;
                    }
                    None => {
                        zip.start_file(format!("xl/chartsheets/sheet{}.xml", i + 1), options)?;
                        zip.write_all(CHARTSHEET.as_bytes())?;
                    }
                }
            }

            zip.finish()?;
        }

        Ok(buf)
    }

    fn content_types(&self, parts: &[Option<String>]) -> String {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            self.workbook_name()
        );
        for (i, part) in parts.iter().enumerate() {
            let (dir, kind) = match part {
                Some(_) => ("worksheets", "worksheet"),
                None => ("chartsheets", "chartsheet"),
            };
            content.push_str(&format!(
                r#"<Override PartName="/xl/{}/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.{}+xml"/>"#,
                dir,
                i + 1,
                kind
            ));
        }
        content.push_str("</Types>");
        content
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        if self.date1904 {
            xml.push_str(r#"<workbookPr date1904="1"/>"#);
        }
        if let Some(tab) = self.active_tab {
            xml.push_str(&format!(
                r#"<bookViews><workbookView activeTab="{}"/></bookViews>"#,
                tab
            ));
        }
        xml.push_str("<sheets>");
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn root_rels(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/{}"/></Relationships>"#,
            self.workbook_name()
        )
    }

    fn workbook_rels(&self, parts: &[Option<String>], has_shared_strings: bool) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, part) in parts.iter().enumerate() {
            let (dir, kind) = match part {
                Some(_) => ("worksheets", "worksheet"),
                None => ("chartsheets", "chartsheet"),
            };
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}/sheet{}.xml"/>"#,
                i + 1,
                kind,
                dir,
                i + 1
            ));
        }
        let mut next_id = parts.len() + 1;
        if has_shared_strings {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="{}"/>"#,
                next_id,
                self.shared_strings_name()
            ));
            next_id += 1;
        }
        if self.has_styles() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
                next_id
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn styles_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        if !self.num_fmts.is_empty() {
            xml.push_str(&format!(r#"<numFmts count="{}">"#, self.num_fmts.len()));
            for (id, code) in &self.num_fmts {
                xml.push_str(&format!(
                    r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                    id,
                    escape_xml(code)
                ));
            }
            xml.push_str("</numFmts>");
        }
        xml.push_str(&format!(r#"<cellXfs count="{}">"#, self.cell_xfs.len()));
        for id in &self.cell_xfs {
            xml.push_str(&format!(r#"<xf numFmtId="{}" fontId="0" fillId="0" borderId="0" xfId="0"/>"#, id));
        }
        xml.push_str("</cellXfs></styleSheet>");
        xml
    }
}

const CHARTSHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<chartsheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetViews><sheetView workbookViewId="0"/></sheetViews></chartsheet>"#;

fn sheet_xml(dimension: Option<&str>, sheet_data: &str) -> String {
    let dimension = dimension
        .map(|d| format!(r#"<dimension ref="{}"/>"#, d))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}<sheetData>{}</sheetData></worksheet>"#,
        dimension, sheet_data
    )
}

fn rows_xml(rows: &[Vec<FixtureCell>], shared_strings: &mut Vec<String>) -> String {
    let mut xml = String::new();
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = CellAddress::new(r as u32, c as u16).to_a1_string();
            xml.push_str(&cell_xml(&reference, cell, shared_strings));
        }
        xml.push_str("</row>");
    }
    xml
}

fn cell_xml(reference: &str, cell: &FixtureCell, shared_strings: &mut Vec<String>) -> String {
    match cell {
        FixtureCell::Absent => String::new(),
        FixtureCell::Blank => format!(r#"<c r="{}"/>"#, reference),
        FixtureCell::Text(s) => {
            let idx = match shared_strings.iter().position(|x| x == s) {
                Some(idx) => idx,
                None => {
                    shared_strings.push(s.clone());
                    shared_strings.len() - 1
                }
            };
            format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, idx)
        }
        FixtureCell::Inline(s) => format!(
            r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            reference,
            escape_xml(s)
        ),
        FixtureCell::Number(n, None) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n),
        FixtureCell::Number(n, Some(xf)) => {
            format!(r#"<c r="{}" s="{}"><v>{}</v></c>"#, reference, xf, n)
        }
        FixtureCell::Bool(b) => format!(
            r#"<c r="{}" t="b"><v>{}</v></c>"#,
            reference,
            if *b { 1 } else { 0 }
        ),
        FixtureCell::Error(code) => format!(
            r#"<c r="{}" t="e"><v>{}</v></c>"#,
            reference,
            escape_xml(code)
        ),
        FixtureCell::Formula(f, cached) => match cached {
            Some(v) => format!(
                r#"<c r="{}" t="str"><f>{}</f><v>{}</v></c>"#,
                reference,
                escape_xml(f),
                escape_xml(v)
            ),
            None => format!(r#"<c r="{}"><f>{}</f></c>"#, reference, escape_xml(f)),
        },
        FixtureCell::Raw(xml) => xml.replace("{r}", reference),
    }
}

fn shared_strings_xml(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
