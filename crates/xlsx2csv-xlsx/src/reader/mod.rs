//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles_xml;
use xlsx2csv_core::cell::datetime;
use xlsx2csv_core::{
    CellAddress, CellValue, DateSystem, FormatKind, SheetEntry, SheetKind, Workbook, Worksheet,
};

/// Extensions of workbook formats that are not Office Open XML packages
const UNSUPPORTED_EXTENSIONS: &[&str] = &["xls", "xlsb", "ods"];

/// Workbook part used when `_rels/.rels` does not name one
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                // Not a valid escape sequence, keep the underscore and move on
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Sheet list and workbook-level properties from workbook.xml
#[derive(Debug, Default)]
struct WorkbookInfo {
    /// (name, relationship id) in tab order
    sheets: Vec<(String, Option<String>)>,
    active_tab: usize,
    date_system: DateSystem,
}

/// A relationship target from workbook.xml.rels
#[derive(Debug)]
struct SheetRel {
    path: String,
    kind: SheetKind,
}

/// Parts the workbook part points at
#[derive(Debug, Default)]
struct WorkbookRels {
    /// Sheet relationships by id
    sheets: HashMap<String, SheetRel>,
    shared_strings: Option<String>,
    styles: Option<String>,
}

/// Per-sheet context needed to turn raw cell text into values
struct CellContext<'a> {
    shared_strings: &'a [String],
    formats: &'a [FormatKind],
    date_system: DateSystem,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    ///
    /// Legacy binary and OpenDocument formats are rejected by extension;
    /// anything else is judged by content, so extension-less files work.
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        if let Some(ext) = extension.as_deref() {
            if UNSUPPORTED_EXTENSIONS.contains(&ext) {
                return Err(XlsxError::UnsupportedFormat(format!(
                    "'.{}' files are not supported, save the workbook as .xlsx",
                    ext
                )));
            }
        }

        debug!("opening workbook {}", path.display());
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from a reader
    ///
    /// Every sheet is listed, but only the active worksheet's cells are
    /// loaded. The archive is dropped before this returns.
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let workbook_part = Self::find_workbook_part(&mut archive)?;
        debug!("workbook part is {}", workbook_part);

        // Read workbook.xml to get sheet info
        let info = Self::read_workbook_xml(&mut archive, &workbook_part)?;

        // Read workbook.xml.rels to get sheet and shared part paths
        let rels = Self::read_workbook_rels(&mut archive, &workbook_part)?;

        let mut workbook = Workbook::empty();
        workbook.set_active_sheet(info.active_tab);
        workbook.set_date_system(info.date_system);

        let mut paths = Vec::with_capacity(info.sheets.len());
        for (name, r_id) in &info.sheets {
            let rel = r_id.as_ref().and_then(|id| rels.sheets.get(id));
            let kind = rel.map_or(SheetKind::Other, |r| r.kind);
            workbook.push_sheet(SheetEntry {
                name: name.clone(),
                kind,
                worksheet: None,
            });
            paths.push(rel.map(|r| r.path.clone()));
        }

        debug!(
            "workbook has {} sheet(s), active tab {}",
            workbook.sheet_count(),
            info.active_tab
        );

        // Only the active worksheet is loaded; a bad active index is
        // reported by `Workbook::active_worksheet`
        let active = info.active_tab;
        let active_path = match (workbook.sheet(active), paths.get(active)) {
            (Some(entry), Some(Some(path))) if entry.kind == SheetKind::Worksheet => {
                Some((entry.name.clone(), path.clone()))
            }
            (Some(entry), _) => {
                warn!("active sheet '{}' is not a loadable worksheet", entry.name);
                None
            }
            _ => None,
        };

        if let Some((name, path)) = active_path {
            let shared_strings_part = rels
                .shared_strings
                .unwrap_or_else(|| resolve_target(&workbook_part, "sharedStrings.xml"));
            let styles_part = rels
                .styles
                .unwrap_or_else(|| resolve_target(&workbook_part, "styles.xml"));

            let shared_strings = Self::read_shared_strings(&mut archive, &shared_strings_part)?;
            let formats = Self::read_styles(&mut archive, &styles_part)?;
            let ctx = CellContext {
                shared_strings: &shared_strings,
                formats: &formats,
                date_system: info.date_system,
            };

            let mut worksheet = Worksheet::new(name);
            Self::read_worksheet(&mut archive, &path, &mut worksheet, &ctx)?;
            debug!(
                "loaded sheet '{}': {} non-empty cell(s), extent {:?}",
                worksheet.name(),
                worksheet.cell_count(),
                worksheet.extent()
            );
            workbook.attach_worksheet(active, worksheet)?;
        }

        Ok(workbook)
    }

    /// Locate the workbook part through the package relationships
    fn find_workbook_part<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<String> {
        let file = match archive.by_name("_rels/.rels") {
            Ok(f) => f,
            Err(_) => return Ok(DEFAULT_WORKBOOK_PART.to_string()),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let is_office_document = attr_value(&e, b"Type")
                        .is_some_and(|t| t.ends_with("/officeDocument"));
                    if is_office_document {
                        if let Some(target) = attr_value(&e, b"Target") {
                            return Ok(resolve_target("", &target));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(DEFAULT_WORKBOOK_PART.to_string())
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name(path) {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        // Text is not trimmed: leading and trailing spaces are content
        let mut xml_reader = Reader::from_reader(BufReader::new(file));

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current_string.push_str(&e.unescape()?);
                }
                Ok(Event::CData(e)) if in_t => {
                    current_string.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        debug!("read {} shared string(s)", strings.len());
        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
    ) -> XlsxResult<Vec<FormatKind>> {
        match archive.by_name(path) {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Read workbook.xml to get sheet names, rIds and workbook properties
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part: &str,
    ) -> XlsxResult<WorkbookInfo> {
        let file = archive
            .by_name(part)
            .map_err(|_| XlsxError::MissingPart(part.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut info = WorkbookInfo::default();
        let mut seen_view = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"sheet" => {
                        let mut name = None;
                        let mut r_id = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.local_name().as_ref() {
                                b"name" => {
                                    name = attr.unescape_value().ok().map(|s| s.to_string());
                                }
                                // r:id
                                b"id" => {
                                    r_id = attr.unescape_value().ok().map(|s| s.to_string());
                                }
                                _ => {}
                            }
                        }

                        match name {
                            Some(name) => info.sheets.push((name, r_id)),
                            None => warn!("skipping <sheet> element without a name"),
                        }
                    }
                    // The first view is the one the application opens with
                    b"workbookView" if !seen_view => {
                        seen_view = true;
                        if let Some(tab) = attr_value(&e, b"activeTab") {
                            info.active_tab = tab.parse().map_err(|_| {
                                XlsxError::Parse(format!("Invalid activeTab: {}", tab))
                            })?;
                        }
                    }
                    b"workbookPr" => {
                        if attr_value(&e, b"date1904").is_some_and(|v| is_truthy(&v)) {
                            info.date_system = DateSystem::Excel1904;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(info)
    }

    /// Read the workbook part's relationships to get sheet and shared part paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        workbook_part: &str,
    ) -> XlsxResult<WorkbookRels> {
        let rels_part = rels_part_for(workbook_part);
        let file = archive
            .by_name(&rels_part)
            .map_err(|_| XlsxError::MissingPart(rels_part.clone()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = WorkbookRels::default();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        let path = resolve_target(workbook_part, &target);
                        if rel_type.ends_with("/sharedStrings") {
                            rels.shared_strings = Some(path);
                        } else if rel_type.ends_with("/styles") {
                            rels.styles = Some(path);
                        } else {
                            let kind = if rel_type.ends_with("/worksheet") {
                                SheetKind::Worksheet
                            } else {
                                SheetKind::Other
                            };
                            rels.sheets.insert(id, SheetRel { path, kind });
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet's cell values from the archive
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        ctx: &CellContext<'_>,
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));

        let mut buf = Vec::new();

        // Position of the next row/cell when `r` attributes are omitted
        let mut next_row: u32 = 0;
        let mut next_col: u16 = 0;

        // Current cell state
        let mut current_addr: Option<CellAddress> = None;
        let mut current_type: Option<String> = None;
        let mut current_format = FormatKind::Plain;
        let mut current_value: Option<String> = None;
        let mut inline_text: Option<String> = None;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"dimension" => Self::read_dimension(&e, worksheet),
                    b"row" => {
                        let row = Self::row_position(&e, next_row)?;
                        next_row = row + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        let addr = Self::cell_position(&e, next_row.saturating_sub(1), next_col)?;
                        next_col = addr.col.saturating_add(1);
                        current_addr = Some(addr);
                        current_type = attr_value(&e, b"t");
                        current_format = Self::cell_format(&e, ctx);
                        current_value = None;
                        inline_text = None;
                    }
                    b"v" if current_addr.is_some() => in_value = true,
                    b"is" if current_addr.is_some() => {
                        in_inline_str = true;
                        inline_text = Some(String::new());
                    }
                    b"rPh" if in_inline_str => in_phonetic = true,
                    b"t" if in_inline_str && !in_phonetic => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"dimension" => Self::read_dimension(&e, worksheet),
                    b"row" => {
                        // Self-closing <row .../> with no cells
                        let row = Self::row_position(&e, next_row)?;
                        next_row = row + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        // Valueless cell element (usually carries only a style)
                        let addr = Self::cell_position(&e, next_row.saturating_sub(1), next_col)?;
                        next_col = addr.col.saturating_add(1);
                        worksheet.set_value_at(addr.row, addr.col, CellValue::Empty)?;
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(addr) = current_addr.take() {
                            let value = Self::cell_value(
                                current_type.as_deref(),
                                current_value.take(),
                                inline_text.take(),
                                current_format,
                                ctx,
                            )?;
                            worksheet.set_value_at(addr.row, addr.col, value)?;
                        }
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"rPh" => in_phonetic = false,
                    b"t" => in_inline_text = false,
                    // Nothing after the cell table carries values
                    b"sheetData" => break,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if in_value {
                        current_value
                            .get_or_insert_with(String::new)
                            .push_str(&e.unescape()?);
                    } else if in_inline_text {
                        inline_text
                            .get_or_insert_with(String::new)
                            .push_str(&e.unescape()?);
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e);
                    if in_value {
                        current_value.get_or_insert_with(String::new).push_str(&text);
                    } else if in_inline_text {
                        inline_text.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn read_dimension(e: &BytesStart<'_>, worksheet: &mut Worksheet) {
        let Some(range) = attr_value(e, b"ref") else {
            return;
        };
        let end = range.rsplit(':').next().unwrap_or(&range);
        match CellAddress::parse(end) {
            Ok(addr) => worksheet.set_declared_end(addr),
            Err(err) => warn!("ignoring dimension '{}': {}", range, err),
        }
    }

    /// 0-based row index of a `<row>` element
    fn row_position(e: &BytesStart<'_>, next_row: u32) -> XlsxResult<u32> {
        match attr_value(e, b"r") {
            Some(r) => r
                .parse::<u32>()
                .ok()
                .filter(|&r| r >= 1)
                .map(|r| r - 1)
                .ok_or_else(|| XlsxError::Parse(format!("Invalid row number: {}", r))),
            None => Ok(next_row),
        }
    }

    /// Address of a `<c>` element, falling back to the running position
    fn cell_position(e: &BytesStart<'_>, row: u32, next_col: u16) -> XlsxResult<CellAddress> {
        match attr_value(e, b"r") {
            Some(r) => CellAddress::parse(&r).map_err(|err| {
                XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, err))
            }),
            None => Ok(CellAddress::new(row, next_col)),
        }
    }

    fn cell_format(e: &BytesStart<'_>, ctx: &CellContext<'_>) -> FormatKind {
        attr_value(e, b"s")
            .and_then(|s| s.parse::<usize>().ok())
            .and_then(|idx| ctx.formats.get(idx).copied())
            .unwrap_or_default()
    }

    /// Turn a cell's raw type, `<v>` text and inline text into a value
    fn cell_value(
        cell_type: Option<&str>,
        value: Option<String>,
        inline_text: Option<String>,
        format: FormatKind,
        ctx: &CellContext<'_>,
    ) -> XlsxResult<CellValue> {
        if cell_type == Some("inlineStr") {
            let text = inline_text.or(value).unwrap_or_default();
            return Ok(CellValue::Text(decode_excel_escapes(&text)));
        }

        // A formula without a cached result has no value yet
        let Some(value) = value else {
            return Ok(CellValue::Empty);
        };

        let cell_value = match cell_type {
            // Shared string
            Some("s") => {
                let idx: usize = value.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                let s = ctx.shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::Text(s.clone())
            }

            // Boolean
            Some("b") => CellValue::Boolean(is_truthy(value.trim())),

            // Error
            Some("e") => CellValue::Error(value),

            // Formula string result - decode Excel escape sequences
            Some("str") => CellValue::Text(decode_excel_escapes(&value)),

            // ISO 8601 date
            Some("d") => parse_iso_date(value.trim()).unwrap_or(CellValue::Text(value)),

            // Number (default type or explicit "n")
            None | Some("n") => match value.trim().parse::<f64>() {
                Ok(n) => match format {
                    FormatKind::Plain => CellValue::Number(n),
                    FormatKind::Date => datetime::from_serial(n, ctx.date_system),
                    FormatKind::Duration => CellValue::Duration(n),
                },
                Err(_) => {
                    warn!("non-numeric value '{}' in a number cell", value);
                    CellValue::Text(value)
                }
            },

            // Unknown type - treat as string
            Some(other) => {
                warn!("unknown cell type '{}', reading value as text", other);
                CellValue::Text(value)
            }
        };

        Ok(cell_value)
    }
}

/// Path of the relationships part belonging to `part`
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, name)) => format!("{}/_rels/{}.rels", dir, name),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship
///
/// Absolute targets start at the package root; relative ones start in the
/// owning part's folder and may climb out of it with `..`.
fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match base_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Get an attribute value by local name
fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()))
}

fn is_truthy(s: &str) -> bool {
    s == "1" || s.eq_ignore_ascii_case("true")
}

/// Parse the value of a `t="d"` cell
fn parse_iso_date(s: &str) -> Option<CellValue> {
    let s = s.trim_end_matches('Z');
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(CellValue::DateTime(dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(CellValue::DateTime(d.and_time(NaiveTime::MIN)));
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .ok()
        .map(CellValue::Time)
}
