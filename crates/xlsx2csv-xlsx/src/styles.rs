//! Number format lookup from styles.xml
//!
//! Only the number format of each cell format (`cellXfs/xf`) is kept; fonts,
//! fills and borders have no bearing on a cell's value.

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use xlsx2csv_core::{FormatKind, NumberFormat};

/// Read styles.xml into a table indexed by a cell's `s` attribute
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<FormatKind>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();

    let mut numfmts: HashMap<u32, String> = HashMap::new();
    let mut xf_fmt_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"cellXfs" => {
                    in_cell_xfs = true;
                }
                b"numFmt" => {
                    let mut id = None;
                    let mut code = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.local_name().as_ref() {
                            b"numFmtId" => {
                                id = attr.unescape_value().ok().and_then(|s| s.parse().ok())
                            }
                            b"formatCode" => {
                                code = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(code)) = (id, code) {
                        numfmts.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let num_fmt_id = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.local_name().as_ref() == b"numFmtId")
                        .and_then(|a| a.unescape_value().ok().and_then(|s| s.parse().ok()))
                        .unwrap_or(0);
                    xf_fmt_ids.push(num_fmt_id);
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"cellXfs" => {
                in_cell_xfs = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let kinds = xf_fmt_ids
        .into_iter()
        .map(|id| NumberFormat::from_id_with_custom(id, numfmts.get(&id).map(String::as_str)).kind())
        .collect();

    Ok(kinds)
}
