//! Cell value types

use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Represents the computed value stored in a cell
///
/// Formula cells never appear here: the reader resolves them to their last
/// cached result, so every variant is already a plain value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// String value
    Text(String),

    /// Numeric value
    Number(f64),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Date-formatted number with a calendar date
    DateTime(NaiveDateTime),

    /// Date-formatted number below one day
    Time(NaiveTime),

    /// Elapsed-time formatted number, in days
    Duration(f64),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(String),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Render the value as CSV field text.
    ///
    /// Every variant has a rendering, so this never fails:
    ///
    /// - `Empty` is the empty string
    /// - integral numbers below 1e15 print without a fractional part (`30`),
    ///   other numbers use the shortest round-trip decimal (`3.5`)
    /// - booleans print as `TRUE` / `FALSE`
    /// - dates print as `YYYY-MM-DD HH:MM:SS`, times as `HH:MM:SS`; a
    ///   non-zero sub-second part is appended as `.ffffff`
    /// - durations print as `H:MM:SS` with total hours
    ///
    /// Python's `csv` module writes the same cells differently: booleans
    /// as `True` / `False` and durations as `1 day, 2:00:00`. Output
    /// compared against such a tool differs in exactly those fields.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => {
                let mut text = dt.format("%Y-%m-%d %H:%M:%S").to_string();
                push_micros(&mut text, dt.nanosecond());
                text
            }
            CellValue::Time(t) => {
                let mut text = t.format("%H:%M:%S").to_string();
                push_micros(&mut text, t.nanosecond());
                text
            }
            CellValue::Duration(days) => format_duration(*days),
            CellValue::Error(code) => code.clone(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn push_micros(text: &mut String, nanos: u32) {
    // Leap-second nanos (>= 1e9) never come out of serial conversion
    let micros = (nanos % 1_000_000_000) / 1_000;
    if micros != 0 {
        text.push_str(&format!(".{:06}", micros));
    }
}

fn format_duration(days: f64) -> String {
    let total = (days * 86_400.0).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// Conversions from Rust types

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(CellValue::Empty, Into::into)
    }
}
