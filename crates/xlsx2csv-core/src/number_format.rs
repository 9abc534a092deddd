//! Number format types

/// What a number format does to the number it displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatKind {
    /// Plain number (general, decimal, percent, ...)
    #[default]
    Plain,
    /// Calendar date and/or time of day
    Date,
    /// Elapsed time (`[h]:mm:ss` and friends)
    Duration,
}

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 46 - [h]:mm:ss
    pub const ID_ELAPSED_HOURS: u32 = 46;

    /// Resolve a `numFmtId` against the custom formats declared in a workbook
    pub fn from_id_with_custom(id: u32, custom: Option<&str>) -> Self {
        match custom {
            Some(code) => NumberFormat::Custom(code.to_string()),
            None if id == 0 => NumberFormat::General,
            None => NumberFormat::BuiltIn(id),
        }
    }

    /// Classify this format
    pub fn kind(&self) -> FormatKind {
        match self {
            NumberFormat::General => FormatKind::Plain,
            NumberFormat::BuiltIn(id) => Self::builtin_kind(*id),
            NumberFormat::Custom(code) => classify_code(code),
        }
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        self.kind() == FormatKind::Date
    }

    fn builtin_kind(id: u32) -> FormatKind {
        match id {
            Self::ID_ELAPSED_HOURS => FormatKind::Duration,
            // 14-22: locale dates and times, 45/47: mm:ss, 27-36 and 50-58: CJK dates
            14..=22 | 27..=36 | 45 | 47 | 50..=58 => FormatKind::Date,
            _ => FormatKind::Plain,
        }
    }
}

/// Classify a custom format code by the tokens left after removing literals.
fn classify_code(code: &str) -> FormatKind {
    // Only the first section (positive numbers) matters
    let section = first_section(code);
    if section.eq_ignore_ascii_case("general") || section == "@" {
        return FormatKind::Plain;
    }

    let mut chars = section.chars();
    let mut has_date_token = false;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                // Escaped character, padding or fill character
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|&b| b != ']').collect();
                let lower = inner.to_ascii_lowercase();
                let is_elapsed = !lower.is_empty()
                    && (lower.chars().all(|b| b == 'h')
                        || lower.chars().all(|b| b == 'm')
                        || lower.chars().all(|b| b == 's'));
                if is_elapsed {
                    return FormatKind::Duration;
                }
            }
            'd' | 'D' | 'm' | 'M' | 'y' | 'Y' | 'h' | 'H' | 's' | 'S' => {
                has_date_token = true;
            }
            _ => {}
        }
    }

    if has_date_token {
        FormatKind::Date
    } else {
        FormatKind::Plain
    }
}

fn first_section(code: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return &code[..i],
            _ => {}
        }
    }
    code
}
