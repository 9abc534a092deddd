//! Serial date conversion
//!
//! Spreadsheets store dates as a number of days since an epoch, with the
//! time of day as the fractional part. The cell's number format is the only
//! thing marking such a number as a date.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::CellValue;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Date system recorded in the workbook properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01 (default)
    #[default]
    Excel1900,
    /// Serial 0 is 1904-01-01 (`date1904="1"`)
    Excel1904,
}

impl DateSystem {
    /// Date that serial zero maps to
    ///
    /// The 1900 epoch is 1899-12-30 rather than 12-31 because the 1900
    /// system counts a non-existent 1900-02-29.
    pub fn epoch(self) -> NaiveDate {
        match self {
            DateSystem::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30),
            DateSystem::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1),
        }
        .unwrap_or(NaiveDate::MIN)
    }
}

/// Convert a date-formatted serial number into a temporal cell value.
///
/// Serials in `[0, 1)` carry no calendar date and become [`CellValue::Time`].
/// Serials the calendar cannot represent stay [`CellValue::Number`].
pub fn from_serial(serial: f64, system: DateSystem) -> CellValue {
    if !serial.is_finite() {
        return CellValue::Number(serial);
    }

    let mut day = serial.floor();
    let millis = ((serial - day) * MILLIS_PER_DAY).round() as i64;
    let fraction = Duration::milliseconds(millis);

    if (0.0..1.0).contains(&serial) {
        // Rounding must not carry a time of day over into the next date
        let millis = millis.min(MILLIS_PER_DAY as i64 - 1);
        return CellValue::Time(
            NaiveTime::MIN
                .overflowing_add_signed(Duration::milliseconds(millis))
                .0,
        );
    }

    // Serials before the fictitious 1900-02-29 are one day behind
    if system == DateSystem::Excel1900 && serial > 0.0 && serial < 60.0 {
        day += 1.0;
    }

    to_datetime(system, day, fraction)
        .map(CellValue::DateTime)
        .unwrap_or(CellValue::Number(serial))
}

fn to_datetime(system: DateSystem, day: f64, fraction: Duration) -> Option<NaiveDateTime> {
    if day.abs() > 3_000_000.0 {
        return None;
    }
    let midnight = system.epoch().and_time(NaiveTime::MIN);
    midnight
        .checked_add_signed(Duration::try_days(day as i64)?)?
        .checked_add_signed(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> CellValue {
        CellValue::DateTime(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap(),
        )
    }

    #[test]
    fn test_modern_dates() {
        assert_eq!(
            from_serial(45306.0, DateSystem::Excel1900),
            datetime(2024, 1, 15, 0, 0, 0)
        );
        assert_eq!(
            from_serial(45306.5, DateSystem::Excel1900),
            datetime(2024, 1, 15, 12, 0, 0)
        );
    }

    #[test]
    fn test_leap_year_bug_window() {
        assert_eq!(
            from_serial(1.0, DateSystem::Excel1900),
            datetime(1900, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            from_serial(59.0, DateSystem::Excel1900),
            datetime(1900, 2, 28, 0, 0, 0)
        );
        assert_eq!(
            from_serial(61.0, DateSystem::Excel1900),
            datetime(1900, 3, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_1904_system() {
        assert_eq!(
            from_serial(1.0, DateSystem::Excel1904),
            datetime(1904, 1, 2, 0, 0, 0)
        );
    }

    #[test]
    fn test_time_only() {
        assert_eq!(
            from_serial(0.75, DateSystem::Excel1900),
            CellValue::Time(NaiveTime::from_hms_opt(18, 0, 0).unwrap())
        );
        assert_eq!(
            from_serial(0.0, DateSystem::Excel1900),
            CellValue::Time(NaiveTime::MIN)
        );
    }

    #[test]
    fn test_time_just_below_one_day_stays_time() {
        let value = from_serial(0.9999999999, DateSystem::Excel1900);
        assert_eq!(
            value,
            CellValue::Time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap())
        );
        assert_eq!(value.to_text(), "23:59:59.999000");
    }

    #[test]
    fn test_millisecond_rounding() {
        // 1 second minus a hair rounds up to a whole second
        let serial = 45306.0 + (1.0 - 1e-9) / 86_400.0;
        assert_eq!(
            from_serial(serial, DateSystem::Excel1900),
            datetime(2024, 1, 15, 0, 0, 1)
        );
    }

    #[test]
    fn test_unrepresentable_serial_stays_number() {
        assert_eq!(
            from_serial(1e12, DateSystem::Excel1900),
            CellValue::Number(1e12)
        );
        assert!(matches!(
            from_serial(f64::NAN, DateSystem::Excel1900),
            CellValue::Number(n) if n.is_nan()
        ));
    }
}
