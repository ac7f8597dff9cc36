//! Serial-date conversion
//!
//! Spreadsheets store dates as fractional day counts from 1899-12-30 (the
//! 1900 date system with its Lotus leap-year quirk already folded into the
//! epoch). The integer part is days, the fraction is time-of-day.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: f64 = 86_400.0;

fn epoch() -> NaiveDateTime {
    // 1899-12-30 is always a valid date
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .expect("fixed epoch date")
        .and_hms_opt(0, 0, 0)
        .expect("fixed epoch time")
}

/// Convert a timestamp to its spreadsheet serial number
pub fn to_serial(dt: NaiveDateTime) -> f64 {
    let delta = dt - epoch();
    delta.num_days() as f64
        + (delta - Duration::days(delta.num_days())).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Convert a spreadsheet serial number back to a timestamp. Returns `None`
/// for serials outside chrono's representable range.
pub fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor();
    let seconds = ((serial - days) * SECONDS_PER_DAY).round() as i64;
    epoch()
        .checked_add_signed(Duration::days(days as i64))?
        .checked_add_signed(Duration::seconds(seconds))
}
