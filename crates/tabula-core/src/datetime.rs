//! Excel serial date conversions.
//!
//! Serial day 0 is 1899-12-30 and day 60 is the deliberate compatibility
//! quirk: a 1900-02-29 that never existed. Dates at or after 1900-03-01
//! therefore sit one day later in the serial sequence than plain calendar
//! arithmetic from the epoch would give. Time of day is a fractional day.

use chrono::{Datelike, Days, NaiveDate};

/// Highest supported serial day (9999-12-31).
pub const MAX_SERIAL_DAY: i64 = 2_958_465;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("epoch is a valid date")
}

fn leap_boundary() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 3, 1).expect("boundary is a valid date")
}

/// Convert a calendar date to its serial day number. Dates before
/// 1900-01-01 (serial 1) are unrepresentable except for the epoch itself.
pub fn date_to_serial(date: NaiveDate) -> Option<f64> {
    let days = (date - epoch()).num_days();
    let serial = if date >= leap_boundary() { days } else { days - 1 };
    if (0..=MAX_SERIAL_DAY).contains(&serial) {
        Some(serial as f64)
    } else {
        None
    }
}

/// Convert the integer part of a serial to `(year, month, day)`.
///
/// Serial 60 reports the fictitious `(1900, 2, 29)`; serial 0 reports the
/// day-zero convention `(1900, 1, 0)`.
pub fn serial_to_ymd(serial: f64) -> Option<(i32, u32, u32)> {
    let day = serial.floor() as i64;
    if !(0..=MAX_SERIAL_DAY).contains(&day) {
        return None;
    }
    match day {
        0 => Some((1900, 1, 0)),
        60 => Some((1900, 2, 29)),
        d => {
            let date = serial_day_to_date(d)?;
            Some((date.year(), date.month(), date.day()))
        }
    }
}

/// Convert the integer part of a serial to a real calendar date. The
/// phantom day 60 has no calendar equivalent and maps to `None`; serial 0
/// maps to 1899-12-31.
pub fn serial_day_to_date(day: i64) -> Option<NaiveDate> {
    if !(0..=MAX_SERIAL_DAY).contains(&day) || day == 60 {
        return None;
    }
    let base = epoch();
    if day > 60 {
        base.checked_add_days(Days::new(day as u64))
    } else {
        base.checked_add_days(Days::new((day + 1) as u64))
    }
}

/// Build a serial from possibly-overflowing `year`/`month`/`day` parts,
/// with Excel's rollover semantics: month 13 is January of the next year,
/// day 0 is the last day of the previous month, and so on.
pub fn ymd_to_serial(year: i64, month: i64, day: i64) -> Option<f64> {
    // Years below 1900 are offsets from 1900 in the file format dialect;
    // the engine requires callers to pass the full year.
    let total_months = year * 12 + (month - 1);
    let norm_year = total_months.div_euclid(12);
    let norm_month = total_months.rem_euclid(12) + 1;
    let year32 = i32::try_from(norm_year).ok()?;

    let first = NaiveDate::from_ymd_opt(year32, norm_month as u32, 1)?;
    let date = if day >= 1 {
        first.checked_add_days(Days::new((day - 1) as u64))?
    } else {
        first.checked_sub_days(Days::new((1 - day) as u64))?
    };

    // The phantom 1900-02-29 is addressable only through serial 60
    // directly, so plain construction skips it.
    date_to_serial(date)
}

/// Split a serial into whole days and the time-of-day fraction in `[0, 1)`.
pub fn split_serial(serial: f64) -> (f64, f64) {
    let days = serial.floor();
    (days, serial - days)
}

/// Convert hours/minutes/seconds to a day fraction.
pub fn hms_to_fraction(hours: f64, minutes: f64, seconds: f64) -> f64 {
    (hours * 3600.0 + minutes * 60.0 + seconds) / 86_400.0
}

/// Extract `(hour, minute, second)` from the fractional part of a serial,
/// rounding to the nearest second.
pub fn fraction_to_hms(serial: f64) -> (u32, u32, u32) {
    let frac = serial - serial.floor();
    let total = (frac * 86_400.0).round() as u64 % 86_400;
    (
        (total / 3600) as u32,
        ((total % 3600) / 60) as u32,
        (total % 60) as u32,
    )
}

/// Days in the given month, accounting for leap years (the real calendar;
/// the phantom day is a serial-layer artifact).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}
