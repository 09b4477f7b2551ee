//! Date and time functions over the Excel serial system.
//!
//! Serial day 0 is 1899-12-30; day 60 is the phantom 1900-02-29 and
//! `DATE(1900,3,1)` is 61. Time of day is a fractional day.

use chrono::Datelike;

use crate::datetime::{
    days_in_month, fraction_to_hms, hms_to_fraction, serial_day_to_date, serial_to_ymd,
    ymd_to_serial,
};
use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{def, FunctionDef, NONE, VOLATILE};
use crate::value::CellValue;

pub(super) const DEFS: &[FunctionDef] = &[
    def("DATE", 3, 3, NONE, date),
    def("DATEDIF", 3, 3, NONE, datedif),
    def("DAY", 1, 1, NONE, day),
    def("DAYS", 2, 2, NONE, days),
    def("EDATE", 2, 2, NONE, edate),
    def("EOMONTH", 2, 2, NONE, eomonth),
    def("HOUR", 1, 1, NONE, hour),
    def("ISOWEEKNUM", 1, 1, NONE, isoweeknum),
    def("MINUTE", 1, 1, NONE, minute),
    def("MONTH", 1, 1, NONE, month),
    def("NETWORKDAYS", 2, 3, NONE, networkdays),
    def("NETWORKDAYS.INTL", 2, 4, NONE, networkdays_intl),
    def("NOW", 0, 0, VOLATILE, now),
    def("SECOND", 1, 1, NONE, second),
    def("TIME", 3, 3, NONE, time),
    def("TIMEVALUE", 1, 1, NONE, timevalue),
    def("TODAY", 0, 0, VOLATILE, today),
    def("WEEKDAY", 1, 2, NONE, weekday),
    def("WEEKNUM", 1, 2, NONE, weeknum),
    def("WORKDAY", 2, 3, NONE, workday),
    def("WORKDAY.INTL", 2, 4, NONE, workday_intl),
    def("YEAR", 1, 1, NONE, year),
    def("YEARFRAC", 2, 3, NONE, yearfrac),
];

type R = Result<CellValue, ErrorKind>;

fn serial_arg(ctx: &mut Evaluator, args: &[Expr], i: usize) -> Result<f64, ErrorKind> {
    let n = ctx.num(args, i)?;
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(n)
}

fn date(args: &[Expr], ctx: &mut Evaluator) -> R {
    let mut y = ctx.int(args, 0)?;
    let m = ctx.int(args, 1)?;
    let d = ctx.int(args, 2)?;
    // Two-digit-era years are offsets from 1900, the file-format dialect.
    if (0..=1899).contains(&y) {
        y += 1900;
    }
    ymd_to_serial(y, m, d).map(CellValue::Date).ok_or(ErrorKind::Num)
}

fn time(args: &[Expr], ctx: &mut Evaluator) -> R {
    let h = ctx.num(args, 0)?;
    let m = ctx.num(args, 1)?;
    let s = ctx.num(args, 2)?;
    if h < 0.0 || m < 0.0 || s < 0.0 {
        return Err(ErrorKind::Num);
    }
    let frac = hms_to_fraction(h.trunc(), m.trunc(), s.trunc());
    Ok(CellValue::Date(frac - frac.floor()))
}

fn timevalue(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?;
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (body, pm_shift) = if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end().to_string(), 12.0)
    } else if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end().to_string(), 0.0)
    } else {
        (upper.clone(), -1.0)
    };
    let parts: Vec<&str> = body.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(ErrorKind::Value);
    }
    let mut h: f64 = parts[0].trim().parse().map_err(|_| ErrorKind::Value)?;
    let m: f64 = parts[1].trim().parse().map_err(|_| ErrorKind::Value)?;
    let s: f64 = match parts.get(2) {
        Some(p) => p.trim().parse().map_err(|_| ErrorKind::Value)?,
        None => 0.0,
    };
    if pm_shift >= 0.0 {
        if !(1.0..=12.0).contains(&h) {
            return Err(ErrorKind::Value);
        }
        h = h % 12.0 + pm_shift;
    }
    if h >= 24.0 || m >= 60.0 || s >= 60.0 {
        return Err(ErrorKind::Value);
    }
    Ok(CellValue::Date(hms_to_fraction(h, m, s)))
}

fn now(_args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(ctx.now_serial()))
}

fn today(_args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(ctx.now_serial().floor()))
}

fn year(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    let (y, _, _) = serial_to_ymd(serial).ok_or(ErrorKind::Num)?;
    Ok(CellValue::Number(f64::from(y)))
}

fn month(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    let (_, m, _) = serial_to_ymd(serial).ok_or(ErrorKind::Num)?;
    Ok(CellValue::Number(f64::from(m)))
}

fn day(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    let (_, _, d) = serial_to_ymd(serial).ok_or(ErrorKind::Num)?;
    Ok(CellValue::Number(f64::from(d)))
}

fn hour(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    Ok(CellValue::Number(f64::from(fraction_to_hms(serial).0)))
}

fn minute(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    Ok(CellValue::Number(f64::from(fraction_to_hms(serial).1)))
}

fn second(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    Ok(CellValue::Number(f64::from(fraction_to_hms(serial).2)))
}

fn days(args: &[Expr], ctx: &mut Evaluator) -> R {
    let end = ctx.num(args, 0)?;
    let start = ctx.num(args, 1)?;
    Ok(CellValue::Number(end.trunc() - start.trunc()))
}

/// Day of week straight from the serial: day 1 counts as a Sunday, which
/// carries the 1900 quirk exactly the way the file format expects.
fn weekday_monday0(serial_day: i64) -> i64 {
    (serial_day - 2).rem_euclid(7)
}

fn weekday(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?.floor() as i64;
    let kind = ctx.num_or(args, 1, 1.0)? as i64;
    let monday0 = weekday_monday0(serial);
    let value = match kind {
        1 => (monday0 + 1) % 7 + 1, // Sunday = 1
        2 => monday0 + 1,           // Monday = 1
        3 => monday0,               // Monday = 0
        11..=17 => {
            let start = kind - 11; // 11 starts Monday ... 17 starts Sunday
            (monday0 - start).rem_euclid(7) + 1
        }
        _ => return Err(ErrorKind::Num),
    };
    Ok(CellValue::Number(value as f64))
}

fn weeknum(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?.floor() as i64;
    let kind = ctx.num_or(args, 1, 1.0)? as i64;
    if kind == 21 {
        return isoweeknum(args, ctx);
    }
    // Week-start day in Monday-0 terms.
    let start = match kind {
        1 => 6, // Sunday
        2 => 0, // Monday
        11..=17 => kind - 11,
        _ => return Err(ErrorKind::Num),
    };
    let (y, _, _) = serial_to_ymd(serial as f64).ok_or(ErrorKind::Num)?;
    let jan1 = ymd_to_serial(i64::from(y), 1, 1).ok_or(ErrorKind::Num)? as i64;
    let jan1_offset = (weekday_monday0(jan1) - start).rem_euclid(7);
    let week = (serial - jan1 + jan1_offset) / 7 + 1;
    Ok(CellValue::Number(week as f64))
}

fn isoweeknum(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?.floor() as i64;
    // The phantom day borrows its neighbour's week.
    let day = if serial == 60 { 59 } else { serial };
    let date = serial_day_to_date(day).ok_or(ErrorKind::Num)?;
    Ok(CellValue::Number(f64::from(date.iso_week().week())))
}

fn edate(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    let months = ctx.int(args, 1)?;
    let (y, m, d) = serial_to_ymd(serial).ok_or(ErrorKind::Num)?;
    let total = i64::from(y) * 12 + i64::from(m) - 1 + months;
    let ny = total.div_euclid(12);
    let nm = (total.rem_euclid(12) + 1) as u32;
    let nd = d.min(days_in_month(ny as i32, nm)).max(1);
    ymd_to_serial(ny, i64::from(nm), i64::from(nd))
        .map(CellValue::Date)
        .ok_or(ErrorKind::Num)
}

fn eomonth(args: &[Expr], ctx: &mut Evaluator) -> R {
    let serial = serial_arg(ctx, args, 0)?;
    let months = ctx.int(args, 1)?;
    let (y, m, _) = serial_to_ymd(serial).ok_or(ErrorKind::Num)?;
    let total = i64::from(y) * 12 + i64::from(m) - 1 + months;
    let ny = total.div_euclid(12);
    let nm = (total.rem_euclid(12) + 1) as u32;
    let nd = days_in_month(ny as i32, nm);
    ymd_to_serial(ny, i64::from(nm), i64::from(nd))
        .map(CellValue::Date)
        .ok_or(ErrorKind::Num)
}

fn datedif(args: &[Expr], ctx: &mut Evaluator) -> R {
    let start = serial_arg(ctx, args, 0)?.floor();
    let end = serial_arg(ctx, args, 1)?.floor();
    let unit = ctx.text(args, 2)?.to_ascii_uppercase();
    if start > end {
        return Err(ErrorKind::Num);
    }
    let (sy, sm, sd) = serial_to_ymd(start).ok_or(ErrorKind::Num)?;
    let (ey, em, ed) = serial_to_ymd(end).ok_or(ErrorKind::Num)?;

    let full_months = {
        let mut months = i64::from(ey - sy) * 12 + i64::from(em) - i64::from(sm);
        if ed < sd {
            months -= 1;
        }
        months
    };

    let value = match unit.as_str() {
        "D" => end - start,
        "M" => full_months as f64,
        "Y" => (full_months / 12) as f64,
        "YM" => (full_months % 12) as f64,
        "MD" => {
            // Days ignoring months and years.
            let mut anchor_m = i64::from(em);
            let mut anchor_y = i64::from(ey);
            if ed < sd {
                anchor_m -= 1;
                if anchor_m == 0 {
                    anchor_m = 12;
                    anchor_y -= 1;
                }
            }
            let anchor = ymd_to_serial(anchor_y, anchor_m, i64::from(sd))
                .ok_or(ErrorKind::Num)?;
            end - anchor
        }
        "YD" => {
            // Days ignoring years.
            let mut anchor_y = i64::from(ey);
            if (em, ed) < (sm, sd) {
                anchor_y -= 1;
            }
            let anchor = ymd_to_serial(anchor_y, i64::from(sm), i64::from(sd))
                .ok_or(ErrorKind::Num)?;
            end - anchor
        }
        _ => return Err(ErrorKind::Num),
    };
    Ok(CellValue::Number(value))
}

/// Weekend pattern as a Monday-first mask. Accepts the numeric codes 1-7
/// and 11-17, or a 7-character `0`/`1` string starting Monday.
fn weekend_mask(value: &CellValue) -> Result<[bool; 7], ErrorKind> {
    let mut mask = [false; 7];
    match value {
        CellValue::Text(s) => {
            if s.len() != 7 || !s.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(ErrorKind::Value);
            }
            for (i, b) in s.bytes().enumerate() {
                mask[i] = b == b'1';
            }
        }
        other => {
            let code = crate::value::to_number(other)? as i64;
            match code {
                1 => {
                    mask[5] = true;
                    mask[6] = true;
                }
                2..=7 => {
                    // Code 2 is Sunday/Monday, each next code shifts by one.
                    mask[(code as usize + 4) % 7] = true;
                    mask[(code as usize + 5) % 7] = true;
                }
                11..=17 => {
                    // Single weekend day, 11 = Sunday.
                    mask[(code as usize - 5) % 7] = true;
                }
                _ => return Err(ErrorKind::Num),
            }
        }
    }
    if mask.iter().all(|&b| b) {
        return Err(ErrorKind::Value);
    }
    Ok(mask)
}

fn holidays_set(
    ctx: &mut Evaluator,
    args: &[Expr],
    i: usize,
) -> Result<std::collections::HashSet<i64>, ErrorKind> {
    let mut set = std::collections::HashSet::new();
    if ctx.has_arg(args, i) {
        let m = ctx.matrix(args, i)?;
        for v in &m.values {
            match v {
                CellValue::Number(n) | CellValue::Date(n) => {
                    set.insert(n.floor() as i64);
                }
                CellValue::Error(e) => return Err(*e),
                _ => {}
            }
        }
    }
    Ok(set)
}

fn count_workdays(
    start: i64,
    end: i64,
    weekend: &[bool; 7],
    holidays: &std::collections::HashSet<i64>,
) -> f64 {
    let (lo, hi, sign) = if start <= end {
        (start, end, 1.0)
    } else {
        (end, start, -1.0)
    };
    let mut count = 0i64;
    for day in lo..=hi {
        let dow = weekday_monday0(day) as usize;
        if !weekend[dow] && !holidays.contains(&day) {
            count += 1;
        }
    }
    sign * count as f64
}

fn networkdays(args: &[Expr], ctx: &mut Evaluator) -> R {
    let start = serial_arg(ctx, args, 0)?.floor() as i64;
    let end = serial_arg(ctx, args, 1)?.floor() as i64;
    let holidays = holidays_set(ctx, args, 2)?;
    let weekend = [false, false, false, false, false, true, true];
    Ok(CellValue::Number(count_workdays(
        start, end, &weekend, &holidays,
    )))
}

fn networkdays_intl(args: &[Expr], ctx: &mut Evaluator) -> R {
    let start = serial_arg(ctx, args, 0)?.floor() as i64;
    let end = serial_arg(ctx, args, 1)?.floor() as i64;
    let weekend = if ctx.has_arg(args, 2) {
        let v = ctx.arg(args, 2);
        weekend_mask(&v)?
    } else {
        [false, false, false, false, false, true, true]
    };
    let holidays = holidays_set(ctx, args, 3)?;
    Ok(CellValue::Number(count_workdays(
        start, end, &weekend, &holidays,
    )))
}

fn advance_workdays(
    start: i64,
    days: i64,
    weekend: &[bool; 7],
    holidays: &std::collections::HashSet<i64>,
) -> f64 {
    let mut current = start;
    let step = if days >= 0 { 1 } else { -1 };
    let mut remaining = days.abs();
    while remaining > 0 {
        current += step;
        let dow = weekday_monday0(current) as usize;
        if !weekend[dow] && !holidays.contains(&current) {
            remaining -= 1;
        }
    }
    current as f64
}

fn workday(args: &[Expr], ctx: &mut Evaluator) -> R {
    let start = serial_arg(ctx, args, 0)?.floor() as i64;
    let days = ctx.int(args, 1)?;
    let holidays = holidays_set(ctx, args, 2)?;
    let weekend = [false, false, false, false, false, true, true];
    Ok(CellValue::Date(advance_workdays(
        start, days, &weekend, &holidays,
    )))
}

fn workday_intl(args: &[Expr], ctx: &mut Evaluator) -> R {
    let start = serial_arg(ctx, args, 0)?.floor() as i64;
    let days = ctx.int(args, 1)?;
    let weekend = if ctx.has_arg(args, 2) {
        let v = ctx.arg(args, 2);
        weekend_mask(&v)?
    } else {
        [false, false, false, false, false, true, true]
    };
    let holidays = holidays_set(ctx, args, 3)?;
    Ok(CellValue::Date(advance_workdays(
        start, days, &weekend, &holidays,
    )))
}

fn yearfrac(args: &[Expr], ctx: &mut Evaluator) -> R {
    let start = serial_arg(ctx, args, 0)?.floor();
    let end = serial_arg(ctx, args, 1)?.floor();
    let basis = ctx.num_or(args, 2, 0.0)? as i64;
    let (a, b) = if start <= end { (start, end) } else { (end, start) };
    let (sy, sm, sd) = serial_to_ymd(a).ok_or(ErrorKind::Num)?;
    let (ey, em, ed) = serial_to_ymd(b).ok_or(ErrorKind::Num)?;

    let value = match basis {
        0 => {
            // US (NASD) 30/360.
            let mut sd = sd.min(30);
            let ed = if ed == 31 && sd >= 30 { 30 } else { ed };
            if sd == 31 {
                sd = 30;
            }
            let days = i64::from(ey - sy) * 360
                + (i64::from(em) - i64::from(sm)) * 30
                + (i64::from(ed) - i64::from(sd));
            days as f64 / 360.0
        }
        1 => {
            // Actual/actual: actual days over the average year length of
            // the span.
            let days = b - a;
            let year_span = i64::from(ey) - i64::from(sy) + 1;
            let total: f64 = (sy..=ey)
                .map(|y| {
                    let leap = (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
                    if leap {
                        366.0
                    } else {
                        365.0
                    }
                })
                .sum();
            days / (total / year_span as f64)
        }
        2 => (b - a) / 360.0,
        3 => (b - a) / 365.0,
        4 => {
            // European 30/360: both day-of-month values capped at 30.
            let sd = sd.min(30);
            let ed = ed.min(30);
            let days = i64::from(ey - sy) * 360
                + (i64::from(em) - i64::from(sm)) * 30
                + (i64::from(ed) - i64::from(sd));
            days as f64 / 360.0
        }
        _ => return Err(ErrorKind::Num),
    };
    Ok(CellValue::Number(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::eval::{CellSnapshot, FixedClock};
    use crate::formula::parser::parse_formula;

    fn eval_str(snap: &CellSnapshot, formula: &str) -> CellValue {
        let expr = parse_formula(formula).unwrap();
        Evaluator::new(snap).eval(&expr)
    }

    fn num(snap: &CellSnapshot, formula: &str) -> f64 {
        match eval_str(snap, formula) {
            CellValue::Number(n) | CellValue::Date(n) => n,
            other => panic!("{formula} gave {other:?}"),
        }
    }

    #[test]
    fn test_date_serials() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "DATE(2024,1,1)"), 45292.0);
        assert_eq!(num(&snap, "DATE(1900,1,1)"), 1.0);
        assert_eq!(num(&snap, "DATE(1900,3,1)"), 61.0);
        // Month rollover into the next year.
        assert_eq!(num(&snap, "DATE(2024,13,1)"), 45658.0);
        // Two-digit-era years offset from 1900.
        assert_eq!(num(&snap, "DATE(24,1,1)"), num(&snap, "DATE(1924,1,1)"));
    }

    #[test]
    fn test_ymd_extraction() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "YEAR(45292)"), 2024.0);
        assert_eq!(num(&snap, "MONTH(45292)"), 1.0);
        assert_eq!(num(&snap, "DAY(45292)"), 1.0);
        // The deliberate quirk.
        assert_eq!(num(&snap, "YEAR(60)"), 1900.0);
        assert_eq!(num(&snap, "MONTH(60)"), 2.0);
        assert_eq!(num(&snap, "DAY(60)"), 29.0);
    }

    #[test]
    fn test_time_components() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "TIME(13,45,30)"), (13.0 * 3600.0 + 45.0 * 60.0 + 30.0) / 86400.0);
        assert_eq!(num(&snap, "HOUR(45292.75)"), 18.0);
        assert_eq!(num(&snap, "MINUTE(TIME(1,23,45))"), 23.0);
        assert_eq!(num(&snap, "SECOND(TIME(1,23,45))"), 45.0);
        assert_eq!(num(&snap, "TIMEVALUE(\"6:00 PM\")"), 0.75);
        assert_eq!(num(&snap, "TIMEVALUE(\"18:00\")"), 0.75);
    }

    #[test]
    fn test_now_and_today_use_the_injected_clock() {
        let snap = CellSnapshot::new("Sheet1");
        let expr = parse_formula("NOW()").unwrap();
        let mut ev = Evaluator::new(&snap).with_clock(FixedClock(45292.25));
        assert_eq!(ev.eval(&expr), CellValue::Number(45292.25));

        let expr = parse_formula("TODAY()").unwrap();
        let mut ev = Evaluator::new(&snap).with_clock(FixedClock(45292.25));
        assert_eq!(ev.eval(&expr), CellValue::Number(45292.0));
    }

    #[test]
    fn test_weekday_types() {
        let snap = CellSnapshot::new("Sheet1");
        // Serial 1 counts as a Sunday.
        assert_eq!(num(&snap, "WEEKDAY(1)"), 1.0);
        assert_eq!(num(&snap, "WEEKDAY(2)"), 2.0);
        assert_eq!(num(&snap, "WEEKDAY(2,2)"), 1.0);
        assert_eq!(num(&snap, "WEEKDAY(2,3)"), 0.0);
        // 2024-01-01 is a Monday.
        assert_eq!(num(&snap, "WEEKDAY(45292,2)"), 1.0);
        assert_eq!(num(&snap, "WEEKDAY(45292,11)"), 1.0);
        assert_eq!(num(&snap, "WEEKDAY(45292,17)"), 2.0);
    }

    #[test]
    fn test_weeknum() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "WEEKNUM(DATE(2024,1,1))"), 1.0);
        assert_eq!(num(&snap, "WEEKNUM(DATE(2024,1,7))"), 2.0);
        assert_eq!(num(&snap, "ISOWEEKNUM(DATE(2024,1,1))"), 1.0);
        assert_eq!(num(&snap, "ISOWEEKNUM(DATE(2023,1,1))"), 52.0);
    }

    #[test]
    fn test_edate_eomonth() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "EDATE(DATE(2024,1,31),1)"), num(&snap, "DATE(2024,2,29)"));
        assert_eq!(num(&snap, "EDATE(DATE(2024,3,15),-1)"), num(&snap, "DATE(2024,2,15)"));
        assert_eq!(num(&snap, "EOMONTH(DATE(2024,2,5),0)"), num(&snap, "DATE(2024,2,29)"));
        assert_eq!(num(&snap, "EOMONTH(DATE(2024,1,5),11)"), num(&snap, "DATE(2024,12,31)"));
    }

    #[test]
    fn test_datedif() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "DATEDIF(DATE(2020,1,15),DATE(2024,3,10),\"Y\")"), 4.0);
        assert_eq!(num(&snap, "DATEDIF(DATE(2020,1,15),DATE(2024,3,10),\"M\")"), 49.0);
        assert_eq!(num(&snap, "DATEDIF(DATE(2024,1,1),DATE(2024,3,1),\"D\")"), 60.0);
        assert_eq!(num(&snap, "DATEDIF(DATE(2020,1,15),DATE(2024,3,10),\"YM\")"), 1.0);
        assert_eq!(
            eval_str(&snap, "DATEDIF(DATE(2024,1,2),DATE(2024,1,1),\"D\")"),
            CellValue::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn test_networkdays() {
        let snap = CellSnapshot::new("Sheet1");
        // 2024-01-01 (Mon) .. 2024-01-07 (Sun): five weekdays.
        assert_eq!(num(&snap, "NETWORKDAYS(DATE(2024,1,1),DATE(2024,1,7))"), 5.0);
        // Holiday knocks one out.
        assert_eq!(
            num(&snap, "NETWORKDAYS(DATE(2024,1,1),DATE(2024,1,7),DATE(2024,1,3))"),
            4.0
        );
        // Reversed order counts negative.
        assert_eq!(num(&snap, "NETWORKDAYS(DATE(2024,1,7),DATE(2024,1,1))"), -5.0);
    }

    #[test]
    fn test_networkdays_intl_codes_and_mask() {
        let snap = CellSnapshot::new("Sheet1");
        // Code 2: Sunday/Monday weekend.
        assert_eq!(
            num(&snap, "NETWORKDAYS.INTL(DATE(2024,1,1),DATE(2024,1,7),2)"),
            5.0
        );
        // Code 11: Sunday only.
        assert_eq!(
            num(&snap, "NETWORKDAYS.INTL(DATE(2024,1,1),DATE(2024,1,7),11)"),
            6.0
        );
        // Mask string: only Wednesday off.
        assert_eq!(
            num(
                &snap,
                "NETWORKDAYS.INTL(DATE(2024,1,1),DATE(2024,1,7),\"0010000\")"
            ),
            6.0
        );
        // All-weekend mask is invalid.
        assert_eq!(
            eval_str(
                &snap,
                "NETWORKDAYS.INTL(DATE(2024,1,1),DATE(2024,1,7),\"1111111\")"
            ),
            CellValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_workday() {
        let snap = CellSnapshot::new("Sheet1");
        // Friday + 1 workday = Monday.
        assert_eq!(
            num(&snap, "WORKDAY(DATE(2024,1,5),1)"),
            num(&snap, "DATE(2024,1,8)")
        );
        assert_eq!(
            num(&snap, "WORKDAY(DATE(2024,1,5),-5)"),
            num(&snap, "DATE(2023,12,29)")
        );
        assert_eq!(
            num(&snap, "WORKDAY.INTL(DATE(2024,1,5),1,11)"),
            num(&snap, "DATE(2024,1,6)")
        );
    }

    #[test]
    fn test_yearfrac() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "YEARFRAC(DATE(2024,1,1),DATE(2024,7,1),0)"), 0.5);
        assert_eq!(
            num(&snap, "YEARFRAC(DATE(2024,1,1),DATE(2024,1,31),2)"),
            30.0 / 360.0
        );
        assert_eq!(
            num(&snap, "YEARFRAC(DATE(2023,1,1),DATE(2023,12,31),3)"),
            364.0 / 365.0
        );
        let f = num(&snap, "YEARFRAC(DATE(2024,1,1),DATE(2025,1,1),1)");
        assert!((f - 1.0).abs() < 0.01, "actual/actual close to one year: {f}");
    }

    #[test]
    fn test_days() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "DAYS(DATE(2024,3,1),DATE(2024,1,1))"), 60.0);
    }
}
