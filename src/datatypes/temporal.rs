//! Date, time, and datetime recognition.
//!
//! ISO-8601 text is tried first. Other text is reduced to a structural pattern (every digit
//! replaced by `N`) and matched against the recognized layouts:
//!
//! | layout | example |
//! |---|---|
//! | year first, separator `-` `.` `/` or space | `2003-09-25`, `2003/9/25` |
//! | day first, same separators | `25.09.2003`, `25/09/2003` |
//! | compact date | `20030925` |
//! | compact datetime (10, 12 or 14 digits) | `2003092510`, `20030925104941` |
//! | time | `10:49`, `10:49:41`, `10:49:41,5` |
//! | datetime | date layout, then `T` or space, then time layout |
//!
//! Day-first and year-first are told apart only by which group has four digits, so layouts with
//! a two-digit year are rejected. Month and weekday names are not recognized.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::types::Value;

const DATE_SEPARATORS: [char; 4] = ['-', '.', '/', ' '];
const FRACTION_MARKS: [char; 2] = ['.', ','];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOrder {
    YearFirst,
    DayFirst,
}

pub(crate) fn infer_date(value: &Value) -> Result<Value, String> {
    match value {
        Value::Date(_) => Ok(value.clone()),
        Value::Str(s) => parse_date(s.trim()).map(Value::Date),
        _ => Err("not a date".to_string()),
    }
}

pub(crate) fn infer_time(value: &Value) -> Result<Value, String> {
    match value {
        Value::Time(_) => Ok(value.clone()),
        Value::Str(s) => parse_time(s.trim()).map(Value::Time),
        _ => Err("not a time".to_string()),
    }
}

pub(crate) fn infer_datetime(value: &Value) -> Result<Value, String> {
    match value {
        Value::DateTime(_) => Ok(value.clone()),
        Value::Str(s) => parse_datetime(s.trim()).map(Value::DateTime),
        _ => Err("not a datetime".to_string()),
    }
}

/// Digits become `N`; everything else is kept.
pub fn pattern_of(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii_digit() { 'N' } else { c }).collect()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// ISO-8601 parsing accepts short years, so only text starting with `NNNN-` takes that route.
fn iso_shaped(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 5 && b[..4].iter().all(u8::is_ascii_digit) && b[4] == b'-'
}

fn truncate_to_micros<T: Timelike + Copy>(t: T) -> T {
    let nanos = t.nanosecond();
    t.with_nanosecond(nanos - nanos % 1_000).unwrap_or(t)
}

fn num(s: &str) -> Result<u32, String> {
    s.parse::<u32>().map_err(|e| e.to_string())
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if iso_shaped(s) {
        if let Ok(d) = s.parse::<NaiveDate>() {
            return Ok(d);
        }
    }

    let pattern = pattern_of(s);
    if all_digits(s) {
        if s.len() != 8 {
            return Err(format!("unrecognized date pattern '{pattern}'"));
        }
        return ymd(&s[..4], &s[4..6], &s[6..8]);
    }

    let sep = pattern
        .chars()
        .find(|c| *c != 'N')
        .filter(|c| DATE_SEPARATORS.contains(c))
        .ok_or_else(|| format!("unrecognized date pattern '{pattern}'"))?;

    let groups: Vec<&str> = s.split(sep).collect();
    if groups.len() != 3 || !groups.iter().all(|g| all_digits(g)) {
        return Err(format!("unrecognized date pattern '{pattern}'"));
    }

    let short = |g: &str| g.len() <= 2;
    let order = if groups[0].len() == 4 && short(groups[1]) && short(groups[2]) {
        FieldOrder::YearFirst
    } else if groups[2].len() == 4 && short(groups[0]) && short(groups[1]) {
        FieldOrder::DayFirst
    } else {
        return Err(format!("ambiguous or unrecognized date pattern '{pattern}'"));
    };

    match order {
        FieldOrder::YearFirst => ymd(groups[0], groups[1], groups[2]),
        FieldOrder::DayFirst => ymd(groups[2], groups[1], groups[0]),
    }
}

fn ymd(y: &str, m: &str, d: &str) -> Result<NaiveDate, String> {
    let year = y.parse::<i32>().map_err(|e| e.to_string())?;
    NaiveDate::from_ymd_opt(year, num(m)?, num(d)?).ok_or_else(|| format!("invalid calendar date {y}-{m}-{d}"))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    if let Ok(t) = s.parse::<NaiveTime>() {
        return Ok(truncate_to_micros(t));
    }

    let (hms, fraction) = match s.split_once(FRACTION_MARKS) {
        Some((hms, frac)) => (hms, Some(frac)),
        None => (s, None),
    };

    let groups: Vec<&str> = hms.split(':').collect();
    if !(2..=3).contains(&groups.len()) || !groups.iter().all(|g| all_digits(g) && g.len() <= 2) {
        return Err(format!("unrecognized time pattern '{}'", pattern_of(s)));
    }
    if fraction.is_some() && groups.len() != 3 {
        return Err("fractional seconds require a seconds field".to_string());
    }

    let hour = num(groups[0])?;
    let minute = num(groups[1])?;
    let second = groups.get(2).map(|g| num(g)).transpose()?.unwrap_or(0);
    let micro = fraction.map(microseconds).transpose()?.unwrap_or(0);

    NaiveTime::from_hms_micro_opt(hour, minute, second, micro).ok_or_else(|| format!("invalid time '{s}'"))
}

/// Right-pad or truncate fractional-second digits to microsecond precision.
fn microseconds(frac: &str) -> Result<u32, String> {
    if !all_digits(frac) {
        return Err(format!("invalid fractional seconds '{frac}'"));
    }
    let mut digits: String = frac.chars().take(6).collect();
    while digits.len() < 6 {
        digits.push('0');
    }
    num(&digits)
}

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    if iso_shaped(s) {
        if let Ok(dt) = s.parse::<NaiveDateTime>() {
            return Ok(truncate_to_micros(dt));
        }
    }

    let (head, fraction) = match s.split_once(FRACTION_MARKS) {
        Some((head, frac)) if all_digits(head) && all_digits(frac) => (head, Some(frac)),
        _ => (s, None),
    };
    if all_digits(head) {
        return compact_datetime(head, fraction);
    }

    let (date_part, time_part) = match s.split_once('T') {
        Some(parts) => parts,
        None => s
            .rsplit_once(' ')
            .filter(|(_, time)| time.contains(':'))
            .ok_or_else(|| format!("no time component in '{}'", pattern_of(s)))?,
    };

    let date = parse_date(date_part.trim())?;
    let time = parse_time(time_part.trim())?;
    Ok(date.and_time(time))
}

fn compact_datetime(digits: &str, fraction: Option<&str>) -> Result<NaiveDateTime, String> {
    let field = |range: std::ops::Range<usize>| num(&digits[range]);
    let (hour, minute, second) = match digits.len() {
        10 => (field(8..10)?, 0, 0),
        12 => (field(8..10)?, field(10..12)?, 0),
        14 => (field(8..10)?, field(10..12)?, field(12..14)?),
        _ => return Err(format!("unrecognized compact datetime of {} digits", digits.len())),
    };
    if fraction.is_some() && digits.len() != 14 {
        return Err("fractional seconds require a seconds field".to_string());
    }
    let micro = fraction.map(microseconds).transpose()?.unwrap_or(0);

    let date = ymd(&digits[..4], &digits[4..6], &digits[6..8])?;
    let time = NaiveTime::from_hms_micro_opt(hour, minute, second, micro)
        .ok_or_else(|| format!("invalid time in '{digits}'"))?;
    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{parse_date, parse_datetime, parse_time, pattern_of};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn pattern_replaces_digits() {
        assert_eq!(pattern_of("25/09/2003"), "NN/NN/NNNN");
    }

    #[test]
    fn dates_in_every_recognized_layout() {
        let expected = d(2003, 9, 25);
        for text in [
            "2003-09-25",
            "2003-9-25",
            "2003.09.25",
            "2003/09/25",
            "2003 09 25",
            "25-09-2003",
            "25.09.2003",
            "25/09/2003",
            "25 9 2003",
            "20030925",
        ] {
            assert_eq!(parse_date(text).unwrap(), expected, "{text}");
        }
    }

    #[test]
    fn two_digit_years_are_ambiguous() {
        assert!(parse_date("25/09/03").is_err());
        assert!(parse_date("03-09-25").is_err());
    }

    #[test]
    fn invalid_dates_and_names_fail() {
        assert!(parse_date("2003-13-01").is_err());
        assert!(parse_date("2003-02-30").is_err());
        assert!(parse_date("25 Sep 2003").is_err());
        assert!(parse_date("2003-09/25").is_err());
        assert!(parse_date("12345").is_err());
    }

    #[test]
    fn times_with_fractional_seconds() {
        assert_eq!(parse_time("10:49").unwrap(), NaiveTime::from_hms_opt(10, 49, 0).unwrap());
        assert_eq!(parse_time("10:49:41").unwrap(), NaiveTime::from_hms_opt(10, 49, 41).unwrap());
        assert_eq!(
            parse_time("10:49:41,5").unwrap(),
            NaiveTime::from_hms_micro_opt(10, 49, 41, 500_000).unwrap()
        );
        assert_eq!(
            parse_time("10:49:41.12345678").unwrap(),
            NaiveTime::from_hms_micro_opt(10, 49, 41, 123_456).unwrap()
        );
        assert!(parse_time("1049").is_err());
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("10:49,5").is_err());
    }

    #[test]
    fn datetimes_with_t_or_space_separator() {
        let expected = d(2003, 9, 25).and_hms_opt(10, 49, 41).unwrap();
        for text in [
            "2003-09-25T10:49:41",
            "2003-09-25 10:49:41",
            "25/09/2003 10:49:41",
            "25 09 2003 10:49:41",
            "2003.09.25T10:49:41",
            "20030925104941",
        ] {
            assert_eq!(parse_datetime(text).unwrap(), expected, "{text}");
        }
        assert_eq!(
            parse_datetime("2003-09-25T10:49:41,25").unwrap(),
            d(2003, 9, 25).and_hms_micro_opt(10, 49, 41, 250_000).unwrap()
        );
    }

    #[test]
    fn compact_datetimes() {
        assert_eq!(
            parse_datetime("2003092510").unwrap(),
            d(2003, 9, 25).and_hms_opt(10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("200309251049").unwrap(),
            d(2003, 9, 25).and_hms_opt(10, 49, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("20030925104941.5").unwrap(),
            d(2003, 9, 25).and_hms_micro_opt(10, 49, 41, 500_000).unwrap()
        );
    }

    #[test]
    fn datetime_requires_time_component() {
        assert!(parse_datetime("2003-09-25").is_err());
        assert!(parse_datetime("20030925").is_err());
        assert!(parse_datetime("2003-09-25T10:49:41+02:00").is_err());
    }
}
