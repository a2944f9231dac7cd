//! Parsers for typed iCalendar values (RFC 5545 §3.3).

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::model::{Date, DateTime, Duration, Time, UtcOffset};

/// Parses a DATE value (`YYYYMMDD`).
///
/// ## Errors
/// Returns `InvalidDate` if the value is not eight digits or does not
/// name a real calendar date.
pub fn parse_date(s: &str, line_num: usize) -> ParseResult<Date> {
    let err = || ParseError::new(ParseErrorKind::InvalidDate, line_num, 1).with_context(s);

    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }

    let year: u16 = s[0..4].parse().map_err(|_| err())?;
    let month: u8 = s[4..6].parse().map_err(|_| err())?;
    let day: u8 = s[6..8].parse().map_err(|_| err())?;

    let date = Date { year, month, day };
    if date.naive().is_none() {
        return Err(err());
    }
    Ok(date)
}

/// Parses a TIME value (`HHMMSS` with optional trailing `Z`).
///
/// ## Errors
/// Returns `InvalidTime` if the value is malformed or out of range.
pub fn parse_time(s: &str, line_num: usize) -> ParseResult<Time> {
    let err = || ParseError::new(ParseErrorKind::InvalidTime, line_num, 1).with_context(s);

    let (digits, is_utc) = match s.strip_suffix('Z') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }

    let hour: u8 = digits[0..2].parse().map_err(|_| err())?;
    let minute: u8 = digits[2..4].parse().map_err(|_| err())?;
    let second: u8 = digits[4..6].parse().map_err(|_| err())?;

    // Second 60 is allowed for leap seconds.
    if hour > 23 || minute > 59 || second > 60 {
        return Err(err());
    }

    Ok(Time {
        hour,
        minute,
        second,
        is_utc,
    })
}

/// Parses a DATE-TIME value (`YYYYMMDDTHHMMSS` with optional trailing `Z`).
///
/// A `tzid` from the property's `TZID` parameter yields the zoned form;
/// a trailing `Z` yields UTC; neither yields a floating date-time. A `Z`
/// together with a TZID is contradictory and the `Z` wins, matching how
/// most producers behave.
///
/// ## Errors
/// Returns `InvalidDateTime` if the value is malformed.
pub fn parse_datetime(s: &str, tzid: Option<&str>, line_num: usize) -> ParseResult<DateTime> {
    let err = || ParseError::new(ParseErrorKind::InvalidDateTime, line_num, 1).with_context(s);

    let (date_part, rest) = s.split_once('T').ok_or_else(err)?;
    let date = parse_date(date_part, line_num).map_err(|_| err())?;
    let time = parse_time(rest, line_num).map_err(|_| err())?;

    let form_tzid = if time.is_utc { None } else { tzid };
    let dt = match form_tzid {
        Some(tzid) => DateTime::zoned(
            date.year, date.month, date.day, time.hour, time.minute, time.second, tzid,
        ),
        None if time.is_utc => DateTime::utc(
            date.year, date.month, date.day, time.hour, time.minute, time.second,
        ),
        None => DateTime::floating(
            date.year, date.month, date.day, time.hour, time.minute, time.second,
        ),
    };
    Ok(dt)
}

/// Parses a DURATION value (`[+/-]P[nW | nD][T[nH][nM][nS]]`).
///
/// ## Errors
/// Returns `InvalidDuration` if the value is malformed.
pub fn parse_duration(s: &str, line_num: usize) -> ParseResult<Duration> {
    let err = || ParseError::new(ParseErrorKind::InvalidDuration, line_num, 1).with_context(s);

    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let rest = rest.strip_prefix('P').ok_or_else(err)?;

    let mut dur = Duration {
        negative,
        ..Duration::zero()
    };

    let mut in_time = false;
    let mut saw_component = false;
    let mut number: Option<u32> = None;

    for c in rest.chars() {
        match c {
            '0'..='9' => {
                let digit = c.to_digit(10).ok_or_else(err)?;
                let n = number.unwrap_or(0);
                number = Some(
                    n.checked_mul(10)
                        .and_then(|n| n.checked_add(digit))
                        .ok_or_else(err)?,
                );
            }
            'T' if !in_time && number.is_none() => in_time = true,
            'W' | 'D' | 'H' | 'M' | 'S' => {
                let n = number.take().ok_or_else(err)?;
                match (c, in_time) {
                    ('W', false) => dur.weeks = n,
                    ('D', false) => dur.days = n,
                    ('H', true) => dur.hours = n,
                    ('M', true) => dur.minutes = n,
                    ('S', true) => dur.seconds = n,
                    _ => return Err(err()),
                }
                saw_component = true;
            }
            _ => return Err(err()),
        }
    }

    // A dangling number or an empty P / PT is malformed.
    if number.is_some() || !saw_component {
        return Err(err());
    }

    Ok(dur)
}

/// Parses a UTC-OFFSET value (`+/-HHMM[SS]`).
///
/// ## Errors
/// Returns `InvalidUtcOffset` if the value is malformed.
pub fn parse_utc_offset(s: &str, line_num: usize) -> ParseResult<UtcOffset> {
    let err = || ParseError::new(ParseErrorKind::InvalidUtcOffset, line_num, 1).with_context(s);

    let (sign, digits) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(err()),
    };

    if !(digits.len() == 4 || digits.len() == 6) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }

    let hours: i32 = digits[0..2].parse().map_err(|_| err())?;
    let minutes: i32 = digits[2..4].parse().map_err(|_| err())?;
    let seconds: i32 = if digits.len() == 6 {
        digits[4..6].parse().map_err(|_| err())?
    } else {
        0
    };

    if minutes > 59 || seconds > 59 {
        return Err(err());
    }

    Ok(UtcOffset::from_seconds(
        sign * (hours * 3600 + minutes * 60 + seconds),
    ))
}

/// Parses an INTEGER value.
///
/// ## Errors
/// Returns `InvalidInteger` if the value is not a valid i32.
pub fn parse_integer(s: &str, line_num: usize) -> ParseResult<i32> {
    s.parse().map_err(|_| {
        ParseError::new(ParseErrorKind::InvalidInteger, line_num, 1).with_context(s)
    })
}

/// Unescapes a TEXT value (RFC 5545 §3.3.11).
///
/// Handles `\\`, `\;`, `\,`, `\n` and `\N`. An unrecognized escape is
/// kept as-is rather than rejected.
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => result.push('\n'),
            Some(escaped @ ('\\' | ';' | ',')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DateTimeForm;

    #[test]
    fn date_valid() {
        let d = parse_date("20260123", 1).unwrap();
        assert_eq!((d.year, d.month, d.day), (2026, 1, 23));
    }

    #[test]
    fn date_rejects_bad_input() {
        assert!(parse_date("2026012", 1).is_err());
        assert!(parse_date("20261301", 1).is_err());
        assert!(parse_date("2026-01-23", 1).is_err());
    }

    #[test]
    fn time_with_and_without_utc() {
        let t = parse_time("093000", 1).unwrap();
        assert!(!t.is_utc);
        let t = parse_time("235960Z", 1).unwrap();
        assert!(t.is_utc);
        assert_eq!(t.second, 60);
    }

    #[test]
    fn time_rejects_out_of_range() {
        assert!(parse_time("250000", 1).is_err());
        assert!(parse_time("12345", 1).is_err());
    }

    #[test]
    fn datetime_utc() {
        let dt = parse_datetime("20260123T120000Z", None, 1).unwrap();
        assert!(dt.is_utc());
        assert_eq!(dt.hour, 12);
    }

    #[test]
    fn datetime_zoned() {
        let dt = parse_datetime("20260123T093000", Some("America/New_York"), 1).unwrap();
        assert_eq!(dt.tzid(), Some("America/New_York"));
    }

    #[test]
    fn datetime_floating() {
        let dt = parse_datetime("20260123T093000", None, 1).unwrap();
        assert!(dt.is_floating());
    }

    #[test]
    fn datetime_z_wins_over_tzid() {
        let dt = parse_datetime("20260123T093000Z", Some("America/New_York"), 1).unwrap();
        assert_eq!(dt.form, DateTimeForm::Utc);
    }

    #[test]
    fn datetime_rejects_date_only() {
        assert!(parse_datetime("20260123", None, 1).is_err());
    }

    #[test]
    fn duration_negative_minutes() {
        let d = parse_duration("-PT15M", 1).unwrap();
        assert!(d.negative);
        assert_eq!(d.minutes, 15);
        assert_eq!(d.total_seconds(), -900);
    }

    #[test]
    fn duration_weeks() {
        let d = parse_duration("P2W", 1).unwrap();
        assert_eq!(d.weeks, 2);
    }

    #[test]
    fn duration_mixed() {
        let d = parse_duration("P1DT2H30M", 1).unwrap();
        assert_eq!((d.days, d.hours, d.minutes), (1, 2, 30));
    }

    #[test]
    fn duration_rejects_malformed() {
        assert!(parse_duration("P", 1).is_err());
        assert!(parse_duration("PT", 1).is_err());
        assert!(parse_duration("-PT15", 1).is_err());
        assert!(parse_duration("P1H", 1).is_err());
        assert!(parse_duration("15M", 1).is_err());
    }

    #[test]
    fn utc_offset_forms() {
        assert_eq!(parse_utc_offset("+0530", 1).unwrap().as_seconds(), 19800);
        assert_eq!(parse_utc_offset("-0800", 1).unwrap().as_seconds(), -28800);
        assert_eq!(parse_utc_offset("+000030", 1).unwrap().as_seconds(), 30);
        assert!(parse_utc_offset("0500", 1).is_err());
        assert!(parse_utc_offset("+05", 1).is_err());
    }

    #[test]
    fn integer_parses() {
        assert_eq!(parse_integer("5", 1).unwrap(), 5);
        assert_eq!(parse_integer("-3", 1).unwrap(), -3);
        assert!(parse_integer("abc", 1).is_err());
    }

    #[test]
    fn unescape_text_sequences() {
        assert_eq!(unescape_text("a\\nb"), "a\nb");
        assert_eq!(unescape_text("a\\, b\\; c"), "a, b; c");
        assert_eq!(unescape_text("back\\\\slash"), "back\\slash");
        assert_eq!(unescape_text("plain"), "plain");
    }
}
