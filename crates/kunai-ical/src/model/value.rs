//! Typed iCalendar property values.

use std::fmt;

use super::{DateTime, Duration, Time, UtcOffset};

/// An iCalendar DATE value (RFC 5545 §3.3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    /// Returns this date as a `chrono::NaiveDate`, if valid.
    #[must_use]
    pub fn naive(self) -> Option<chrono::NaiveDate> {
        chrono::NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// A parsed property value.
///
/// Only the value kinds the event engine interprets are typed; everything
/// else is carried as `Unknown` with the raw text preserved, so that
/// serialization never loses information the parser did not understand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i32),
    Date(Date),
    DateTime(DateTime),
    DateList(Vec<Date>),
    DateTimeList(Vec<DateTime>),
    Duration(Duration),
    Time(Time),
    UtcOffset(UtcOffset),
    Uri(String),
    /// Raw pass-through for value kinds the engine does not model
    /// (RECUR, PERIOD, BINARY, X-values, and anything that failed to parse).
    Unknown(String),
}

impl Value {
    /// Returns the text content if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the date content if this is a date value.
    #[must_use]
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the date-time content if this is a date-time value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns the duration content if this is a duration value.
    #[must_use]
    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Self::Duration(d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_display() {
        let d = Date {
            year: 2026,
            month: 3,
            day: 1,
        };
        assert_eq!(d.to_string(), "20260301");
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::Text("hi".into()).as_text(), Some("hi"));
        assert_eq!(Value::Integer(3).as_integer(), Some(3));
        assert_eq!(Value::Text("hi".into()).as_integer(), None);
    }
}
