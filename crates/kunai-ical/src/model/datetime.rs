//! iCalendar DATE-TIME, TIME, and UTC-OFFSET values (RFC 5545 §3.3).

use std::fmt;

/// The three RFC 5545 date-time forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateTimeForm {
    /// UTC time, serialized with a trailing `Z`.
    Utc,
    /// Local time with no zone reference.
    Floating,
    /// Local time qualified by a `TZID` parameter.
    Zoned { tzid: String },
}

/// A broken-down iCalendar DATE-TIME.
///
/// Field values are kept exactly as parsed; conversion to a concrete
/// instant happens in the `expand` module, which knows about timezones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub form: DateTimeForm,
}

impl DateTime {
    /// Creates a UTC date-time.
    #[must_use]
    pub const fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Utc,
        }
    }

    /// Creates a floating (zone-less) date-time.
    #[must_use]
    pub const fn floating(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Floating,
        }
    }

    /// Creates a date-time qualified by a TZID.
    #[must_use]
    pub fn zoned(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        tzid: impl Into<String>,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Zoned { tzid: tzid.into() },
        }
    }

    /// Returns whether this date-time is in UTC form.
    #[must_use]
    pub fn is_utc(&self) -> bool {
        self.form == DateTimeForm::Utc
    }

    /// Returns whether this date-time is floating.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        self.form == DateTimeForm::Floating
    }

    /// Returns the TZID if this date-time is zoned.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.form {
            DateTimeForm::Zoned { tzid } => Some(tzid),
            DateTimeForm::Utc | DateTimeForm::Floating => None,
        }
    }

    /// Returns the wall-clock part as a `chrono::NaiveDateTime`, if the
    /// field values name a real calendar instant.
    #[must_use]
    pub fn naive(&self) -> Option<chrono::NaiveDateTime> {
        let date = chrono::NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?;
        let time = chrono::NaiveTime::from_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )?;
        Some(chrono::NaiveDateTime::new(date, time))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}T{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// An iCalendar TIME value (RFC 5545 §3.3.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub is_utc: bool,
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:02}", self.hour, self.minute, self.second)?;
        if self.is_utc {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// A UTC-OFFSET value (RFC 5545 §3.3.14), stored as signed seconds east of UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    /// Creates an offset from signed seconds east of UTC.
    #[must_use]
    pub const fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    /// Returns the total signed seconds east of UTC.
    #[must_use]
    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }

    /// Returns the signed whole-hour part.
    #[must_use]
    pub const fn hours(self) -> i32 {
        self.seconds / 3600
    }

    /// Returns the minute part (non-negative).
    #[must_use]
    pub const fn minutes(self) -> i32 {
        (self.seconds.abs() % 3600) / 60
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0 { '-' } else { '+' };
        let abs = self.seconds.abs();
        let hours = abs / 3600;
        let minutes = (abs % 3600) / 60;
        let seconds = abs % 60;
        write!(f, "{sign}{hours:02}{minutes:02}")?;
        if seconds != 0 {
            write!(f, "{seconds:02}")?;
        }
        Ok(())
    }
}
