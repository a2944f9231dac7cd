//! iCalendar DURATION values (RFC 5545 §3.3.6).

use std::fmt;

/// A nominal duration, kept in its broken-down RFC 5545 form.
///
/// Alarm triggers are the main consumer: a reminder "N minutes before"
/// is the negative duration `-PT{N}M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duration {
    pub negative: bool,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Duration {
    /// The zero duration.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            negative: false,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }

    /// A negative duration of whole minutes ("N minutes before").
    #[must_use]
    pub const fn minutes_before(minutes: u32) -> Self {
        Self {
            negative: true,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes,
            seconds: 0,
        }
    }

    /// Total signed seconds represented by this duration.
    #[must_use]
    pub fn total_seconds(&self) -> i64 {
        let magnitude = i64::from(self.weeks) * 7 * 86_400
            + i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        if self.negative { -magnitude } else { magnitude }
    }

    /// Magnitude in whole minutes, if the duration is an exact number of
    /// minutes. Sub-minute remainders yield `None`.
    #[must_use]
    pub fn whole_minutes(&self) -> Option<u32> {
        let abs = self.total_seconds().unsigned_abs();
        if abs % 60 != 0 {
            return None;
        }
        u32::try_from(abs / 60).ok()
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;

        if self.weeks != 0 {
            return write!(f, "{}W", self.weeks);
        }

        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }

        let has_time = self.hours != 0 || self.minutes != 0 || self.seconds != 0;
        if has_time {
            write!(f, "T")?;
            if self.hours != 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes != 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds != 0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.days == 0 {
            // Zero duration still needs a component
            write!(f, "T0S")?;
        }

        Ok(())
    }
}
