//! Structured event and alarm records.
//!
//! A `StructuredEvent` is the canonical in-memory form of one calendar
//! event. It is born from decoding remote bytes or from a create request,
//! mutated only by the patch engine and alarm reconciler (which always
//! produce a new value), and dies when encoded back to bytes.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use kunai_ical::model::Property;

/// A start or end time: either a calendar date (all-day) or a concrete
/// instant. The distinction is a first-class invariant and never changes
/// silently during a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// All-day: a calendar date with no time component.
    Date(NaiveDate),
    /// Timed: an offset-qualified instant, with the originating TZID kept
    /// so re-encoding can emit the zoned form the store sent.
    Instant {
        at: DateTime<FixedOffset>,
        tzid: Option<String>,
    },
}

impl EventTime {
    /// Returns whether this is an all-day (date-only) value.
    #[must_use]
    pub const fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns this time as a UTC instant for windowing and sorting.
    /// Calendar dates anchor at midnight UTC.
    #[must_use]
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(DateTime::from_naive_utc_and_offset(
                date.and_hms_opt(0, 0, 0)?,
                Utc,
            )),
            Self::Instant { at, .. } => Some(at.with_timezone(&Utc)),
        }
    }
}

/// Alarm action kind. DISPLAY is the only interpreted action; anything
/// else passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmAction {
    Display,
    Other(String),
}

impl AlarmAction {
    /// Parses an ACTION property value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("DISPLAY") {
            Self::Display
        } else {
            Self::Other(s.to_string())
        }
    }

    /// Returns the on-wire ACTION value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Display => "DISPLAY",
            Self::Other(s) => s,
        }
    }
}

impl Default for AlarmAction {
    fn default() -> Self {
        Self::Display
    }
}

/// Which event anchor an alarm trigger is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmRelated {
    #[default]
    Start,
    End,
}

impl AlarmRelated {
    /// Parses a RELATED parameter value; anything but END means START.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("END") {
            Self::End
        } else {
            Self::Start
        }
    }

    /// Returns the on-wire RELATED value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::End => "END",
        }
    }
}

/// An alarm trigger offset.
///
/// Only negative whole-minute durations are interpreted ("N minutes
/// before"); absolute triggers, positive durations, and anything
/// malformed are carried opaquely and report no minutes value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmTrigger {
    MinutesBefore(u32),
    Opaque(String),
}

/// A reminder sub-record attached to an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    /// Stable identifier, assigned once.
    pub uid: String,
    /// Secondary identifier mirrored for iCloud compatibility
    /// (`X-WR-ALARMUID`).
    pub vendor_uid: Option<String>,
    pub action: AlarmAction,
    pub description: Option<String>,
    pub trigger: AlarmTrigger,
    pub related: AlarmRelated,
    /// Properties the engine does not model, preserved verbatim.
    pub extra: Vec<Property>,
}

impl Alarm {
    /// Normalized trigger offset in whole minutes before the anchor, if
    /// the trigger has that shape.
    #[must_use]
    pub fn minutes_before(&self) -> Option<u32> {
        match &self.trigger {
            AlarmTrigger::MinutesBefore(minutes) => Some(*minutes),
            AlarmTrigger::Opaque(_) => None,
        }
    }

    /// Returns whether `id` matches this alarm's primary or vendor UID.
    #[must_use]
    pub fn matches_uid(&self, id: &str) -> bool {
        self.uid == id || self.vendor_uid.as_deref() == Some(id)
    }
}

/// The canonical in-memory representation of one calendar event.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredEvent {
    /// Stable identity; set once, never changed by patching.
    pub uid: String,
    /// Creation/last-synthesized instant.
    pub dtstamp: Option<DateTime<Utc>>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Opaque recurrence rule, carried but never interpreted.
    pub rrule: Option<String>,
    /// Revision counter; monotonically non-decreasing across patches.
    pub sequence: u32,
    /// Ordered alarm set, insertion order preserved.
    pub alarms: Vec<Alarm>,
    /// Event properties the engine does not model, preserved verbatim.
    pub extra: Vec<Property>,
}

impl StructuredEvent {
    /// Creates an empty event with a fresh UID and sequence 0.
    #[must_use]
    pub fn with_uid(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            dtstamp: None,
            start: None,
            end: None,
            summary: None,
            description: None,
            location: None,
            rrule: None,
            sequence: 0,
            alarms: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Returns whether the event is all-day, judged from its start.
    #[must_use]
    pub fn is_all_day(&self) -> bool {
        self.start.as_ref().is_some_and(EventTime::is_all_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_time_kind() {
        let date = EventTime::Date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert!(date.is_all_day());

        let instant = EventTime::Instant {
            at: "2026-03-01T00:00:00Z".parse().unwrap(),
            tzid: None,
        };
        assert!(!instant.is_all_day());
    }

    #[test]
    fn event_time_as_utc() {
        let date = EventTime::Date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(
            date.as_utc().unwrap().to_rfc3339(),
            "2026-03-01T00:00:00+00:00"
        );

        let instant = EventTime::Instant {
            at: "2026-03-01T09:00:00+02:00".parse().unwrap(),
            tzid: Some("Europe/Berlin".into()),
        };
        assert_eq!(
            instant.as_utc().unwrap().to_rfc3339(),
            "2026-03-01T07:00:00+00:00"
        );
    }

    #[test]
    fn alarm_uid_matching() {
        let alarm = Alarm {
            uid: "primary".into(),
            vendor_uid: Some("vendor".into()),
            action: AlarmAction::Display,
            description: None,
            trigger: AlarmTrigger::MinutesBefore(10),
            related: AlarmRelated::Start,
            extra: Vec::new(),
        };
        assert!(alarm.matches_uid("primary"));
        assert!(alarm.matches_uid("vendor"));
        assert!(!alarm.matches_uid("other"));
    }

    #[test]
    fn opaque_trigger_reports_no_minutes() {
        let alarm = Alarm {
            uid: "a".into(),
            vendor_uid: None,
            action: AlarmAction::Other("EMAIL".into()),
            description: None,
            trigger: AlarmTrigger::Opaque("19980101T050000Z".into()),
            related: AlarmRelated::Start,
            extra: Vec::new(),
        };
        assert_eq!(alarm.minutes_before(), None);
    }
}
