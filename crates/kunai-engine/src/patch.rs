//! Patch engine: partial event updates that preserve unsupplied fields.

use chrono::Utc;

use crate::alarm::{self, AlarmSpec};
use crate::error::{EngineError, EngineResult};
use crate::event::{EventTime, StructuredEvent};
use crate::time::parse_event_time;

/// A tri-state override for one optional field.
///
/// `Keep` leaves the original value untouched, `Clear` removes it, and
/// `Set` replaces it. An empty string is a legitimate `Set` value, not a
/// clear.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldPatch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T: Clone> FieldPatch<T> {
    /// Resolves this override against the original value.
    #[must_use]
    pub fn resolve(&self, original: Option<&T>) -> Option<T> {
        match self {
            Self::Keep => original.cloned(),
            Self::Clear => None,
            Self::Set(value) => Some(value.clone()),
        }
    }

    /// Returns whether this override changes anything.
    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// The set of overrides one patch may carry.
///
/// Alarms are deliberately absent: alarm mutation belongs to the
/// reconciler and a patch passes the original's alarms through unchanged.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub summary: FieldPatch<String>,
    pub description: FieldPatch<String>,
    pub location: FieldPatch<String>,
    pub rrule: FieldPatch<String>,
}

impl EventPatch {
    /// Returns whether the patch carries no overrides at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.summary.is_keep()
            && self.description.is_keep()
            && self.location.is_keep()
            && self.rrule.is_keep()
    }
}

/// ## Summary
/// Applies a partial patch to an event, producing a new event value.
///
/// Supplied overrides replace; everything else is copied verbatim. The
/// UID never changes. `dtstamp` is preserved when present and synthesized
/// otherwise. The sequence bumps by one for any non-empty patch; an empty
/// patch returns the original unchanged, sequence included.
///
/// ## Errors
/// Fails when the patched start and end disagree on the all-day/timed
/// kind.
#[tracing::instrument(skip_all, fields(uid = %original.uid))]
pub fn apply_patch(original: &StructuredEvent, patch: &EventPatch) -> EngineResult<StructuredEvent> {
    if patch.is_empty() {
        return Ok(original.clone());
    }

    let start = patch.start.clone().or_else(|| original.start.clone());
    let end = patch.end.clone().or_else(|| original.end.clone());

    if let (Some(start), Some(end)) = (&start, &end)
        && start.is_all_day() != end.is_all_day()
    {
        return Err(EngineError::Validation(
            "start and end disagree on all-day vs timed".to_string(),
        ));
    }

    Ok(StructuredEvent {
        uid: original.uid.clone(),
        dtstamp: Some(original.dtstamp.unwrap_or_else(Utc::now)),
        start,
        end,
        summary: patch.summary.resolve(original.summary.as_ref()),
        description: patch.description.resolve(original.description.as_ref()),
        location: patch.location.resolve(original.location.as_ref()),
        rrule: patch.rrule.resolve(original.rrule.as_ref()),
        sequence: original.sequence + 1,
        alarms: original.alarms.clone(),
        extra: original.extra.clone(),
    })
}

/// Fields for creating a fresh event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub summary: String,
    pub start: String,
    pub end: String,
    /// Named timezone applied to offset-less timestamps.
    pub zone: Option<String>,
    pub all_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    pub rrule: Option<String>,
    /// Trigger offsets for DISPLAY alarms attached at creation.
    pub alarm_minutes_before: Vec<u32>,
}

/// ## Summary
/// Builds a new structured event from a create request.
///
/// The event gets a fresh UID, `dtstamp` of now, sequence 1, and one
/// DISPLAY alarm per requested trigger offset.
///
/// ## Errors
/// For an all-day event both bounds must be exactly `YYYY-MM-DD`; for a
/// timed event both must parse as instants. Anything else is rejected.
#[tracing::instrument(skip_all, fields(summary = %fields.summary))]
pub fn create_event(fields: &NewEvent) -> EngineResult<StructuredEvent> {
    let start = parse_event_time(&fields.start, fields.zone.as_deref())?;
    let end = parse_event_time(&fields.end, fields.zone.as_deref())?;

    for (label, time) in [("start", &start), ("end", &end)] {
        if fields.all_day && !time.is_all_day() {
            return Err(EngineError::Validation(format!(
                "all-day event {label} must be a YYYY-MM-DD date"
            )));
        }
        if !fields.all_day && time.is_all_day() {
            return Err(EngineError::Validation(format!(
                "timed event {label} must be a full timestamp"
            )));
        }
    }

    let mut event = StructuredEvent::with_uid(kunai_core::constants::new_event_uid());
    event.dtstamp = Some(Utc::now());
    event.start = Some(start);
    event.end = Some(end);
    event.summary = Some(fields.summary.clone());
    event.description = fields.description.clone();
    event.location = fields.location.clone();
    event.rrule = fields.rrule.clone();
    event.sequence = 1;
    for minutes in &fields.alarm_minutes_before {
        event
            .alarms
            .push(alarm::build_alarm(&AlarmSpec::display(*minutes)));
    }
    Ok(event)
}
