//! Alarm reconciler: list/add/replace/remove over an event's alarm set.
//!
//! Every mutation returns a new event value with the sequence bumped when
//! content actually changed; the original is never touched.

use serde::Serialize;

use crate::event::{Alarm, AlarmAction, AlarmRelated, AlarmTrigger, StructuredEvent};

/// Caller-facing view of one alarm, in storage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmView {
    pub uid: String,
    pub vendor_uid: Option<String>,
    /// Normalized trigger offset; absent for non-relative or malformed
    /// triggers.
    pub minutes_before: Option<u32>,
    pub related: &'static str,
    pub action: String,
    pub description: Option<String>,
}

/// Fields for a new or replacement alarm.
#[derive(Debug, Clone)]
pub struct AlarmSpec {
    pub minutes_before: u32,
    pub description: Option<String>,
    pub action: AlarmAction,
    pub related: AlarmRelated,
}

impl AlarmSpec {
    /// A DISPLAY alarm relative to the event start.
    #[must_use]
    pub fn display(minutes_before: u32) -> Self {
        Self {
            minutes_before,
            description: None,
            action: AlarmAction::Display,
            related: AlarmRelated::Start,
        }
    }
}

/// Outcome of an add operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { uid: String },
    /// Dedupe was requested and an alarm with the same offset exists.
    SkippedDuplicate,
}

/// Outcome of a replace operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { removed_uid: String, new_uid: String },
    /// Nothing matched; the replacement was appended anyway.
    Appended { new_uid: String },
}

/// Predicate for matching alarms in replace operations.
#[derive(Debug, Clone)]
pub enum MatchBy {
    Minutes(u32),
    Uid(String),
}

impl MatchBy {
    fn matches(&self, alarm: &Alarm) -> bool {
        match self {
            Self::Minutes(minutes) => alarm.minutes_before() == Some(*minutes),
            Self::Uid(id) => alarm.matches_uid(id),
        }
    }
}

/// Predicate for matching alarms in remove operations.
#[derive(Debug, Clone)]
pub enum RemoveBy {
    Minutes(u32),
    Uid(String),
    All,
}

impl RemoveBy {
    fn matches(&self, alarm: &Alarm) -> bool {
        match self {
            Self::Minutes(minutes) => alarm.minutes_before() == Some(*minutes),
            Self::Uid(id) => alarm.matches_uid(id),
            Self::All => true,
        }
    }
}

/// Lists an event's alarms with normalized trigger offsets. Read-only,
/// never bumps the sequence.
#[must_use]
pub fn list_alarms(event: &StructuredEvent) -> Vec<AlarmView> {
    event
        .alarms
        .iter()
        .map(|alarm| AlarmView {
            uid: alarm.uid.clone(),
            vendor_uid: alarm.vendor_uid.clone(),
            minutes_before: alarm.minutes_before(),
            related: alarm.related.as_str(),
            action: alarm.action.as_str().to_string(),
            description: alarm.description.clone(),
        })
        .collect()
}

/// ## Summary
/// Appends a new alarm with a fresh UID mirrored into the vendor UID.
///
/// With `dedupe` set, an existing alarm at the same offset suppresses the
/// add and the event comes back unchanged.
#[must_use]
#[tracing::instrument(skip_all, fields(uid = %event.uid, minutes = spec.minutes_before))]
pub fn add_alarm(
    event: &StructuredEvent,
    spec: &AlarmSpec,
    dedupe: bool,
) -> (StructuredEvent, AddOutcome) {
    if dedupe
        && event
            .alarms
            .iter()
            .any(|alarm| alarm.minutes_before() == Some(spec.minutes_before))
    {
        tracing::debug!("duplicate trigger offset, skipping add");
        return (event.clone(), AddOutcome::SkippedDuplicate);
    }

    let alarm = build_alarm(spec);
    let uid = alarm.uid.clone();

    let mut updated = event.clone();
    updated.alarms.push(alarm);
    updated.sequence += 1;
    (updated, AddOutcome::Added { uid })
}

/// ## Summary
/// Removes the first alarm matching the predicate and appends a
/// replacement built from `spec`.
///
/// With no match the replacement is still appended; callers needing
/// strict match-or-fail should check [`list_alarms`] first. The sequence
/// bumps either way.
#[must_use]
#[tracing::instrument(skip_all, fields(uid = %event.uid))]
pub fn replace_alarm(
    event: &StructuredEvent,
    match_by: &MatchBy,
    spec: &AlarmSpec,
) -> (StructuredEvent, ReplaceOutcome) {
    let mut updated = event.clone();

    let removed_uid = updated
        .alarms
        .iter()
        .position(|alarm| match_by.matches(alarm))
        .map(|index| updated.alarms.remove(index).uid);

    let replacement = build_alarm(spec);
    let new_uid = replacement.uid.clone();
    updated.alarms.push(replacement);
    updated.sequence += 1;

    let outcome = match removed_uid {
        Some(removed_uid) => ReplaceOutcome::Replaced {
            removed_uid,
            new_uid,
        },
        None => ReplaceOutcome::Appended { new_uid },
    };
    (updated, outcome)
}

/// ## Summary
/// Deletes every alarm matching the predicate.
///
/// No match is a zero-removed success, not an error, and leaves the
/// sequence alone; the sequence bumps only when something was removed.
#[must_use]
#[tracing::instrument(skip_all, fields(uid = %event.uid))]
pub fn remove_alarms(event: &StructuredEvent, by: &RemoveBy) -> (StructuredEvent, usize) {
    let mut updated = event.clone();
    let before = updated.alarms.len();
    updated.alarms.retain(|alarm| !by.matches(alarm));
    let removed = before - updated.alarms.len();

    if removed > 0 {
        updated.sequence += 1;
    }
    (updated, removed)
}

pub(crate) fn build_alarm(spec: &AlarmSpec) -> Alarm {
    let uid = kunai_core::constants::new_alarm_uid();
    Alarm {
        vendor_uid: Some(uid.clone()),
        uid,
        action: spec.action.clone(),
        description: spec.description.clone(),
        trigger: AlarmTrigger::MinutesBefore(spec.minutes_before),
        related: spec.related,
        extra: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_alarms(minutes: &[u32]) -> StructuredEvent {
        let mut event = StructuredEvent::with_uid("alarm-test@test");
        event.sequence = 1;
        for (i, m) in minutes.iter().enumerate() {
            event.alarms.push(Alarm {
                uid: format!("alarm-{i}"),
                vendor_uid: Some(format!("alarm-{i}")),
                action: AlarmAction::Display,
                description: None,
                trigger: AlarmTrigger::MinutesBefore(*m),
                related: AlarmRelated::Start,
                extra: Vec::new(),
            });
        }
        event
    }

    #[test]
    fn list_mirrors_storage_order() {
        let event = event_with_alarms(&[30, 10, 60]);
        let views = list_alarms(&event);
        let minutes: Vec<_> = views.iter().map(|v| v.minutes_before).collect();
        assert_eq!(minutes, vec![Some(30), Some(10), Some(60)]);
    }

    #[test]
    fn list_normalizes_opaque_trigger_to_absent() {
        let mut event = event_with_alarms(&[]);
        event.alarms.push(Alarm {
            uid: "weird".into(),
            vendor_uid: None,
            action: AlarmAction::Display,
            description: None,
            trigger: AlarmTrigger::Opaque("PT10M".into()),
            related: AlarmRelated::Start,
            extra: Vec::new(),
        });
        assert_eq!(list_alarms(&event)[0].minutes_before, None);
    }

    #[test]
    fn add_appends_and_bumps_sequence() {
        let event = event_with_alarms(&[]);
        let (updated, outcome) = add_alarm(&event, &AlarmSpec::display(10), true);

        assert!(matches!(outcome, AddOutcome::Added { .. }));
        assert_eq!(updated.alarms.len(), 1);
        assert_eq!(updated.sequence, 2);
        let alarm = &updated.alarms[0];
        assert_eq!(alarm.vendor_uid.as_deref(), Some(alarm.uid.as_str()));
    }

    #[test]
    fn add_dedupe_is_idempotent() {
        let event = event_with_alarms(&[]);
        let (once, _) = add_alarm(&event, &AlarmSpec::display(10), true);
        let (twice, outcome) = add_alarm(&once, &AlarmSpec::display(10), true);

        assert_eq!(outcome, AddOutcome::SkippedDuplicate);
        assert_eq!(twice.alarms.len(), 1);
        assert_eq!(twice.sequence, once.sequence);
    }

    #[test]
    fn add_without_dedupe_allows_duplicates() {
        let event = event_with_alarms(&[10]);
        let (updated, outcome) = add_alarm(&event, &AlarmSpec::display(10), false);
        assert!(matches!(outcome, AddOutcome::Added { .. }));
        assert_eq!(updated.alarms.len(), 2);
    }

    #[test]
    fn replace_by_minutes_substitutes_first_match() {
        let event = event_with_alarms(&[10, 10, 30]);
        let (updated, outcome) =
            replace_alarm(&event, &MatchBy::Minutes(10), &AlarmSpec::display(5));

        assert!(matches!(outcome, ReplaceOutcome::Replaced { ref removed_uid, .. }
            if removed_uid == "alarm-0"));
        // Second 10-minute alarm and the 30-minute alarm survive.
        let minutes: Vec<_> = updated.alarms.iter().map(Alarm::minutes_before).collect();
        assert_eq!(minutes, vec![Some(10), Some(30), Some(5)]);
        assert_eq!(updated.sequence, 2);
    }

    #[test]
    fn replace_by_vendor_uid() {
        let event = event_with_alarms(&[10, 20]);
        let (updated, outcome) = replace_alarm(
            &event,
            &MatchBy::Uid("alarm-1".into()),
            &AlarmSpec::display(15),
        );
        assert!(matches!(outcome, ReplaceOutcome::Replaced { .. }));
        let minutes: Vec<_> = updated.alarms.iter().map(Alarm::minutes_before).collect();
        assert_eq!(minutes, vec![Some(10), Some(15)]);
    }

    #[test]
    fn replace_without_match_appends() {
        let event = event_with_alarms(&[10]);
        let (updated, outcome) =
            replace_alarm(&event, &MatchBy::Minutes(99), &AlarmSpec::display(5));

        assert!(matches!(outcome, ReplaceOutcome::Appended { .. }));
        assert_eq!(updated.alarms.len(), 2);
        assert_eq!(updated.sequence, 2);
    }

    #[test]
    fn remove_by_minutes_deletes_all_matching() {
        let event = event_with_alarms(&[10, 10, 30]);
        let (updated, removed) = remove_alarms(&event, &RemoveBy::Minutes(10));
        assert_eq!(removed, 2);
        assert_eq!(updated.alarms.len(), 1);
        assert_eq!(updated.sequence, 2);
    }

    #[test]
    fn remove_all_empties_the_set() {
        let event = event_with_alarms(&[10, 20, 30]);
        let (updated, removed) = remove_alarms(&event, &RemoveBy::All);
        assert_eq!(removed, 3);
        assert!(list_alarms(&updated).is_empty());
    }

    #[test]
    fn remove_without_match_is_a_quiet_noop() {
        let event = event_with_alarms(&[10]);
        let (updated, removed) = remove_alarms(&event, &RemoveBy::Uid("missing".into()));
        assert_eq!(removed, 0);
        assert_eq!(updated.sequence, event.sequence);
        assert_eq!(updated.alarms, event.alarms);
    }
}
