//! Event codec: iCalendar bytes to [`StructuredEvent`] and back.
//!
//! Decoding is best-effort: it fails only when no event component exists
//! at all, and otherwise recovers whatever fields it can, leaving the
//! rest absent. Encoding always emits a well-formed VCALENDAR with the
//! product identifier, exactly one VEVENT, its alarms, and a synthesized
//! VTIMEZONE for every zone the timestamps reference.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use kunai_ical::build::serialize;
use kunai_ical::expand::{TimeZoneResolver, convert_to_utc_lenient, synthesize_vtimezone};
use kunai_ical::model::{
    self, Component, DateTimeForm, ICalendar, Parameter, Property, Value, names,
};
use kunai_ical::parse::parse;

use crate::error::{EngineError, EngineResult};
use crate::event::{Alarm, AlarmAction, AlarmRelated, AlarmTrigger, EventTime, StructuredEvent};

/// ## Summary
/// Decodes iCalendar text into a structured event.
///
/// The first VEVENT in the stream is taken; timezone blocks and other
/// component kinds are tolerated and skipped. Scalar fields the stream
/// lacks stay absent.
///
/// ## Errors
/// Fails on structurally unparseable input or when no VEVENT exists.
#[tracing::instrument(skip_all)]
pub fn decode(input: &str) -> EngineResult<StructuredEvent> {
    let ical = parse(input)?;
    let component = ical
        .events()
        .into_iter()
        .next()
        .ok_or(EngineError::MissingEvent)?;
    Ok(event_from_component(component))
}

/// ## Summary
/// Encodes a structured event to iCalendar text.
///
/// Zoned timestamps get a matching VTIMEZONE block derived from the IANA
/// database; unresolvable TZIDs are logged and their block omitted.
#[must_use]
pub fn encode(event: &StructuredEvent) -> String {
    let mut ical = ICalendar::default();

    for vtz in synthesize_timezones(event) {
        ical.add_timezone(vtz);
    }
    ical.add_event(event_component(event));

    serialize(&ical)
}

fn event_from_component(component: &Component) -> StructuredEvent {
    let mut event = StructuredEvent::with_uid(String::new());
    let mut resolver = TimeZoneResolver::new();

    for prop in &component.properties {
        match prop.name.as_str() {
            names::UID => {
                if let Some(uid) = prop.as_text() {
                    event.uid = uid.to_string();
                }
            }
            names::DTSTAMP => event.dtstamp = prop.as_datetime().and_then(datetime_to_utc),
            // An uninterpretable start or end stays in extra so the
            // original line survives a patch and re-encode.
            names::DTSTART => match event_time_from_property(prop, &mut resolver) {
                Some(time) => event.start = Some(time),
                None => event.extra.push(prop.clone()),
            },
            names::DTEND => match event_time_from_property(prop, &mut resolver) {
                Some(time) => event.end = Some(time),
                None => event.extra.push(prop.clone()),
            },
            names::SUMMARY => event.summary = prop.as_text().map(str::to_string),
            names::DESCRIPTION => event.description = prop.as_text().map(str::to_string),
            names::LOCATION => event.location = prop.as_text().map(str::to_string),
            names::RRULE => event.rrule = Some(prop.raw_value.clone()),
            names::SEQUENCE => {
                event.sequence = prop
                    .as_integer()
                    .and_then(|i| u32::try_from(i).ok())
                    .unwrap_or(0);
            }
            _ => event.extra.push(prop.clone()),
        }
    }

    if event.uid.is_empty() {
        event.uid = kunai_core::constants::new_event_uid();
        tracing::debug!(uid = %event.uid, "synthesized UID for event without one");
    }

    for alarm in component.alarms() {
        event.alarms.push(alarm_from_component(alarm));
    }

    event
}

fn alarm_from_component(component: &Component) -> Alarm {
    let mut alarm = Alarm {
        uid: String::new(),
        vendor_uid: None,
        action: AlarmAction::default(),
        description: None,
        trigger: AlarmTrigger::Opaque(String::new()),
        related: AlarmRelated::Start,
        extra: Vec::new(),
    };

    for prop in &component.properties {
        match prop.name.as_str() {
            names::UID => {
                if let Some(uid) = prop.as_text() {
                    alarm.uid = uid.to_string();
                }
            }
            names::VENDOR_ALARM_UID => alarm.vendor_uid = prop.as_text().map(str::to_string),
            names::ACTION => {
                if let Some(action) = prop.as_text() {
                    alarm.action = AlarmAction::parse(action);
                }
            }
            names::DESCRIPTION => alarm.description = prop.as_text().map(str::to_string),
            names::TRIGGER => {
                alarm.related = prop
                    .get_param_value(names::RELATED)
                    .map(AlarmRelated::parse)
                    .unwrap_or_default();
                alarm.trigger = trigger_from_property(prop);
            }
            _ => alarm.extra.push(prop.clone()),
        }
    }

    if alarm.uid.is_empty() {
        alarm.uid = alarm
            .vendor_uid
            .clone()
            .unwrap_or_else(kunai_core::constants::new_alarm_uid);
    }

    alarm
}

/// Only negative whole-minute durations are interpreted; everything else
/// (absolute triggers, positive or sub-minute durations) stays opaque.
fn trigger_from_property(prop: &Property) -> AlarmTrigger {
    match prop.as_duration() {
        Some(duration) if duration.negative => duration
            .whole_minutes()
            .map_or_else(|| AlarmTrigger::Opaque(prop.raw_value.clone()), AlarmTrigger::MinutesBefore),
        _ => AlarmTrigger::Opaque(prop.raw_value.clone()),
    }
}

fn event_time_from_property(prop: &Property, resolver: &mut TimeZoneResolver) -> Option<EventTime> {
    match &prop.value {
        Value::Date(date) => date.naive().map(EventTime::Date),
        Value::DateTime(dt) => {
            let naive = dt.naive()?;
            Some(instant_from_parts(naive, &dt.form, resolver))
        }
        other => {
            tracing::warn!(property = %prop.name, ?other, "uninterpretable time value, field left absent");
            None
        }
    }
}

fn instant_from_parts(
    naive: NaiveDateTime,
    form: &DateTimeForm,
    resolver: &mut TimeZoneResolver,
) -> EventTime {
    match form {
        // Floating times are interpreted as UTC.
        DateTimeForm::Utc | DateTimeForm::Floating => EventTime::Instant {
            at: Utc.from_utc_datetime(&naive).fixed_offset(),
            tzid: None,
        },
        DateTimeForm::Zoned { tzid } => {
            if let Ok(utc) = convert_to_utc_lenient(naive, tzid, resolver)
                && let Ok(tz) = resolver.resolve(tzid)
            {
                // Re-express in the zone so the wall clock encodes under
                // its TZID.
                return EventTime::Instant {
                    at: utc.with_timezone(&tz).fixed_offset(),
                    tzid: Some(tzid.clone()),
                };
            }
            // Unknown zone: keep the wall clock as if UTC so the value
            // re-encodes unchanged.
            tracing::warn!(%tzid, %naive, "could not resolve zoned time, treating wall clock as UTC");
            EventTime::Instant {
                at: Utc.from_utc_datetime(&naive).fixed_offset(),
                tzid: Some(tzid.clone()),
            }
        }
    }
}

fn datetime_to_utc(dt: &model::DateTime) -> Option<DateTime<Utc>> {
    // DTSTAMP is effectively always UTC; a floating or zoned stamp is
    // read as UTC wall time.
    Some(Utc.from_utc_datetime(&dt.naive()?))
}

fn synthesize_timezones(event: &StructuredEvent) -> Vec<Component> {
    let mut resolver = TimeZoneResolver::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut components = Vec::new();

    for time in [&event.start, &event.end].into_iter().flatten() {
        let EventTime::Instant {
            at,
            tzid: Some(tzid),
        } = time
        else {
            continue;
        };
        if seen.contains(&tzid.as_str()) {
            continue;
        }
        seen.push(tzid);

        let Ok(tz) = resolver.resolve(tzid) else {
            tracing::warn!(%tzid, "cannot synthesize VTIMEZONE for unknown zone");
            continue;
        };
        let year = u16::try_from(at.year()).unwrap_or(1970);
        if let Some(vtz) = synthesize_vtimezone(tzid, tz, year) {
            components.push(vtz);
        }
    }

    components
}

fn event_component(event: &StructuredEvent) -> Component {
    let mut component = Component::event();

    component.add_property(Property::text(names::UID, &event.uid));
    let dtstamp = event.dtstamp.unwrap_or_else(Utc::now);
    component.add_property(Property::datetime(names::DTSTAMP, model_utc(dtstamp)));

    if let Some(start) = &event.start {
        component.add_property(time_property(names::DTSTART, start));
    }
    if let Some(end) = &event.end {
        component.add_property(time_property(names::DTEND, end));
    }
    if let Some(summary) = &event.summary {
        component.add_property(Property::text(names::SUMMARY, summary));
    }
    if let Some(description) = &event.description {
        component.add_property(Property::text(names::DESCRIPTION, description));
    }
    if let Some(location) = &event.location {
        component.add_property(Property::text(names::LOCATION, location));
    }
    if let Some(rrule) = &event.rrule {
        component.add_property(Property::raw(names::RRULE, rrule));
    }
    component.add_property(Property::integer(
        names::SEQUENCE,
        i32::try_from(event.sequence).unwrap_or(i32::MAX),
    ));

    for prop in &event.extra {
        component.add_property(prop.clone());
    }

    for alarm in &event.alarms {
        component.add_child(alarm_component(alarm));
    }

    component
}

fn alarm_component(alarm: &Alarm) -> Component {
    let mut component = Component::alarm();

    component.add_property(Property::text(names::UID, &alarm.uid));
    if let Some(vendor_uid) = &alarm.vendor_uid {
        component.add_property(Property::text(names::VENDOR_ALARM_UID, vendor_uid));
    }
    component.add_property(Property::text(names::ACTION, alarm.action.as_str()));
    if let Some(description) = &alarm.description {
        component.add_property(Property::text(names::DESCRIPTION, description));
    }

    let mut trigger = match &alarm.trigger {
        AlarmTrigger::MinutesBefore(minutes) => Property::duration(
            names::TRIGGER,
            model::Duration::minutes_before(*minutes),
        ),
        AlarmTrigger::Opaque(raw) => Property::raw(names::TRIGGER, raw),
    };
    if alarm.related == AlarmRelated::End {
        trigger.add_param(Parameter::related(AlarmRelated::End.as_str()));
    }
    component.add_property(trigger);

    for prop in &alarm.extra {
        component.add_property(prop.clone());
    }

    component
}

fn time_property(name: &str, time: &EventTime) -> Property {
    match time {
        EventTime::Date(date) => Property::date(name, model_date(*date)),
        EventTime::Instant { at, tzid: Some(tzid) } => {
            Property::datetime(name, model_zoned(at.naive_local(), tzid))
        }
        EventTime::Instant { at, tzid: None } => {
            Property::datetime(name, model_utc(at.with_timezone(&Utc)))
        }
    }
}

fn model_date(date: NaiveDate) -> model::Date {
    model::Date {
        year: u16::try_from(date.year()).unwrap_or(0),
        month: u8::try_from(date.month()).unwrap_or(1),
        day: u8::try_from(date.day()).unwrap_or(1),
    }
}

fn model_utc(dt: DateTime<Utc>) -> model::DateTime {
    model::DateTime::utc(
        u16::try_from(dt.year()).unwrap_or(0),
        u8::try_from(dt.month()).unwrap_or(1),
        u8::try_from(dt.day()).unwrap_or(1),
        u8::try_from(dt.hour()).unwrap_or(0),
        u8::try_from(dt.minute()).unwrap_or(0),
        u8::try_from(dt.second()).unwrap_or(0),
    )
}

fn model_zoned(naive: NaiveDateTime, tzid: &str) -> model::DateTime {
    model::DateTime::zoned(
        u16::try_from(naive.year()).unwrap_or(0),
        u8::try_from(naive.month()).unwrap_or(1),
        u8::try_from(naive.day()).unwrap_or(1),
        u8::try_from(naive.hour()).unwrap_or(0),
        u8::try_from(naive.minute()).unwrap_or(0),
        u8::try_from(naive.second()).unwrap_or(0),
        tzid,
    )
}
