//! iCalendar object serializer.

use super::escape::{escape_param_value, escape_text};
use super::fold::fold_line;
use crate::model::{Component, ICalendar, Property, Value};

/// Serializes an iCalendar object to its wire form.
///
/// Lines are CRLF-terminated and folded at 75 octets. Values the parser
/// did not interpret are emitted from their preserved raw text, so a
/// decode/encode cycle keeps unmodeled properties byte-for-byte.
#[must_use]
pub fn serialize(ical: &ICalendar) -> String {
    let mut out = String::new();
    write_component(&mut out, &ical.root);
    out
}

fn write_component(out: &mut String, component: &Component) {
    write_line(out, &format!("BEGIN:{}", component.name));
    for prop in &component.properties {
        write_line(out, &property_line(prop));
    }
    for child in &component.children {
        write_component(out, child);
    }
    write_line(out, &format!("END:{}", component.name));
}

fn write_line(out: &mut String, line: &str) {
    out.push_str(&fold_line(line));
    out.push_str("\r\n");
}

fn property_line(prop: &Property) -> String {
    let mut line = prop.name.clone();

    for param in &prop.params {
        line.push(';');
        line.push_str(&param.name);
        line.push('=');
        for (i, value) in param.values.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_param_value(value));
        }
    }

    line.push(':');
    line.push_str(&render_value(prop));
    line
}

/// Renders a property's value.
///
/// Text is re-escaped from its parsed form; every other kind uses the
/// preserved raw value, which the typed constructors keep in sync.
fn render_value(prop: &Property) -> String {
    match &prop.value {
        Value::Text(text) => escape_text(text),
        _ => prop.raw_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, DateTime, Parameter};

    #[test]
    fn serializes_minimal_calendar() {
        let mut ical = ICalendar::new("-//Test//Test//EN");
        let mut event = Component::event();
        event.add_property(Property::text("UID", "abc-123"));
        event.add_property(Property::datetime(
            "DTSTART",
            DateTime::utc(2026, 1, 23, 14, 0, 0),
        ));
        ical.add_event(event);

        let output = serialize(&ical);
        assert!(output.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(output.contains("VERSION:2.0\r\n"));
        assert!(output.contains("BEGIN:VEVENT\r\n"));
        assert!(output.contains("UID:abc-123\r\n"));
        assert!(output.contains("DTSTART:20260123T140000Z\r\n"));
        assert!(output.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn text_values_are_escaped() {
        let mut event = Component::event();
        event.add_property(Property::text("DESCRIPTION", "Line one\nsecond, part"));
        let mut ical = ICalendar::default();
        ical.add_event(event);

        let output = serialize(&ical);
        assert!(output.contains("DESCRIPTION:Line one\\nsecond\\, part\r\n"));
    }

    #[test]
    fn params_are_rendered() {
        let mut event = Component::event();
        event.add_property(Property::datetime(
            "DTSTART",
            DateTime::zoned(2026, 1, 23, 9, 30, 0, "America/New_York"),
        ));
        let mut ical = ICalendar::default();
        ical.add_event(event);

        let output = serialize(&ical);
        assert!(output.contains("DTSTART;TZID=America/New_York:20260123T093000\r\n"));
    }

    #[test]
    fn param_values_needing_quotes_are_quoted() {
        let mut event = Component::event();
        let mut prop = Property::text("ATTENDEE", "mailto:jane@example.com");
        prop.add_param(Parameter::new("CN", "Doe, Jane"));
        event.add_property(prop);
        let mut ical = ICalendar::default();
        ical.add_event(event);

        let output = serialize(&ical);
        assert!(output.contains("ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com\r\n"));
    }

    #[test]
    fn unknown_values_round_trip_raw() {
        let mut event = Component::event();
        event.add_property(Property::raw("RRULE", "FREQ=WEEKLY;BYDAY=MO,WE"));
        let mut ical = ICalendar::default();
        ical.add_event(event);

        let output = serialize(&ical);
        assert!(output.contains("RRULE:FREQ=WEEKLY;BYDAY=MO,WE\r\n"));
    }
}
