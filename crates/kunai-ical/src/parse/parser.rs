//! Component tree parser for iCalendar streams.
//!
//! Structural problems (unbalanced BEGIN/END, missing separators) are hard
//! errors. Value-level problems are not: a property whose value fails to
//! parse is carried as `Value::Unknown` with the raw text intact, so one
//! malformed line never makes a whole calendar object unreadable.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use super::values::{
    parse_date, parse_datetime, parse_duration, parse_integer, parse_time, parse_utc_offset,
    unescape_text,
};
use crate::model::{Component, ComponentKind, ContentLine, ICalendar, Property, Value};

/// Parses an iCalendar stream into an `ICalendar` object.
///
/// ## Errors
/// Returns an error if the stream is structurally malformed or does not
/// start with `BEGIN:VCALENDAR`.
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    let lines = split_lines(input);
    let mut pos = 0;

    let root = parse_component(&lines, &mut pos)?;
    if root.kind != Some(ComponentKind::Calendar) {
        return Err(
            ParseError::new(ParseErrorKind::MissingBegin, lines[0].0, 1)
                .with_context(format!("expected BEGIN:VCALENDAR, found {}", root.name)),
        );
    }

    Ok(ICalendar { root })
}

fn parse_component(lines: &[(usize, String)], pos: &mut usize) -> ParseResult<Component> {
    let (begin_line_num, begin_line) = lines
        .get(*pos)
        .ok_or(ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;

    let begin = parse_content_line(begin_line, *begin_line_num)?;
    if begin.name != "BEGIN" {
        return Err(
            ParseError::new(ParseErrorKind::MissingBegin, *begin_line_num, 1)
                .with_context(format!("expected BEGIN, found {}", begin.name)),
        );
    }

    let mut component = Component::custom(begin.raw_value.trim().to_ascii_uppercase());
    *pos += 1;

    while let Some((line_num, line)) = lines.get(*pos) {
        let cl = parse_content_line(line, *line_num)?;
        match cl.name.as_str() {
            "BEGIN" => {
                // Recursion re-reads the BEGIN line at the current position.
                component.add_child(parse_component(lines, pos)?);
            }
            "END" => {
                let name = cl.raw_value.trim().to_ascii_uppercase();
                if name != component.name {
                    return Err(ParseError::new(
                        ParseErrorKind::MismatchedComponent,
                        *line_num,
                        1,
                    )
                    .with_context(format!("END:{name} closes BEGIN:{}", component.name)));
                }
                *pos += 1;
                return Ok(component);
            }
            _ => {
                component.add_property(parse_property(cl, *line_num));
                *pos += 1;
            }
        }
    }

    let last_line = lines.last().map_or(1, |(n, _)| *n);
    Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
        .with_context(format!("unterminated {}", component.name)))
}

/// Converts a content line into a typed property.
///
/// Unparseable values fall back to `Value::Unknown` with a warning, never
/// an error.
fn parse_property(cl: ContentLine, line_num: usize) -> Property {
    let value = match parse_value(&cl, line_num) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(property = %cl.name, %error, "carrying unparseable value verbatim");
            Value::Unknown(cl.raw_value.clone())
        }
    };

    Property {
        name: cl.name,
        params: cl.params,
        value,
        raw_value: cl.raw_value,
    }
}

fn parse_value(cl: &ContentLine, line_num: usize) -> ParseResult<Value> {
    // An explicit VALUE parameter overrides name-based inference.
    if let Some(value_type) = cl.value_type() {
        return parse_typed_value(cl, &value_type.to_ascii_uppercase(), line_num);
    }

    let raw = cl.raw_value.as_str();
    let value = match cl.name.as_str() {
        "DTSTART" | "DTEND" | "DTSTAMP" | "CREATED" | "LAST-MODIFIED" | "RECURRENCE-ID" => {
            Value::DateTime(parse_datetime(raw, cl.tzid(), line_num)?)
        }
        "EXDATE" | "RDATE" => Value::DateTimeList(
            raw.split(',')
                .map(|part| parse_datetime(part, cl.tzid(), line_num))
                .collect::<ParseResult<Vec<_>>>()?,
        ),
        "DURATION" => Value::Duration(parse_duration(raw, line_num)?),
        "TRIGGER" => {
            // TRIGGER defaults to DURATION; an absolute trigger carries
            // VALUE=DATE-TIME, but sniff for producers that omit it.
            if raw.trim_start_matches(['+', '-']).starts_with('P') {
                Value::Duration(parse_duration(raw, line_num)?)
            } else {
                Value::DateTime(parse_datetime(raw, cl.tzid(), line_num)?)
            }
        }
        "SEQUENCE" | "PRIORITY" | "REPEAT" => Value::Integer(parse_integer(raw, line_num)?),
        "TZOFFSETFROM" | "TZOFFSETTO" => Value::UtcOffset(parse_utc_offset(raw, line_num)?),
        "URL" | "TZURL" => Value::Uri(raw.to_string()),
        // RRULE stays opaque; recurrence rules are round-tripped, not
        // interpreted.
        "RRULE" => Value::Unknown(raw.to_string()),
        _ => Value::Text(unescape_text(raw)),
    };
    Ok(value)
}

fn parse_typed_value(cl: &ContentLine, value_type: &str, line_num: usize) -> ParseResult<Value> {
    let raw = cl.raw_value.as_str();
    let value = match value_type {
        "DATE" => {
            if raw.contains(',') {
                Value::DateList(
                    raw.split(',')
                        .map(|part| parse_date(part, line_num))
                        .collect::<ParseResult<Vec<_>>>()?,
                )
            } else {
                Value::Date(parse_date(raw, line_num)?)
            }
        }
        "DATE-TIME" => {
            if raw.contains(',') {
                Value::DateTimeList(
                    raw.split(',')
                        .map(|part| parse_datetime(part, cl.tzid(), line_num))
                        .collect::<ParseResult<Vec<_>>>()?,
                )
            } else {
                Value::DateTime(parse_datetime(raw, cl.tzid(), line_num)?)
            }
        }
        "DURATION" => Value::Duration(parse_duration(raw, line_num)?),
        "TIME" => Value::Time(parse_time(raw, line_num)?),
        "INTEGER" => Value::Integer(parse_integer(raw, line_num)?),
        "UTC-OFFSET" => Value::UtcOffset(parse_utc_offset(raw, line_num)?),
        "TEXT" => Value::Text(unescape_text(raw)),
        "URI" => Value::Uri(raw.to_string()),
        _ => Value::Unknown(raw.to_string()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        PRODID:-//Test//Test//EN\r\n\
        BEGIN:VEVENT\r\n\
        UID:abc-123\r\n\
        DTSTAMP:20260123T120000Z\r\n\
        DTSTART:20260123T140000Z\r\n\
        SUMMARY:Team Sync\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    #[test]
    fn parses_minimal_calendar() {
        let ical = parse(MINIMAL).unwrap();
        assert_eq!(ical.version(), Some("2.0"));
        let events = ical.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid(), Some("abc-123"));
        assert_eq!(events[0].summary(), Some("Team Sync"));
    }

    #[test]
    fn parses_typed_datetime() {
        let ical = parse(MINIMAL).unwrap();
        let event = ical.events()[0];
        let dt = event.get_property("DTSTART").unwrap().as_datetime().unwrap();
        assert!(dt.is_utc());
        assert_eq!((dt.hour, dt.minute), (14, 0));
    }

    #[test]
    fn parses_nested_alarm() {
        let input = "BEGIN:VCALENDAR\r\n\
            VERSION:2.0\r\n\
            BEGIN:VEVENT\r\n\
            UID:with-alarm\r\n\
            BEGIN:VALARM\r\n\
            ACTION:DISPLAY\r\n\
            TRIGGER:-PT15M\r\n\
            END:VALARM\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let alarms = ical.events()[0].alarms();
        assert_eq!(alarms.len(), 1);
        let trigger = alarms[0].get_property("TRIGGER").unwrap();
        assert_eq!(trigger.as_duration().unwrap().minutes, 15);
        assert!(trigger.as_duration().unwrap().negative);
    }

    #[test]
    fn zoned_dtstart_picks_up_tzid_param() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART;TZID=Europe/Berlin:20260123T093000\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let dt = ical.events()[0]
            .get_property("DTSTART")
            .unwrap()
            .as_datetime()
            .unwrap();
        assert_eq!(dt.tzid(), Some("Europe/Berlin"));
    }

    #[test]
    fn value_date_override() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART;VALUE=DATE:20260123\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let date = ical.events()[0]
            .get_property("DTSTART")
            .unwrap()
            .as_date()
            .unwrap();
        assert_eq!((date.year, date.month, date.day), (2026, 1, 23));
    }

    #[test]
    fn rrule_stays_opaque() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            RRULE:FREQ=WEEKLY;BYDAY=MO,WE\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let rrule = ical.events()[0].get_property("RRULE").unwrap();
        assert_eq!(rrule.value, Value::Unknown("FREQ=WEEKLY;BYDAY=MO,WE".into()));
        assert_eq!(rrule.raw_value, "FREQ=WEEKLY;BYDAY=MO,WE");
    }

    #[test_log::test]
    fn malformed_value_is_carried_verbatim() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART:not-a-datetime\r\n\
            SUMMARY:Still Readable\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let event = ical.events()[0];
        assert_eq!(
            event.get_property("DTSTART").unwrap().value,
            Value::Unknown("not-a-datetime".into())
        );
        assert_eq!(event.summary(), Some("Still Readable"));
    }

    #[test]
    fn text_values_are_unescaped() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DESCRIPTION:Line one\\nLine two\\, with comma\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        assert_eq!(
            ical.events()[0].description(),
            Some("Line one\nLine two, with comma")
        );
    }

    #[test]
    fn mismatched_end_is_rejected() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            END:VALARM\r\n\
            END:VCALENDAR\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MismatchedComponent);
    }

    #[test]
    fn missing_end_is_rejected() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            UID:truncated\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEnd);
    }

    #[test]
    fn unknown_component_kind_is_carried() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VTODO\r\n\
            UID:a-todo\r\n\
            END:VTODO\r\n\
            END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        assert_eq!(ical.root.children.len(), 1);
        assert_eq!(ical.root.children[0].kind, Some(ComponentKind::Unknown));
        assert_eq!(ical.root.children[0].name, "VTODO");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(parse("").is_err());
    }
}
