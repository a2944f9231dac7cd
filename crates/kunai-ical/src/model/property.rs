//! iCalendar property and content line types (RFC 5545 §3.1, §3.8).

use super::{Parameter, Value};

/// A raw content line as parsed from iCalendar text.
///
/// This is the low-level representation before value type resolution.
/// Preserves the original raw value for round-trip fidelity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value string (after unfolding, before unescaping).
    pub raw_value: String,
}

impl ContentLine {
    /// Creates a new content line.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            raw_value: value.into(),
        }
    }

    /// Creates a content line with parameters.
    #[must_use]
    pub fn with_params(
        name: impl Into<String>,
        params: Vec<Parameter>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params,
            raw_value: value.into(),
        }
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        let name_upper = name.to_ascii_uppercase();
        self.params.iter().find(|p| p.name == name_upper)
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Returns the VALUE parameter if present.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.get_param_value("VALUE")
    }

    /// Returns the TZID parameter if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param_value("TZID")
    }
}

/// A fully parsed iCalendar property.
///
/// Contains the parsed value along with the original raw value
/// for round-trip fidelity.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Parsed value.
    pub value: Value,
    /// Original raw value string (for round-trip).
    pub raw_value: String,
}

impl Property {
    /// Creates a property with a text value.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value_str = value.into();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Text(value_str.clone()),
            raw_value: value_str,
        }
    }

    /// Creates a property with an integer value.
    #[must_use]
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Integer(value),
            raw_value: value.to_string(),
        }
    }

    /// Creates a property with a datetime value.
    #[must_use]
    pub fn datetime(name: impl Into<String>, dt: super::DateTime) -> Self {
        let raw = dt.to_string();
        let params = match dt.tzid() {
            Some(tzid) => vec![Parameter::tzid(tzid)],
            None => Vec::new(),
        };
        Self {
            name: name.into().to_ascii_uppercase(),
            params,
            value: Value::DateTime(dt),
            raw_value: raw,
        }
    }

    /// Creates a property with a date value (tagged `VALUE=DATE`).
    #[must_use]
    pub fn date(name: impl Into<String>, d: super::Date) -> Self {
        let raw = d.to_string();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: vec![Parameter::value_type("DATE")],
            value: Value::Date(d),
            raw_value: raw,
        }
    }

    /// Creates a property with a duration value.
    #[must_use]
    pub fn duration(name: impl Into<String>, d: super::Duration) -> Self {
        let raw = d.to_string();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Duration(d),
            raw_value: raw,
        }
    }

    /// Creates a property with a UTC-OFFSET value.
    #[must_use]
    pub fn utc_offset(name: impl Into<String>, offset: super::UtcOffset) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::UtcOffset(offset),
            raw_value: offset.to_string(),
        }
    }

    /// Creates a property carrying an uninterpreted raw value.
    #[must_use]
    pub fn raw(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        let raw_value = raw_value.into();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Unknown(raw_value.clone()),
            raw_value,
        }
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        let name_upper = name.to_ascii_uppercase();
        self.params.iter().find(|p| p.name == name_upper)
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Adds a parameter to this property.
    pub fn add_param(&mut self, param: Parameter) {
        self.params.push(param);
    }

    /// Sets a parameter, replacing any existing parameter with the same name.
    pub fn set_param(&mut self, param: Parameter) {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
    }

    /// Returns the value as text if it is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    /// Returns the value as an integer if it is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        self.value.as_integer()
    }

    /// Returns the value as a datetime if it is a datetime value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&super::DateTime> {
        self.value.as_datetime()
    }

    /// Returns the value as a date if it is a date value.
    #[must_use]
    pub fn as_date(&self) -> Option<&super::Date> {
        self.value.as_date()
    }

    /// Returns the value as a duration if it is a duration value.
    #[must_use]
    pub fn as_duration(&self) -> Option<&super::Duration> {
        self.value.as_duration()
    }
}

/// Property names the engine touches, as constants.
pub mod names {
    pub const PRODID: &str = "PRODID";
    pub const VERSION: &str = "VERSION";

    pub const UID: &str = "UID";
    pub const DTSTAMP: &str = "DTSTAMP";
    pub const DTSTART: &str = "DTSTART";
    pub const DTEND: &str = "DTEND";
    pub const SUMMARY: &str = "SUMMARY";
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const LOCATION: &str = "LOCATION";
    pub const RRULE: &str = "RRULE";
    pub const SEQUENCE: &str = "SEQUENCE";

    pub const ACTION: &str = "ACTION";
    pub const TRIGGER: &str = "TRIGGER";
    pub const RELATED: &str = "RELATED";
    pub const VENDOR_ALARM_UID: &str = "X-WR-ALARMUID";

    pub const TZID: &str = "TZID";
    pub const TZOFFSETFROM: &str = "TZOFFSETFROM";
    pub const TZOFFSETTO: &str = "TZOFFSETTO";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_line_get_param() {
        let cl = ContentLine::with_params(
            "DTSTART",
            vec![Parameter::tzid("America/New_York")],
            "20260123T120000",
        );
        assert_eq!(cl.tzid(), Some("America/New_York"));
        assert!(cl.value_type().is_none());
    }

    #[test]
    fn property_text() {
        let prop = Property::text("SUMMARY", "Meeting");
        assert_eq!(prop.name, "SUMMARY");
        assert_eq!(prop.as_text(), Some("Meeting"));
    }

    #[test]
    fn property_integer() {
        let prop = Property::integer("SEQUENCE", 5);
        assert_eq!(prop.as_integer(), Some(5));
    }

    #[test]
    fn property_datetime_carries_tzid_param() {
        let prop = Property::datetime(
            "DTSTART",
            super::super::DateTime::zoned(2026, 1, 23, 9, 0, 0, "Europe/Berlin"),
        );
        assert_eq!(prop.get_param_value("TZID"), Some("Europe/Berlin"));
    }
}
