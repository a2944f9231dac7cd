//! iCalendar property parameters (RFC 5545 §3.2).

/// A property parameter with one or more values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Values in order of appearance.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    /// Creates a parameter with multiple values.
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// Creates a `TZID` parameter.
    #[must_use]
    pub fn tzid(value: impl Into<String>) -> Self {
        Self::new("TZID", value)
    }

    /// Creates a `VALUE` type parameter (e.g. `VALUE=DATE`).
    #[must_use]
    pub fn value_type(value: impl Into<String>) -> Self {
        Self::new("VALUE", value)
    }

    /// Creates a `RELATED` parameter for alarm triggers.
    #[must_use]
    pub fn related(value: impl Into<String>) -> Self {
        Self::new("RELATED", value)
    }

    /// Returns the first value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}
