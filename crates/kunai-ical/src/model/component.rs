//! iCalendar component types (RFC 5545 §3.4-3.6).

use super::Property;

/// Component kind for iCalendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// VCALENDAR wrapper component.
    Calendar,
    /// VEVENT component.
    Event,
    /// VTIMEZONE component.
    Timezone,
    /// VALARM component (nested within VEVENT).
    Alarm,
    /// STANDARD sub-component of VTIMEZONE.
    Standard,
    /// DAYLIGHT sub-component of VTIMEZONE.
    Daylight,
    /// Anything else (VTODO, VJOURNAL, X-components, ...). Carried but
    /// not interpreted.
    Unknown,
}

impl ComponentKind {
    /// Returns the string name for this component kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Unknown => "X-UNKNOWN",
        }
    }

    /// Parses a component kind from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An iCalendar component.
///
/// Components contain properties and nested sub-components; a VCALENDAR
/// contains VEVENTs, which may contain VALARMs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Component {
    /// Component type/name.
    pub kind: Option<ComponentKind>,
    /// Original component name (preserved for unmodeled components).
    pub name: String,
    /// Properties in order of appearance.
    pub properties: Vec<Property>,
    /// Nested sub-components.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates a new component with the given kind.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind: Some(kind),
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a new component with a custom name (for X-components).
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ComponentKind::parse(&name);
        Self {
            kind: Some(kind),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a VCALENDAR component.
    #[must_use]
    pub fn calendar() -> Self {
        Self::new(ComponentKind::Calendar)
    }

    /// Creates a VEVENT component.
    #[must_use]
    pub fn event() -> Self {
        Self::new(ComponentKind::Event)
    }

    /// Creates a VTIMEZONE component.
    #[must_use]
    pub fn timezone() -> Self {
        Self::new(ComponentKind::Timezone)
    }

    /// Creates a VALARM component.
    #[must_use]
    pub fn alarm() -> Self {
        Self::new(ComponentKind::Alarm)
    }

    /// Adds a property to this component.
    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    /// Adds a child component.
    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        let name_upper = name.to_ascii_uppercase();
        self.properties.iter().find(|p| p.name == name_upper)
    }

    /// Returns the UID property value if present.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.get_property("UID")?.as_text()
    }

    /// Returns the SUMMARY property value if present.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.get_property("SUMMARY")?.as_text()
    }

    /// Returns the DESCRIPTION property value if present.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.get_property("DESCRIPTION")?.as_text()
    }

    /// Returns children of a specific kind.
    #[must_use]
    pub fn children_of_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.children
            .iter()
            .filter(|c| c.kind == Some(kind))
            .collect()
    }

    /// Returns all VEVENT children.
    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Event)
    }

    /// Returns all VTIMEZONE children.
    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Timezone)
    }

    /// Returns all VALARM children.
    #[must_use]
    pub fn alarms(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Alarm)
    }
}

/// Top-level iCalendar object.
///
/// This is a convenience wrapper around a VCALENDAR component
/// with helper methods for common operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ICalendar {
    /// The root VCALENDAR component.
    pub root: Component,
}

impl ICalendar {
    /// Creates a new empty iCalendar with required properties.
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        let mut root = Component::calendar();
        root.add_property(Property::text("VERSION", kunai_core::constants::ICAL_VERSION));
        root.add_property(Property::text("PRODID", prodid));
        Self { root }
    }

    /// Returns the PRODID value.
    #[must_use]
    pub fn prodid(&self) -> Option<&str> {
        self.root.get_property("PRODID")?.as_text()
    }

    /// Returns the VERSION value.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root.get_property("VERSION")?.as_text()
    }

    /// Adds a VEVENT component.
    pub fn add_event(&mut self, event: Component) {
        self.root.add_child(event);
    }

    /// Adds a VTIMEZONE component.
    pub fn add_timezone(&mut self, tz: Component) {
        self.root.add_child(tz);
    }

    /// Returns all VEVENT components.
    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.root.events()
    }

    /// Returns all VTIMEZONE components.
    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.root.timezones()
    }
}

impl Default for ICalendar {
    fn default() -> Self {
        Self::new(kunai_core::constants::PRODID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_kind_parse() {
        assert_eq!(ComponentKind::parse("VEVENT"), ComponentKind::Event);
        assert_eq!(ComponentKind::parse("valarm"), ComponentKind::Alarm);
        assert_eq!(ComponentKind::parse("VTODO"), ComponentKind::Unknown);
    }

    #[test]
    fn icalendar_new() {
        let ical = ICalendar::new("-//Test//Test//EN");
        assert_eq!(ical.version(), Some("2.0"));
        assert_eq!(ical.prodid(), Some("-//Test//Test//EN"));
    }

    #[test]
    fn component_properties() {
        let mut event = Component::event();
        event.add_property(Property::text("UID", "test-uid-123"));
        event.add_property(Property::text("SUMMARY", "Test Event"));

        assert_eq!(event.uid(), Some("test-uid-123"));
        assert_eq!(event.summary(), Some("Test Event"));
    }

    #[test]
    fn icalendar_collects_events() {
        let mut ical = ICalendar::default();

        let mut event = Component::event();
        event.add_property(Property::text("UID", "event1"));
        ical.add_event(event);
        ical.add_timezone(Component::timezone());

        assert_eq!(ical.events().len(), 1);
        assert_eq!(ical.timezones().len(), 1);
    }
}
