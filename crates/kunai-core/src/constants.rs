/// Product name used in generated identifiers.
pub const PRODUCT_NAME: &str = "Kunai";

/// PRODID emitted in every generated VCALENDAR.
pub const PRODID: &str = const_str::concat!(
    "-//",
    PRODUCT_NAME,
    "//",
    PRODUCT_NAME,
    " CalDAV Client//EN"
);

/// iCalendar format version emitted by the serializer.
pub const ICAL_VERSION: &str = "2.0";

/// Domain suffix appended to synthesized event UIDs.
pub const UID_DOMAIN: &str = "kunai-caldav";

/// Generates a fresh event UID in the `uuid@domain` form.
#[must_use]
pub fn new_event_uid() -> String {
    format!("{}@{UID_DOMAIN}", uuid::Uuid::new_v4())
}

/// Generates a fresh alarm UID (bare UUID, mirrored into the vendor UID).
#[must_use]
pub fn new_alarm_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}
