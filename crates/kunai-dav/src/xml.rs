//! `WebDAV` XML bodies.
//!
//! Builds PROPFIND and REPORT request bodies and parses multistatus
//! responses using the `quick-xml` crate. Parsing works on local names
//! only; servers disagree on prefixes far too much to match on them.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Writer, escape::unescape};

use crate::error::{DavError, DavResult};

pub const NS_DAV: &str = "DAV:";
pub const NS_CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

/// PROPFIND body asking for the authenticated principal.
pub const PROPFIND_PRINCIPAL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:current-user-principal/>
  </D:prop>
</D:propfind>"#;

/// PROPFIND body asking a principal for its calendar home.
pub const PROPFIND_HOME_SET: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop>
    <C:calendar-home-set/>
  </D:prop>
</D:propfind>"#;

/// PROPFIND body listing collections under the calendar home.
pub const PROPFIND_CALENDARS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:displayname/>
    <D:resourcetype/>
  </D:prop>
</D:propfind>"#;

/// One `<response>` element of a multistatus body, flattened to the
/// properties this client cares about.
#[derive(Debug, Default, Clone)]
pub struct ResponseEntry {
    pub href: String,
    pub display_name: Option<String>,
    pub is_calendar: bool,
    pub principal: Option<String>,
    pub calendar_home: Option<String>,
    pub calendar_data: Option<String>,
}

/// Where the text of the `<href>` currently open belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HrefTarget {
    Response,
    Principal,
    CalendarHome,
}

/// ## Summary
/// Parses a multistatus response body into one entry per `<response>`.
///
/// ## Errors
/// Returns an error if the XML is malformed or not valid UTF-8.
#[expect(clippy::too_many_lines)]
pub fn parse_multistatus(xml: &[u8]) -> DavResult<Vec<ResponseEntry>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut text_buf = String::new();
    let mut entries: Vec<ResponseEntry> = Vec::new();
    let mut current: Option<ResponseEntry> = None;

    let mut in_principal = false;
    let mut in_home_set = false;
    let mut in_resourcetype = false;
    let mut in_href = false;
    let mut in_displayname = false;
    let mut in_calendar_data = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local_name_bytes = e.local_name();
                let local_name = std::str::from_utf8(local_name_bytes.as_ref())?;

                match local_name {
                    "response" => {
                        current = Some(ResponseEntry::default());
                    }
                    "href" => {
                        in_href = true;
                        text_buf.clear();
                    }
                    "current-user-principal" => in_principal = true,
                    "calendar-home-set" => in_home_set = true,
                    "resourcetype" => in_resourcetype = true,
                    "displayname" => {
                        in_displayname = true;
                        text_buf.clear();
                    }
                    "calendar-data" => {
                        in_calendar_data = true;
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let local_name_bytes = e.local_name();
                let local_name = std::str::from_utf8(local_name_bytes.as_ref())?;
                if local_name == "calendar" && in_resourcetype {
                    if let Some(entry) = current.as_mut() {
                        entry.is_calendar = true;
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_href || in_displayname || in_calendar_data {
                    let text = std::str::from_utf8(e.as_ref())?;
                    text_buf.push_str(&unescape(text)?);
                }
            }
            Ok(Event::CData(ref e)) => {
                if in_calendar_data {
                    text_buf.push_str(std::str::from_utf8(e.as_ref())?);
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name_bytes = e.local_name();
                let local_name = std::str::from_utf8(local_name_bytes.as_ref())?;

                match local_name {
                    "href" => {
                        in_href = false;
                        if let Some(entry) = current.as_mut() {
                            match href_target(in_principal, in_home_set) {
                                HrefTarget::Principal => {
                                    entry.principal = Some(text_buf.clone());
                                }
                                HrefTarget::CalendarHome => {
                                    entry.calendar_home = Some(text_buf.clone());
                                }
                                HrefTarget::Response if entry.href.is_empty() => {
                                    entry.href = text_buf.clone();
                                }
                                HrefTarget::Response => {}
                            }
                        }
                    }
                    "current-user-principal" => in_principal = false,
                    "calendar-home-set" => in_home_set = false,
                    "resourcetype" => in_resourcetype = false,
                    "displayname" => {
                        in_displayname = false;
                        if !text_buf.is_empty()
                            && let Some(entry) = current.as_mut()
                        {
                            entry.display_name = Some(text_buf.clone());
                        }
                    }
                    "calendar-data" => {
                        in_calendar_data = false;
                        if let Some(entry) = current.as_mut() {
                            entry.calendar_data = Some(text_buf.clone());
                        }
                    }
                    "response" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DavError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn href_target(in_principal: bool, in_home_set: bool) -> HrefTarget {
    if in_principal {
        HrefTarget::Principal
    } else if in_home_set {
        HrefTarget::CalendarHome
    } else {
        HrefTarget::Response
    }
}

/// ## Summary
/// Builds a calendar-query REPORT body matching a single event UID.
///
/// ## Errors
/// Returns an error if XML writing fails.
pub fn calendar_query_uid(uid: &str) -> DavResult<String> {
    write_calendar_query(|writer| {
        let mut prop_filter = BytesStart::new("C:prop-filter");
        prop_filter.push_attribute(("name", "UID"));
        writer.write_event(Event::Start(prop_filter))?;

        let mut text_match = BytesStart::new("C:text-match");
        text_match.push_attribute(("collation", "i;octet"));
        writer.write_event(Event::Start(text_match))?;
        writer.write_event(Event::Text(BytesText::new(uid)))?;
        writer.write_event(Event::End(BytesEnd::new("C:text-match")))?;

        writer.write_event(Event::End(BytesEnd::new("C:prop-filter")))?;
        Ok(())
    })
}

/// ## Summary
/// Builds a calendar-query REPORT body for events overlapping a UTC
/// window.
///
/// ## Errors
/// Returns an error if XML writing fails.
pub fn calendar_query_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> DavResult<String> {
    write_calendar_query(|writer| {
        let mut time_range = BytesStart::new("C:time-range");
        time_range.push_attribute(("start", caldav_utc(start).as_str()));
        time_range.push_attribute(("end", caldav_utc(end).as_str()));
        writer.write_event(Event::Empty(time_range))?;
        Ok(())
    })
}

/// Formats an instant the way CalDAV time-range attributes expect.
fn caldav_utc(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Writes the shared calendar-query frame, with `inner` filling the
/// VEVENT comp-filter.
fn write_calendar_query<F>(inner: F) -> DavResult<String>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> Result<(), quick_xml::Error>,
{
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("C:calendar-query");
    root.push_attribute(("xmlns:D", NS_DAV));
    root.push_attribute(("xmlns:C", NS_CALDAV));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
    writer.write_event(Event::Empty(BytesStart::new("D:getetag")))?;
    writer.write_event(Event::Empty(BytesStart::new("C:calendar-data")))?;
    writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

    writer.write_event(Event::Start(BytesStart::new("C:filter")))?;
    let mut vcalendar = BytesStart::new("C:comp-filter");
    vcalendar.push_attribute(("name", "VCALENDAR"));
    writer.write_event(Event::Start(vcalendar))?;
    let mut vevent = BytesStart::new("C:comp-filter");
    vevent.push_attribute(("name", "VEVENT"));
    writer.write_event(Event::Start(vevent))?;

    inner(&mut writer)?;

    writer.write_event(Event::End(BytesEnd::new("C:comp-filter")))?;
    writer.write_event(Event::End(BytesEnd::new("C:comp-filter")))?;
    writer.write_event(Event::End(BytesEnd::new("C:filter")))?;
    writer.write_event(Event::End(BytesEnd::new("C:calendar-query")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|error| DavError::Internal(format!("query body was not UTF-8: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PRINCIPAL_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/</D:href>
    <D:propstat>
      <D:prop>
        <D:current-user-principal>
          <D:href>/principals/users/alice/</D:href>
        </D:current-user-principal>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

    const CALENDAR_LIST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<multistatus xmlns="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <response>
    <href>/calendars/alice/</href>
    <propstat>
      <prop><resourcetype><collection/></resourcetype></prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/calendars/alice/work/</href>
    <propstat>
      <prop>
        <displayname>Work &amp; Travel</displayname>
        <resourcetype><collection/><cal:calendar/></resourcetype>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;

    const REPORT_RESPONSE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
<D:multistatus xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">\
<D:response><D:href>/calendars/alice/work/abc.ics</D:href>\
<D:propstat><D:prop>\
<C:calendar-data>BEGIN:VCALENDAR&#13;\nVERSION:2.0&#13;\nEND:VCALENDAR&#13;\n</C:calendar-data>\
</D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat>\
</D:response></D:multistatus>";

    #[test]
    fn extracts_principal_href() {
        let entries = parse_multistatus(PRINCIPAL_RESPONSE.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].href, "/");
        assert_eq!(
            entries[0].principal.as_deref(),
            Some("/principals/users/alice/")
        );
    }

    #[test]
    fn flags_calendar_collections_and_unescapes_names() {
        let entries = parse_multistatus(CALENDAR_LIST.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_calendar);
        assert!(entries[1].is_calendar);
        assert_eq!(entries[1].href, "/calendars/alice/work/");
        assert_eq!(entries[1].display_name.as_deref(), Some("Work & Travel"));
    }

    #[test_log::test]
    fn report_entry_carries_unescaped_calendar_data() {
        let entries = parse_multistatus(REPORT_RESPONSE.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        let ics = entries[0].calendar_data.as_deref().unwrap();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("VERSION:2.0\r\n"));
    }

    #[test]
    fn uid_query_escapes_the_uid() {
        let body = calendar_query_uid("a&b<c").unwrap();
        assert!(body.contains("<C:prop-filter name=\"UID\">"));
        assert!(body.contains("a&amp;b&lt;c"));
    }

    #[test]
    fn time_range_query_uses_basic_utc_format() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 4, 0, 0, 0).unwrap();
        let body = calendar_query_time_range(start, end).unwrap();
        assert!(body.contains("start=\"20260105T000000Z\""));
        assert!(body.contains("end=\"20260204T000000Z\""));
        assert!(body.contains("comp-filter name=\"VEVENT\""));
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        let result = parse_multistatus(b"<multistatus><response></wrong></multistatus>");
        assert!(result.is_err());
    }
}
