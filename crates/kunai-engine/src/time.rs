//! Caller-facing date/time normalization.
//!
//! Callers supply dates as `YYYY-MM-DD` (all-day) or timestamps in ISO
//! 8601 form, optionally qualified by a named timezone. Both normalize to
//! an [`EventTime`]; rendering goes back to the same canonical strings.

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use kunai_ical::expand::TimeZoneResolver;

use crate::error::{EngineError, EngineResult};
use crate::event::EventTime;

/// Days before now covered by the default listing window.
pub const DEFAULT_WINDOW_PAST_DAYS: i64 = 7;
/// Days after now covered by the default listing window.
pub const DEFAULT_WINDOW_FUTURE_DAYS: i64 = 30;

/// ## Summary
/// Parses caller-supplied date/time text into an [`EventTime`].
///
/// Exactly ten characters of `YYYY-MM-DD` yield a calendar date. Anything
/// else must be an ISO 8601 timestamp: a trailing `Z` or explicit offset
/// is honored as-is; an offset-less timestamp is interpreted in `zone`
/// when given, otherwise as UTC.
///
/// ## Errors
/// Returns a validation error carrying the original text if it matches
/// neither form, if `zone` is unknown, or if the local time falls in a
/// DST gap.
pub fn parse_event_time(text: &str, zone: Option<&str>) -> EngineResult<EventTime> {
    let text = text.trim();

    if text.len() == 10 {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| EngineError::Validation(format!("invalid date: {text}")))?;
        return Ok(EventTime::Date(date));
    }

    // Offset-qualified timestamps stand on their own.
    if let Ok(at) = DateTime::<FixedOffset>::parse_from_rfc3339(text) {
        return Ok(EventTime::Instant { at, tzid: None });
    }

    let naive = parse_naive(text)
        .ok_or_else(|| EngineError::Validation(format!("invalid date/time: {text}")))?;

    match zone {
        Some(tzid) => zoned_instant(naive, tzid),
        None => Ok(EventTime::Instant {
            at: Utc.from_utc_datetime(&naive).fixed_offset(),
            tzid: None,
        }),
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive);
        }
    }
    None
}

fn zoned_instant(naive: NaiveDateTime, tzid: &str) -> EngineResult<EventTime> {
    Ok(EventTime::Instant {
        at: zoned_fixed(naive, tzid)?,
        tzid: Some(tzid.to_string()),
    })
}

fn zoned_fixed(naive: NaiveDateTime, tzid: &str) -> EngineResult<DateTime<FixedOffset>> {
    let mut resolver = TimeZoneResolver::new();
    let tz = resolver
        .resolve(tzid)
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        // DST fold: first occurrence wins.
        LocalResult::Ambiguous(first, _) => Ok(first.fixed_offset()),
        LocalResult::None => Err(EngineError::Validation(format!(
            "non-existent local time {naive} in {tzid}"
        ))),
    }
}

/// Renders an [`EventTime`] back to its canonical string form.
#[must_use]
pub fn render_event_time(time: &EventTime) -> String {
    match time {
        EventTime::Date(date) => date.format("%Y-%m-%d").to_string(),
        EventTime::Instant { at, .. } => at.to_rfc3339(),
    }
}

/// ## Summary
/// Resolves an [`EventTime`] to the concrete instant used for search
/// windows: instants convert directly, calendar dates become midnight in
/// `zone` (UTC when absent).
///
/// ## Errors
/// Returns a validation error when `zone` is unknown or midnight does not
/// exist in it on that date.
pub fn window_instant(time: &EventTime, zone: Option<&str>) -> EngineResult<DateTime<Utc>> {
    match time {
        EventTime::Instant { at, .. } => Ok(at.with_timezone(&Utc)),
        EventTime::Date(date) => {
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| EngineError::Validation(format!("invalid date: {date}")))?;
            match zone {
                None => Ok(Utc.from_utc_datetime(&midnight)),
                Some(tzid) => Ok(zoned_fixed(midnight, tzid)?.with_timezone(&Utc)),
            }
        }
    }
}

/// The default listing window around `now`: one week back, thirty days
/// forward.
#[must_use]
pub fn default_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        now - Duration::days(DEFAULT_WINDOW_PAST_DAYS),
        now + Duration::days(DEFAULT_WINDOW_FUTURE_DAYS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_character_input_is_a_date() {
        let parsed = parse_event_time("2024-03-01", None).unwrap();
        assert!(parsed.is_all_day());
        assert_eq!(render_event_time(&parsed), "2024-03-01");
    }

    #[test]
    fn utc_midnight_is_an_instant() {
        let parsed = parse_event_time("2024-03-01T00:00:00Z", None).unwrap();
        assert!(!parsed.is_all_day());
        assert_eq!(render_event_time(&parsed), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn explicit_offset_is_honored() {
        let parsed = parse_event_time("2024-03-01T09:00:00+05:30", None).unwrap();
        let EventTime::Instant { at, tzid } = parsed else {
            panic!("expected instant");
        };
        assert_eq!(at.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(tzid, None);
    }

    #[test]
    fn offsetless_timestamp_uses_zone() {
        let parsed = parse_event_time("2026-01-15T10:00:00", Some("America/New_York")).unwrap();
        let EventTime::Instant { at, tzid } = parsed else {
            panic!("expected instant");
        };
        assert_eq!(tzid.as_deref(), Some("America/New_York"));
        // EST in January
        assert_eq!(at.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(
            at.with_timezone(&Utc).to_rfc3339(),
            "2026-01-15T15:00:00+00:00"
        );
    }

    #[test]
    fn offsetless_timestamp_defaults_to_utc() {
        let parsed = parse_event_time("2026-01-15T10:00:00", None).unwrap();
        let EventTime::Instant { at, .. } = parsed else {
            panic!("expected instant");
        };
        assert_eq!(at.to_rfc3339(), "2026-01-15T10:00:00+00:00");
    }

    #[test]
    fn malformed_input_is_rejected_with_text() {
        let err = parse_event_time("next tuesday", None).unwrap_err();
        assert!(matches!(err, EngineError::Validation(ref msg) if msg.contains("next tuesday")));

        assert!(parse_event_time("2024-13-99", None).is_err());
        assert!(parse_event_time("", None).is_err());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        assert!(parse_event_time("2026-01-15T10:00:00", Some("Not/AZone")).is_err());
    }

    #[test]
    fn window_instant_resolves_dates_to_zone_midnight() {
        let date = EventTime::Date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        let utc_midnight = window_instant(&date, None).unwrap();
        assert_eq!(utc_midnight.to_rfc3339(), "2026-01-15T00:00:00+00:00");

        // Midnight in New York is 05:00 UTC in January.
        let ny_midnight = window_instant(&date, Some("America/New_York")).unwrap();
        assert_eq!(ny_midnight.to_rfc3339(), "2026-01-15T05:00:00+00:00");
    }

    #[test]
    fn window_instant_passes_instants_through() {
        let instant = parse_event_time("2026-01-15T10:00:00+02:00", None).unwrap();
        let at = window_instant(&instant, Some("America/New_York")).unwrap();
        assert_eq!(at.to_rfc3339(), "2026-01-15T08:00:00+00:00");
    }

    #[test]
    fn default_window_spans_37_days() {
        let now = Utc::now();
        let (start, end) = default_window(now);
        assert_eq!(end - start, Duration::days(37));
        assert!(start < now && now < end);
    }
}
