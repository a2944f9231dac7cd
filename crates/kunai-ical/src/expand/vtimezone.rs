//! VTIMEZONE synthesis from the IANA database.
//!
//! Produces a minimal one-year VTIMEZONE component for a TZID so that
//! serialized calendar objects carry zone definitions for every zoned
//! date-time they reference.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::model::{Component, ComponentKind, DateTime, Property, UtcOffset, names};

/// ## Summary
/// Synthesizes a VTIMEZONE component covering the given year.
///
/// The zone's offsets are sampled in January and July. A zone with no
/// DST observance yields a single STANDARD block; an observing zone
/// yields a STANDARD and a DAYLIGHT block whose DTSTART values are the
/// local wall times of the year's transitions, found by bisecting the
/// offset change.
///
/// Returns `None` only if the year's dates cannot be represented.
#[must_use]
pub fn synthesize_vtimezone(tzid: &str, tz: Tz, year: u16) -> Option<Component> {
    let year_i32 = i32::from(year);
    let jan = NaiveDate::from_ymd_opt(year_i32, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let jul = NaiveDate::from_ymd_opt(year_i32, 7, 1)?.and_hms_opt(0, 0, 0)?;
    let next_jan = NaiveDate::from_ymd_opt(year_i32 + 1, 1, 1)?.and_hms_opt(0, 0, 0)?;

    let off_jan = offset_at(tz, jan);
    let off_jul = offset_at(tz, jul);

    let mut timezone = Component::timezone();
    timezone.add_property(Property::text(names::TZID, tzid));

    if off_jan == off_jul {
        // No observance this year: one fixed STANDARD block.
        let mut standard = Component::new(ComponentKind::Standard);
        standard.add_property(Property::datetime(
            names::DTSTART,
            floating_datetime(jan)?,
        ));
        standard.add_property(Property::utc_offset(
            names::TZOFFSETFROM,
            UtcOffset::from_seconds(off_jan),
        ));
        standard.add_property(Property::utc_offset(
            names::TZOFFSETTO,
            UtcOffset::from_seconds(off_jan),
        ));
        timezone.add_child(standard);
        return Some(timezone);
    }

    // One transition in each half-year; order depends on hemisphere.
    let first = find_transition(tz, jan, jul);
    let second = find_transition(tz, jul, next_jan);
    for transition in [first, second] {
        timezone.add_child(observance_block(tz, transition)?);
    }

    Some(timezone)
}

/// UTC offset in seconds east at a UTC instant.
fn offset_at(tz: Tz, utc: NaiveDateTime) -> i32 {
    tz.offset_from_utc_datetime(&utc).fix().local_minus_utc()
}

/// Bisects for the first UTC instant in `(lo, hi]` whose offset differs
/// from the offset at `lo`. Requires `offset_at(lo) != offset_at(hi)`.
fn find_transition(tz: Tz, mut lo: NaiveDateTime, mut hi: NaiveDateTime) -> NaiveDateTime {
    let lo_offset = offset_at(tz, lo);
    while hi - lo > chrono::Duration::seconds(1) {
        let mid = lo + (hi - lo) / 2;
        if offset_at(tz, mid) == lo_offset {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

/// Builds the STANDARD or DAYLIGHT block for a transition instant.
fn observance_block(tz: Tz, transition_utc: NaiveDateTime) -> Option<Component> {
    let from = offset_at(tz, transition_utc - chrono::Duration::seconds(1));
    let to = offset_at(tz, transition_utc);

    let kind = if to > from {
        ComponentKind::Daylight
    } else {
        ComponentKind::Standard
    };

    // DTSTART is the local wall time of the change, expressed in the
    // offset in effect before it (RFC 5545 §3.6.5).
    let local = transition_utc + chrono::Duration::seconds(i64::from(from));

    let mut block = Component::new(kind);
    block.add_property(Property::datetime(names::DTSTART, floating_datetime(local)?));
    block.add_property(Property::utc_offset(
        names::TZOFFSETFROM,
        UtcOffset::from_seconds(from),
    ));
    block.add_property(Property::utc_offset(
        names::TZOFFSETTO,
        UtcOffset::from_seconds(to),
    ));
    Some(block)
}

fn floating_datetime(naive: NaiveDateTime) -> Option<DateTime> {
    Some(DateTime::floating(
        u16::try_from(naive.year()).ok()?,
        u8::try_from(naive.month()).ok()?,
        u8::try_from(naive.day()).ok()?,
        u8::try_from(naive.hour()).ok()?,
        u8::try_from(naive.minute()).ok()?,
        u8::try_from(naive.second()).ok()?,
    ))
}
