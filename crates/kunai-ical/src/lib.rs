//! iCalendar text layer (RFC 5545) for the Kunai CalDAV client.
//!
//! This crate covers exactly what the event engine needs from the wire
//! format: a lossless component/property model, a lenient parser, a
//! deterministic serializer, and timezone resolution/synthesis. It is not
//! a general-purpose iCalendar validator; recurrence rules are carried as
//! opaque text and never interpreted.

pub mod build;
pub mod expand;
pub mod model;
pub mod parse;

#[cfg(test)]
mod tests;
