//! Event codec and patch/alarm reconciliation engine.
//!
//! This crate turns raw iCalendar bytes into a [`event::StructuredEvent`],
//! applies partial patches that preserve every field the caller did not
//! touch, reconciles the alarm set under add/replace/remove, and encodes
//! the result back to bytes with the revision counter bumped. The remote
//! CalDAV store is reached through the [`store::CalendarStore`] trait;
//! [`ops::CalendarOps`] ties the pieces together per operation.

pub mod alarm;
pub mod codec;
pub mod error;
pub mod event;
pub mod locator;
pub mod ops;
pub mod patch;
pub mod store;
pub mod time;

pub use error::{EngineError, EngineResult};

#[cfg(test)]
mod tests;
