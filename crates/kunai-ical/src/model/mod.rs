//! iCalendar core models (RFC 5545).
//!
//! These types are designed for:
//! - Round-trip fidelity: preserving unknown properties and parameters
//! - Deterministic serialization: stable output for identical input
//! - Type safety for the handful of value kinds the engine interprets

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod value;

pub use component::{Component, ComponentKind, ICalendar};
pub use datetime::{DateTime, DateTimeForm, Time, UtcOffset};
pub use duration::Duration;
pub use parameter::Parameter;
pub use property::{ContentLine, Property, names};
pub use value::{Date, Value};
