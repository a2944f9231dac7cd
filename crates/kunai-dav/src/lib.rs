//! CalDAV transport for the Kunai engine.
//!
//! Implements [`kunai_engine::store::CalendarStore`] over HTTP: principal
//! and calendar discovery via PROPFIND, event retrieval via REPORT and
//! GET, and writes via PUT and DELETE.

pub mod client;
pub mod error;
pub mod xml;

pub use client::CalDavClient;
pub use error::{DavError, DavResult};
