//! Shared foundation for the Kunai CalDAV client: configuration loading
//! and cross-crate constants.

pub mod config;
pub mod constants;
