//! Remote store interface.
//!
//! The engine never speaks the network protocol itself; it consumes this
//! trait, which the `kunai-dav` crate implements over CalDAV and tests
//! implement in memory.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Transport-layer failure. These originate outside the engine and pass
/// through unmodified; retry policy, if any, lives in the implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Save failed: {0}")]
    Save(String),
}

/// A calendar collection on the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    /// Collection href, with trailing slash.
    pub href: String,
    pub display_name: Option<String>,
}

/// One event resource on the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRef {
    /// Resource href.
    pub href: String,
}

/// Raw event bytes paired with the resource they came from.
#[derive(Debug, Clone)]
pub struct FetchedEvent {
    pub event_ref: EventRef,
    pub ics: String,
}

/// Calendar store operations the engine consumes.
pub trait CalendarStore {
    /// Resolves a collection by display name or href; an absent selector
    /// means the store's primary collection.
    fn resolve_collection(
        &self,
        selector: Option<&str>,
    ) -> impl Future<Output = Result<CollectionRef, StoreError>>;

    /// Fetches the event with the given UID from a collection.
    fn fetch_by_uid(
        &self,
        collection: &CollectionRef,
        uid: &str,
    ) -> impl Future<Output = Result<FetchedEvent, StoreError>>;

    /// Fetches an event resource directly by href.
    fn fetch_by_href(&self, href: &str) -> impl Future<Output = Result<FetchedEvent, StoreError>>;

    /// Writes event bytes to a resource, creating or overwriting it.
    fn save_event(
        &self,
        event_ref: &EventRef,
        ics: &str,
    ) -> impl Future<Output = Result<(), StoreError>>;

    /// Deletes an event resource.
    fn delete_event(&self, event_ref: &EventRef) -> impl Future<Output = Result<(), StoreError>>;

    /// Returns raw bytes for every event overlapping the window.
    fn search_events(
        &self,
        collection: &CollectionRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<FetchedEvent>, StoreError>>;
}
