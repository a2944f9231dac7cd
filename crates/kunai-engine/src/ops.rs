//! Caller-facing operations, tying codec, patch engine, alarm reconciler
//! and locator together over a [`CalendarStore`].

use chrono::{DateTime, Utc};

use crate::alarm::{self, AddOutcome, AlarmSpec, AlarmView, MatchBy, RemoveBy, ReplaceOutcome};
use crate::codec;
use crate::error::EngineResult;
use crate::event::{EventTime, StructuredEvent};
use crate::locator::EventSelector;
use crate::patch::{EventPatch, NewEvent, apply_patch, create_event};
use crate::store::{CalendarStore, CollectionRef, EventRef, FetchedEvent, StoreError};
use crate::time::default_window;

/// Result of a listing: decoded events plus the count of resources that
/// failed to decode and were skipped (never silently).
#[derive(Debug)]
pub struct EventListing {
    pub events: Vec<StructuredEvent>,
    pub skipped: usize,
}

/// Operations bound to one resolved calendar collection.
pub struct CalendarOps<S> {
    store: S,
    collection: CollectionRef,
}

impl<S: CalendarStore> CalendarOps<S> {
    /// ## Summary
    /// Resolves the target collection and binds operations to it.
    ///
    /// ## Errors
    /// Fails when the selector matches no collection.
    pub async fn open(store: S, selector: Option<&str>) -> EngineResult<Self> {
        let collection = store.resolve_collection(selector).await?;
        tracing::debug!(href = %collection.href, "bound to collection");
        Ok(Self { store, collection })
    }

    /// The collection operations are bound to.
    #[must_use]
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// ## Summary
    /// Lists an event's alarms with normalized trigger offsets.
    ///
    /// ## Errors
    /// Fails when the event cannot be located or decoded.
    #[tracing::instrument(skip(self))]
    pub async fn list_alarms(&self, selector: &EventSelector) -> EngineResult<Vec<AlarmView>> {
        let (_, event) = self.load(selector).await?;
        Ok(alarm::list_alarms(&event))
    }

    /// ## Summary
    /// Adds an alarm to an event and saves the result.
    ///
    /// A dedupe skip saves nothing and leaves the remote resource
    /// untouched.
    ///
    /// ## Errors
    /// Fails on locate, decode, or save failure.
    #[tracing::instrument(skip(self, spec))]
    pub async fn add_alarm(
        &self,
        selector: &EventSelector,
        spec: &AlarmSpec,
        dedupe: bool,
    ) -> EngineResult<AddOutcome> {
        let (event_ref, event) = self.load(selector).await?;
        let (updated, outcome) = alarm::add_alarm(&event, spec, dedupe);
        if matches!(outcome, AddOutcome::Added { .. }) {
            self.persist(&event_ref, &updated).await?;
        }
        Ok(outcome)
    }

    /// ## Summary
    /// Replaces the first matching alarm (or appends when nothing
    /// matches) and saves the result.
    ///
    /// ## Errors
    /// Fails on locate, decode, or save failure.
    #[tracing::instrument(skip(self, spec))]
    pub async fn replace_alarm(
        &self,
        selector: &EventSelector,
        match_by: &MatchBy,
        spec: &AlarmSpec,
    ) -> EngineResult<ReplaceOutcome> {
        let (event_ref, event) = self.load(selector).await?;
        let (updated, outcome) = alarm::replace_alarm(&event, match_by, spec);
        self.persist(&event_ref, &updated).await?;
        Ok(outcome)
    }

    /// ## Summary
    /// Removes matching alarms and saves when anything was removed.
    ///
    /// Returns the removed count; zero is a quiet success.
    ///
    /// ## Errors
    /// Fails on locate, decode, or save failure.
    #[tracing::instrument(skip(self))]
    pub async fn remove_alarms(
        &self,
        selector: &EventSelector,
        by: &RemoveBy,
    ) -> EngineResult<usize> {
        let (event_ref, event) = self.load(selector).await?;
        let (updated, removed) = alarm::remove_alarms(&event, by);
        if removed > 0 {
            self.persist(&event_ref, &updated).await?;
        }
        Ok(removed)
    }

    /// ## Summary
    /// Creates a new event in the bound collection.
    ///
    /// ## Errors
    /// Fails on validation of the supplied fields or on save failure.
    #[tracing::instrument(skip(self, fields))]
    pub async fn create_event(&self, fields: &NewEvent) -> EngineResult<StructuredEvent> {
        let event = create_event(fields)?;
        let event_ref = self.event_ref_for(&event.uid);
        self.persist(&event_ref, &event).await?;
        Ok(event)
    }

    /// ## Summary
    /// Applies a partial patch to an event and saves the result.
    ///
    /// An empty patch is a read: the original comes back and nothing is
    /// written.
    ///
    /// ## Errors
    /// Fails on locate, decode, validation, or save failure.
    #[tracing::instrument(skip(self, patch))]
    pub async fn patch_event(
        &self,
        selector: &EventSelector,
        patch: &EventPatch,
    ) -> EngineResult<StructuredEvent> {
        let (event_ref, event) = self.load(selector).await?;
        if patch.is_empty() {
            return Ok(event);
        }
        let updated = apply_patch(&event, patch)?;
        self.persist(&event_ref, &updated).await?;
        Ok(updated)
    }

    /// ## Summary
    /// Deletes an event resource.
    ///
    /// ## Errors
    /// Fails when the event cannot be located or the delete fails
    /// upstream.
    #[tracing::instrument(skip(self))]
    pub async fn delete_event(&self, selector: &EventSelector) -> EngineResult<()> {
        let (event_ref, _) = self.load(selector).await?;
        self.store.delete_event(&event_ref).await?;
        Ok(())
    }

    /// ## Summary
    /// Lists events in a window, decoded and sorted by start.
    ///
    /// `window` defaults to one week back through thirty days forward.
    /// Resources that fail to decode are skipped with a warning and
    /// counted in the listing.
    ///
    /// ## Errors
    /// Fails when the search itself fails upstream.
    #[tracing::instrument(skip(self))]
    pub async fn list_events(
        &self,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
        limit: Option<usize>,
    ) -> EngineResult<EventListing> {
        let (start, end) = window.unwrap_or_else(|| default_window(Utc::now()));
        let fetched = self.store.search_events(&self.collection, start, end).await?;

        let mut events = Vec::with_capacity(fetched.len());
        let mut skipped = 0;
        for item in fetched {
            match codec::decode(&item.ics) {
                Ok(event) => events.push(event),
                Err(error) => {
                    tracing::warn!(href = %item.event_ref.href, %error, "skipping undecodable event");
                    skipped += 1;
                }
            }
        }

        // Events without a start sort last; summary breaks ties.
        events.sort_by_key(|event| {
            let instant = event.start.as_ref().and_then(EventTime::as_utc);
            (instant.is_none(), instant, event.summary.clone())
        });
        if let Some(limit) = limit {
            events.truncate(limit);
        }

        Ok(EventListing { events, skipped })
    }

    async fn load(&self, selector: &EventSelector) -> EngineResult<(EventRef, StructuredEvent)> {
        let fetched = self.fetch(selector).await?;
        let event = codec::decode(&fetched.ics)?;
        Ok((fetched.event_ref, event))
    }

    /// Resolution order: a supplied UID wins; an address is tried
    /// directly, then via the derived-UID heuristic.
    async fn fetch(&self, selector: &EventSelector) -> EngineResult<FetchedEvent> {
        if selector.uid.is_some() {
            let uid = selector.resolve_uid()?;
            return Ok(self.store.fetch_by_uid(&self.collection, &uid).await?);
        }

        if let Some(address) = &selector.address {
            match self.store.fetch_by_href(address).await {
                Ok(fetched) => return Ok(fetched),
                Err(StoreError::NotFound(_)) => {
                    let uid = selector.resolve_uid()?;
                    return Ok(self.store.fetch_by_uid(&self.collection, &uid).await?);
                }
                Err(error) => return Err(error.into()),
            }
        }

        // Neither uid nor address: surface the locator's validation error.
        let uid = selector.resolve_uid()?;
        Ok(self.store.fetch_by_uid(&self.collection, &uid).await?)
    }

    async fn persist(&self, event_ref: &EventRef, event: &StructuredEvent) -> EngineResult<()> {
        self.store.save_event(event_ref, &codec::encode(event)).await?;
        Ok(())
    }

    fn event_ref_for(&self, uid: &str) -> EventRef {
        let base = self.collection.href.trim_end_matches('/');
        EventRef {
            href: format!("{base}/{uid}.ics"),
        }
    }
}
