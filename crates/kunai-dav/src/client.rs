//! CalDAV HTTP client.
//!
//! Discovery follows RFC 6764 order: the authenticated principal via
//! PROPFIND on the service root, the principal's calendar home, then the
//! calendar collections under it. Event access goes through calendar-query
//! REPORTs, direct GETs, PUT, and DELETE.

use chrono::{DateTime, Utc};
use kunai_core::config::StoreConfig;
use kunai_engine::store::{CalendarStore, CollectionRef, EventRef, FetchedEvent, StoreError};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::error::{DavError, DavResult};
use crate::xml::{self, ResponseEntry};

const METHOD_PROPFIND: &str = "PROPFIND";
const METHOD_REPORT: &str = "REPORT";
const CONTENT_TYPE_XML: &str = "application/xml; charset=utf-8";
const CONTENT_TYPE_ICS: &str = "text/calendar; charset=utf-8";

pub struct CalDavClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
}

impl CalDavClient {
    /// ## Summary
    /// Builds a client for one CalDAV endpoint.
    ///
    /// ## Errors
    /// Fails when the configured URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &StoreConfig) -> DavResult<Self> {
        let base = Url::parse(&config.url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("kunai/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// ## Summary
    /// Discovers the calendar collections available to the configured
    /// account.
    ///
    /// ## Errors
    /// Fails when any discovery step fails or the server advertises no
    /// principal or calendar home.
    #[tracing::instrument(skip(self))]
    pub async fn discover_calendars(&self) -> DavResult<Vec<CollectionRef>> {
        let root = self.base.clone();
        let entries = self.propfind(root, "0", xml::PROPFIND_PRINCIPAL).await?;
        let principal = first_some(&entries, |e| e.principal.clone())
            .ok_or_else(|| DavError::Discovery("server reported no current-user-principal".into()))?;
        tracing::debug!(%principal, "resolved principal");

        let principal_url = self.base.join(&principal)?;
        let entries = self.propfind(principal_url, "0", xml::PROPFIND_HOME_SET).await?;
        let home = first_some(&entries, |e| e.calendar_home.clone())
            .ok_or_else(|| DavError::Discovery("principal has no calendar-home-set".into()))?;
        tracing::debug!(%home, "resolved calendar home");

        let home_url = self.base.join(&home)?;
        let entries = self.propfind(home_url, "1", xml::PROPFIND_CALENDARS).await?;
        let calendars: Vec<CollectionRef> = entries
            .into_iter()
            .filter(|entry| entry.is_calendar)
            .map(|entry| CollectionRef {
                href: entry.href,
                display_name: entry.display_name,
            })
            .collect();
        tracing::debug!(count = calendars.len(), "discovered calendars");
        Ok(calendars)
    }

    async fn find_collection(&self, selector: Option<&str>) -> DavResult<CollectionRef> {
        let calendars = self.discover_calendars().await?;
        match selector {
            None => calendars
                .into_iter()
                .next()
                .ok_or_else(|| DavError::Discovery("account has no calendars".into())),
            Some(wanted) => calendars
                .into_iter()
                .find(|c| {
                    c.href == wanted
                        || c.display_name
                            .as_deref()
                            .is_some_and(|name| name.eq_ignore_ascii_case(wanted))
                })
                .ok_or_else(|| DavError::NotFound(format!("no calendar named {wanted}"))),
        }
    }

    async fn report(&self, collection: &CollectionRef, body: String) -> DavResult<Vec<FetchedEvent>> {
        let url = self.base.join(&collection.href)?;
        let text = self
            .xml_request(method(METHOD_REPORT)?, url, "1", body)
            .await?;
        let entries = xml::parse_multistatus(text.as_bytes())?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                entry.calendar_data.map(|ics| FetchedEvent {
                    event_ref: EventRef { href: entry.href },
                    ics,
                })
            })
            .collect())
    }

    async fn get(&self, href: &str) -> DavResult<FetchedEvent> {
        let url = self.base.join(href)?;
        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "text/calendar")
            .send()
            .await?;
        let response = check_status("GET", &url, response)?;
        Ok(FetchedEvent {
            event_ref: EventRef {
                href: href.to_string(),
            },
            ics: response.text().await?,
        })
    }

    async fn put(&self, event_ref: &EventRef, ics: &str) -> DavResult<()> {
        let url = self.base.join(&event_ref.href)?;
        let response = self
            .http
            .put(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", CONTENT_TYPE_ICS)
            .body(ics.to_string())
            .send()
            .await?;
        check_status("PUT", &url, response)?;
        Ok(())
    }

    async fn delete(&self, event_ref: &EventRef) -> DavResult<()> {
        let url = self.base.join(&event_ref.href)?;
        let response = self
            .http
            .delete(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        check_status("DELETE", &url, response)?;
        Ok(())
    }

    async fn propfind(&self, url: Url, depth: &str, body: &str) -> DavResult<Vec<ResponseEntry>> {
        let text = self
            .xml_request(method(METHOD_PROPFIND)?, url, depth, body.to_string())
            .await?;
        xml::parse_multistatus(text.as_bytes())
    }

    async fn xml_request(
        &self,
        method: Method,
        url: Url,
        depth: &str,
        body: String,
    ) -> DavResult<String> {
        let name = method.to_string();
        let response = self
            .http
            .request(method, url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header("Depth", depth)
            .header("Content-Type", CONTENT_TYPE_XML)
            .body(body)
            .send()
            .await?;
        let response = check_status(&name, &url, response)?;
        Ok(response.text().await?)
    }
}

fn method(name: &str) -> DavResult<Method> {
    Method::from_bytes(name.as_bytes())
        .map_err(|error| DavError::Internal(format!("invalid method {name}: {error}")))
}

fn first_some<T>(entries: &[ResponseEntry], pick: impl Fn(&ResponseEntry) -> Option<T>) -> Option<T> {
    entries.iter().find_map(pick)
}

fn check_status(
    method: &str,
    url: &Url,
    response: reqwest::Response,
) -> DavResult<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(DavError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(DavError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status,
        });
    }
    Ok(response)
}

impl CalendarStore for CalDavClient {
    async fn resolve_collection(&self, selector: Option<&str>) -> Result<CollectionRef, StoreError> {
        Ok(self.find_collection(selector).await?)
    }

    async fn fetch_by_uid(
        &self,
        collection: &CollectionRef,
        uid: &str,
    ) -> Result<FetchedEvent, StoreError> {
        let body = xml::calendar_query_uid(uid).map_err(StoreError::from)?;
        let mut events = self.report(collection, body).await?;
        if events.is_empty() {
            return Err(StoreError::NotFound(format!("no event with uid {uid}")));
        }
        Ok(events.swap_remove(0))
    }

    async fn fetch_by_href(&self, href: &str) -> Result<FetchedEvent, StoreError> {
        Ok(self.get(href).await?)
    }

    async fn save_event(&self, event_ref: &EventRef, ics: &str) -> Result<(), StoreError> {
        self.put(event_ref, ics)
            .await
            .map_err(|error| StoreError::Save(error.to_string()))
    }

    async fn delete_event(&self, event_ref: &EventRef) -> Result<(), StoreError> {
        Ok(self.delete(event_ref).await?)
    }

    async fn search_events(
        &self,
        collection: &CollectionRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FetchedEvent>, StoreError> {
        let body = xml::calendar_query_time_range(start, end).map_err(StoreError::from)?;
        Ok(self.report(collection, body).await?)
    }
}
