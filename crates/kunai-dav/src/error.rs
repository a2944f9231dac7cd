//! CalDAV transport errors.

use kunai_engine::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DavError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}")]
    Status {
        method: String,
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DavResult<T> = std::result::Result<T, DavError>;

impl From<quick_xml::Error> for DavError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for DavError {
    fn from(error: quick_xml::escape::EscapeError) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<DavError> for StoreError {
    fn from(error: DavError) -> Self {
        match error {
            DavError::NotFound(what) => StoreError::NotFound(what),
            DavError::Status { status, url, .. } if status == reqwest::StatusCode::NOT_FOUND => {
                StoreError::NotFound(url)
            }
            other => StoreError::Upstream(other.to_string()),
        }
    }
}
