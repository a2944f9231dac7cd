//! Engine error taxonomy.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the event engine.
///
/// Transport failures pass through unmodified; the engine performs no
/// retries of its own.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected input: malformed date/time, all-day length mismatch,
    /// missing identifying reference, or a kind-changing patch.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Collection, event, or matched alarm is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The codec could not recover a structured event from the bytes.
    #[error("No parseable event component in calendar data")]
    MissingEvent,

    #[error(transparent)]
    Parse(#[from] kunai_ical::parse::ParseError),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
