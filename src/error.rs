//! Error taxonomy for the translation-memory engine.
//!
//! Every library operation returns [`TmError`]. The variants separate the
//! failure classes callers need to treat differently:
//!
//! | Variant | Raised by | Propagation |
//! |---------|-----------|-------------|
//! | [`TmError::TransientWrite`] | single-document upsert | reported in a [`WriteOutcome`](crate::writer::WriteOutcome), never raised |
//! | [`TmError::SearchUnavailable`] | search | always propagated |
//! | [`TmError::Schema`] | any backend response decoding | propagated |
//! | [`TmError::MalformedFile`] | TMX parsing | aborts the import before any write |
//! | [`TmError::BulkWrite`] | bulk upsert | aborts remaining batches |
//! | [`TmError::NoResults`] | scoring | propagated |
//! | [`TmError::UnknownLanguage`] | language resolution | propagated |
//!
//! The CLI wraps these in `anyhow` for reporting.

use thiserror::Error;

use crate::backend::TransportError;

/// Errors produced by the translation-memory engine.
#[derive(Debug, Error)]
pub enum TmError {
    /// A best-effort write (single upsert) could not reach the backend.
    #[error("index update failed: {0}")]
    TransientWrite(#[source] TransportError),

    /// A search request failed at the transport or HTTP level.
    #[error("search backend unavailable: {0}")]
    SearchUnavailable(#[source] TransportError),

    /// The backend answered with a payload that does not match the expected schema.
    #[error("invalid backend schema: {0}")]
    Schema(String),

    /// A translation-exchange file could not be parsed.
    #[error("malformed TMX file: {0}")]
    MalformedFile(String),

    /// A bulk batch failed. Batches before `batch` remain committed.
    #[error("bulk batch {batch} failed after {committed} committed batch(es): {reason}")]
    BulkWrite {
        /// Zero-based index of the failing batch.
        batch: usize,
        /// Number of batches already committed.
        committed: usize,
        /// Backend or transport failure description.
        reason: String,
    },

    /// A bulk upload was cancelled between batches.
    #[error("bulk upload cancelled after {committed} committed batch(es)")]
    Cancelled {
        /// Number of batches already committed.
        committed: usize,
    },

    /// Scoring was asked to rank an empty result set.
    #[error("no results to score")]
    NoResults,

    /// The maximum raw score cannot anchor a ratio (zero, negative or NaN).
    #[error("cannot normalize scores against maximum raw score {0}")]
    InvalidScore(f64),

    /// A language code matched neither the override map nor the registry.
    #[error("unknown language code: '{0}'")]
    UnknownLanguage(String),

    /// A maintenance request (delete, count, origins) failed.
    #[error("backend request failed: {0}")]
    Backend(#[source] TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, TmError>;

impl TmError {
    /// Returns `true` if the error came from a backend response shape mismatch.
    pub fn is_schema(&self) -> bool {
        matches!(self, TmError::Schema(_))
    }
}
