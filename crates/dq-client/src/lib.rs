//! Remote backend access for the data dashboard
//!
//! The row store and aggregation backend live behind the [`DataBackend`]
//! trait; [`HttpBackend`] is the production implementation over HTTP.

pub mod backend;
pub mod http;
pub mod types;

use thiserror::Error;

// Re-exports
pub use backend::DataBackend;
pub use http::{CredentialStore, HttpBackend};
pub use types::{
    AggregateRequest, AggregateResponse, FileList, FileSummary, MetricSpec, Record, RowPage,
    UploadResponse,
};

/// Errors reported by the remote backend.
///
/// The variants drive retry and invalidation behavior: `Transient` queries
/// are safe to re-issue, `NotFound` stops all further queries for the
/// dataset, `Auth` clears the stored credential and is never retried, and
/// `Validation` is surfaced as-is.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transient backend error: {0}")]
    Transient(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication rejected")]
    Auth,

    #[error("invalid request: {0}")]
    Validation(String),
}

impl ApiError {
    /// Map an HTTP status and error body onto the error taxonomy.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Auth,
            404 => ApiError::NotFound(body),
            500..=599 => ApiError::Transient(format!("server error ({status}): {body}")),
            _ => ApiError::Validation(format!("request rejected ({status}): {body}")),
        }
    }

    /// Whether re-issuing the same logical query may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }
}
