//! Error types for Somnia

use thiserror::Error;

/// Errors that can occur while fetching, aggregating, or uploading sleep data.
///
/// An empty fetch result or zero qualifying nights is never represented here;
/// those are legitimate outcomes and are reported through normal return values.
#[derive(Debug, Error)]
pub enum SleepError {
    #[error("Sleep data permission not granted: {0}")]
    PermissionDenied(String),

    #[error("Sleep data source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Failed to parse sample payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid manual entry: {0}")]
    InvalidManualEntry(String),

    #[error("Upload failed for {date}: {reason}")]
    UploadFailed { date: String, reason: String },
}
