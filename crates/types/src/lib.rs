//! Shared data types for the batch transcription connector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record of the input table. All fields are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRow {
    pub id: String,
    pub message_id: String,
    pub url: String,
}

/// Whether a row made it through both the download and the transcription call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Ok,
    Error,
}

/// One record of the output table. Exactly one of `transcript`/`error` is
/// non-empty, selected by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub id: String,
    pub message_id: String,
    pub url: String,
    pub status: RowStatus,
    pub transcript: String,
    pub error: String,
}

impl TranscriptResult {
    pub fn ok(row: InputRow, transcript: String) -> Self {
        Self {
            id: row.id,
            message_id: row.message_id,
            url: row.url,
            status: RowStatus::Ok,
            transcript,
            error: String::new(),
        }
    }

    pub fn failed(row: InputRow, error: impl ToString) -> Self {
        Self {
            id: row.id,
            message_id: row.message_id,
            url: row.url,
            status: RowStatus::Error,
            transcript: String::new(),
            error: error.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RowStatus::Ok
    }
}

/// Per-run counters appended to the stats table, keyed by `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub timestamp: DateTime<Utc>,
    pub rows_total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_seconds: f64,
}

/// Errors with a readable, operator-facing message. A `UserError` at row
/// level becomes an error-status result row; at run level it aborts the run
/// with exit code 1. Anything else is unexpected and exits with code 2.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("API token is missing! You must provide the transcription API token.")]
    MissingApiToken,
    #[error("There is no table in the input directory! You must provide one input table!")]
    NoInputTable,
    #[error("There is more than one table ({0}) in the input directory! You must provide one input table!")]
    MultipleInputTables(usize),
    #[error("Error reading input table: {0}")]
    InputTable(String),
    #[error("Error downloading audio file from URL: {0}")]
    Download(String),
    #[error("Error processing transcription API: {0}")]
    Transcription(String),
    #[error("Error writing output table: {0}")]
    OutputTable(String),
}
