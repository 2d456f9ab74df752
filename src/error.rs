//! Error types for the contact2html library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ProfileError`] — **Fatal**: nothing can be generated at all
//!   (endpoint unreachable, malformed JSON, another batch already running).
//!   Returned as `Err(ProfileError)` from the top-level entry points.
//!
//! * [`RecordError`] — **Non-fatal**: a single record failed (no name,
//!   browser crashed, write failed) but every other record is fine. Stored
//!   inside [`crate::output::RecordOutcome`] and accumulated into
//!   [`crate::output::BatchSummary::errors`] so one bad row never stops the
//!   batch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the contact2html library.
///
/// Record-level failures use [`RecordError`] and are accumulated in the
/// batch summary rather than propagated here.
#[derive(Debug, Error)]
pub enum ProfileError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Record file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a local path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The endpoint could not be reached or the body could not be read.
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    FetchFailed { url: String, reason: String },

    /// The endpoint did not answer within the configured timeout.
    #[error("Fetch timed out after {secs}s for '{url}'\nIncrease --fetch-timeout.")]
    FetchTimeout { url: String, secs: u64 },

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP error from '{url}': status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The body was not valid JSON.
    #[error("Malformed JSON in {source_name}: {detail}")]
    MalformedJson { source_name: String, detail: String },

    /// Valid JSON, but neither an array nor a recognised wrapper object.
    #[error(
        "Unexpected data format from {source_name}: expected an array of records \
or an object with one of data/contacts/results/items"
    )]
    UnexpectedShape { source_name: String },

    /// The record list was empty.
    #[error("No contacts found in {source_name}")]
    NoRecords { source_name: String },

    /// The tabular file could not be parsed.
    #[error("Malformed CSV '{path}': {detail}")]
    MalformedCsv { path: PathBuf, detail: String },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// A selected record index does not exist.
    #[error("Record {index} is out of range ({total} records loaded)")]
    RecordIndexOutOfRange { index: usize, total: usize },

    /// A second batch was started while one is still running.
    #[error("Generation already in progress")]
    BatchInProgress,

    /// An error escaped per-record isolation and the remaining batch was dropped.
    #[error("Batch generation failed after {processed}/{total} records: {reason}")]
    BatchAborted {
        processed: usize,
        total: usize,
        reason: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single record.
///
/// The batch continues after any of these, except when
/// [`RecordError::is_batch_fatal`] says every later record would fail the
/// same way.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordError {
    /// No display name could be resolved (1-indexed position).
    #[error("Contact {index}: No name provided")]
    MissingName { index: usize },

    /// The rendering backend failed to produce output.
    #[error("{name}: rendering failed: {detail}")]
    RenderFailed { name: String, detail: String },

    /// Rasterised pages or the printed PDF could not be assembled.
    #[error("{name}: export failed: {detail}")]
    ExportFailed { name: String, detail: String },

    /// A backend call exceeded its timeout.
    #[error("{name}: rendering timed out after {secs}s")]
    Timeout { name: String, secs: u64 },

    /// The output file could not be written.
    #[error("{name}: failed to write '{path}': {detail}")]
    WriteFailed {
        name: String,
        path: PathBuf,
        detail: String,
    },

    /// The rendering backend is missing entirely.
    #[error("Rendering backend unavailable: {detail}")]
    BackendUnavailable { detail: String },
}

impl RecordError {
    /// `true` when the failure is environmental and would repeat for every
    /// remaining record.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, RecordError::BackendUnavailable { .. })
    }
}
