//! Result types: generated documents, per-record outcomes, batch summary.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity tag attached to every user-facing status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Loading,
    Success,
    Warning,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusLevel::Loading => "loading",
            StatusLevel::Success => "success",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// A short status message plus its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, message)
    }
}

/// One written document (or, for PNG export, the set of page images).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    /// Display name the document was generated for.
    pub name: String,
    /// Primary output file name, e.g. `jane_doe_profile_1718035200000.html`.
    pub filename: String,
    /// Every file written for this record, in page order.
    pub paths: Vec<PathBuf>,
    /// Number of page descriptors composed (2 or 3).
    pub page_count: usize,
    /// Bytes of HTML produced before export.
    pub html_len: usize,
}

/// What happened to one record in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RecordOutcome {
    Success {
        index: usize,
        document: GeneratedDocument,
    },
    Skip {
        index: usize,
        error: RecordError,
    },
    Fail {
        index: usize,
        error: RecordError,
    },
}

impl RecordOutcome {
    /// 1-indexed record position.
    pub fn index(&self) -> usize {
        match self {
            RecordOutcome::Success { index, .. }
            | RecordOutcome::Skip { index, .. }
            | RecordOutcome::Fail { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecordOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&RecordError> {
        match self {
            RecordOutcome::Success { .. } => None,
            RecordOutcome::Skip { error, .. } | RecordOutcome::Fail { error, .. } => Some(error),
        }
    }
}

/// Aggregate result of a batch run.
///
/// Skipped records count as both processed and failed, so once a batch
/// finishes `processed == total` and `successful + failed == total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Human-readable failure messages, in record order.
    pub errors: Vec<String>,
    /// Documents written, in record order.
    pub documents: Vec<GeneratedDocument>,
    /// Wall-clock duration of the batch.
    pub duration_ms: u64,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Fold one record outcome into the aggregate.
    pub fn record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Success { document, .. } => {
                self.successful += 1;
                self.documents.push(document);
            }
            RecordOutcome::Skip { error, .. } | RecordOutcome::Fail { error, .. } => {
                self.failed += 1;
                self.errors.push(error.to_string());
            }
        }
    }

    /// 0–100 progress value.
    pub fn progress_percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        ((self.processed as f32 / self.total as f32) * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }

    /// Summary status; always reports both counts.
    pub fn status(&self) -> Status {
        let message = format!(
            "Generation complete! Successful: {}/{}, Failed: {}",
            self.successful, self.total, self.failed
        );
        if self.failed == 0 {
            Status::success(message)
        } else {
            Status::warning(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> GeneratedDocument {
        GeneratedDocument {
            name: name.into(),
            filename: format!("{name}.html"),
            paths: vec![PathBuf::from(format!("{name}.html"))],
            page_count: 2,
            html_len: 100,
        }
    }

    #[test]
    fn summary_counts() {
        let mut s = BatchSummary::new(3);
        s.record(RecordOutcome::Success {
            index: 1,
            document: doc("a"),
        });
        s.record(RecordOutcome::Skip {
            index: 2,
            error: RecordError::MissingName { index: 2 },
        });
        assert!((s.progress_percent() - 66.666).abs() < 0.01);
        s.record(RecordOutcome::Fail {
            index: 3,
            error: RecordError::Timeout {
                name: "c".into(),
                secs: 5,
            },
        });

        assert!(s.is_complete());
        assert_eq!(s.successful, 1);
        assert_eq!(s.failed, 2);
        assert_eq!(s.errors[0], "Contact 2: No name provided");
        assert_eq!(s.progress_percent(), 100.0);
    }

    #[test]
    fn status_level_reflects_failures() {
        let mut s = BatchSummary::new(1);
        s.record(RecordOutcome::Success {
            index: 1,
            document: doc("a"),
        });
        let status = s.status();
        assert_eq!(status.level, StatusLevel::Success);
        assert!(status.message.contains("Successful: 1/1"));
        assert!(status.message.contains("Failed: 0"));

        s.total = 2;
        s.record(RecordOutcome::Skip {
            index: 2,
            error: RecordError::MissingName { index: 2 },
        });
        assert_eq!(s.status().level, StatusLevel::Warning);
    }

    #[test]
    fn status_level_serialises_lowercase() {
        let json = serde_json::to_string(&StatusLevel::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        assert_eq!(StatusLevel::Loading.to_string(), "loading");
    }

    #[test]
    fn empty_batch_is_fully_progressed() {
        assert_eq!(BatchSummary::new(0).progress_percent(), 100.0);
    }
}
