//! Streaming generation API: emit one outcome per record as it completes.
//!
//! [`crate::generate::BatchRunner::run`] returns only after the last record.
//! [`generate_stream`] yields each [`RecordOutcome`] as soon as its document
//! is written, so callers can show partial results or stop early by dropping
//! the stream. Records are still processed strictly one at a time, and
//! outcomes arrive in input order.

use crate::config::GenerationConfig;
use crate::error::ProfileError;
use crate::generate::{process_record, BackendSlot};
use crate::output::RecordOutcome;
use crate::pipeline::input;
use crate::record::RawRecord;
use futures::stream;
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-record outcomes.
pub type RecordStream = Pin<Box<dyn Stream<Item = RecordOutcome> + Send>>;

struct StreamState {
    records: std::iter::Enumerate<std::vec::IntoIter<RawRecord>>,
    total: usize,
    config: GenerationConfig,
    backend: BackendSlot,
    previous_hit_backend: bool,
}

/// Generate documents for `records`, yielding outcomes in input order.
///
/// # Errors
/// Returns `Err` only when the output directory cannot be created. A
/// batch-fatal record error ends the stream after that record's outcome.
///
/// # Example
/// ```rust,no_run
/// use contact2html::{generate_stream, GenerationConfig, RecordOutcome};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let loaded = contact2html::pipeline::input::resolve_records("contacts.csv", 30).await?;
/// let mut outcomes = generate_stream(loaded.records, &GenerationConfig::default()).await?;
/// while let Some(outcome) = outcomes.next().await {
///     match outcome {
///         RecordOutcome::Success { document, .. } => println!("wrote {}", document.filename),
///         other => eprintln!("{:?}", other.error()),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn generate_stream(
    records: Vec<RawRecord>,
    config: &GenerationConfig,
) -> Result<RecordStream, ProfileError> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| ProfileError::OutputDirFailed {
            path: config.output_dir.clone(),
            source,
        })?;

    let total = records.len();
    info!("Starting streaming generation of {} records", total);

    let state = Some(StreamState {
        records: records.into_iter().enumerate(),
        total,
        config: config.clone(),
        backend: BackendSlot::default(),
        previous_hit_backend: false,
    });

    let s = stream::unfold(state, |state| async move {
        let mut state = state?;
        let (i, raw) = state.records.next()?;

        if state.previous_hit_backend
            && state.config.uses_browser()
            && state.config.inter_record_delay_ms > 0
        {
            tokio::time::sleep(Duration::from_millis(state.config.inter_record_delay_ms)).await;
        }

        let outcome =
            process_record(&raw, i + 1, state.total, &state.config, &mut state.backend).await;
        state.previous_hit_backend = !matches!(outcome, RecordOutcome::Skip { .. });

        let fatal = outcome.error().is_some_and(|e| e.is_batch_fatal());
        let next = if fatal { None } else { Some(state) };
        Some((outcome, next))
    });

    Ok(Box::pin(s))
}

/// Load records from `input` and stream their outcomes.
pub async fn generate_stream_from_input(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<RecordStream, ProfileError> {
    let loaded = input::resolve_records(input_str.as_ref(), config.fetch_timeout_secs).await?;
    generate_stream(loaded.records, config).await
}
