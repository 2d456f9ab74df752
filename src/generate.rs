//! Document generation: single records, selected records, and batches.
//!
//! ## Batch state machine
//!
//! ```text
//! Idle ──run()──▶ Running ──(per record: Skip | Success | Fail)──▶ Idle
//!                    │
//!                    └── second run() while Running ──▶ Err(BatchInProgress)
//! ```
//!
//! Records are processed strictly one at a time in input order. A record
//! without a resolvable name is skipped and counted as failed; any other
//! per-record failure is captured in the summary and the loop moves on. The
//! only early exit is a batch-fatal error (no rendering backend at all),
//! reported as [`ProfileError::BatchAborted`].

use crate::config::{ExportFormat, GenerationConfig};
use crate::error::{ProfileError, RecordError};
use crate::output::{BatchSummary, GeneratedDocument, RecordOutcome};
use crate::pipeline::compose::{compose_with, ComposeOptions, PageDescriptor};
use crate::pipeline::export::{self, BackendError, RenderBackend, Viewport};
use crate::pipeline::normalize::{normalize, ProfileRecord, UNKNOWN_NAME};
use crate::pipeline::render::{render_document, render_single_page, RenderOptions};
use crate::pipeline::{inline, input};
use crate::record::RawRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static RE_NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

// ── Filenames ────────────────────────────────────────────────────────────

/// Filename stem for a display name: runs of non-alphanumerics become one
/// `_`, edges are trimmed, and the result is lowercased.
///
/// `"Jane O'Brien!!"` → `"jane_o_brien"`.
pub fn filename_base(name: &str) -> String {
    let collapsed = RE_NON_ALPHANUMERIC.replace_all(name, "_");
    let base = collapsed.trim_matches('_').to_lowercase();
    if base.is_empty() {
        UNKNOWN_NAME.to_lowercase()
    } else {
        base
    }
}

/// `{base}_profile_{timestamp_ms}.{ext}`.
pub fn output_filename(name: &str, extension: &str, timestamp_ms: i64) -> String {
    format!("{}.{}", output_stem(name, timestamp_ms), extension)
}

fn output_stem(name: &str, timestamp_ms: i64) -> String {
    format!("{}_profile_{}", filename_base(name), timestamp_ms)
}

/// Milliseconds since the Unix epoch.
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ── Single document ──────────────────────────────────────────────────────

/// Compose and render the HTML for one record without writing anything.
pub fn render_profile_html(profile: &ProfileRecord, config: &GenerationConfig) -> String {
    let pages = compose_with(profile, &ComposeOptions::from(config));
    render_document(profile, &pages, &RenderOptions::from(config))
}

/// Generate and write the document for one normalised record.
///
/// `backend` is required for [`ExportFormat::Pdf`] and [`ExportFormat::Png`]
/// and ignored for HTML.
pub async fn generate_document(
    profile: &ProfileRecord,
    config: &GenerationConfig,
    backend: Option<&Arc<dyn RenderBackend>>,
) -> Result<GeneratedDocument, RecordError> {
    let name = profile.display_name().to_string();

    // ── Step 1: Inline images ────────────────────────────────────────────
    let mut profile = profile.clone();
    if config.inline_images {
        let n = inline::inline_images(&mut profile, config.fetch_timeout_secs).await;
        debug!("Inlined {} images for '{}'", n, name);
    }

    // ── Step 2: Compose and render ───────────────────────────────────────
    let pages = compose_with(&profile, &ComposeOptions::from(config));
    let render_options = RenderOptions::from(config);
    let html = render_document(&profile, &pages, &render_options);

    // ── Step 3: Export ───────────────────────────────────────────────────
    let dir = &config.output_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| write_failed(&name, dir, e))?;

    let ext = config.format.extension();
    let stem = unique_stem(dir, &output_stem(&name, timestamp_ms()), ext);

    let paths = match config.format {
        ExportFormat::Html => {
            let path = dir.join(format!("{stem}.{ext}"));
            write_atomic(&path, html.as_bytes())
                .await
                .map_err(|e| write_failed(&name, &path, e))?;
            vec![path]
        }
        ExportFormat::Pdf => {
            let backend = require_backend(backend)?;
            let path = dir.join(format!("{stem}.{ext}"));
            let tmp = tmp_path(&path);
            let printed = bounded(
                &name,
                config,
                backend.print_pdf(&html, Viewport::page(config), &tmp),
            )
            .await;
            if printed.is_err() {
                let _ = tokio::fs::remove_file(&tmp).await;
            }
            printed?;
            tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|e| write_failed(&name, &path, e))?;
            vec![path]
        }
        ExportFormat::Png => {
            let backend = require_backend(backend)?;
            export_png_pages(&profile, &pages, &render_options, config, backend, &stem).await?
        }
    };

    let filename = paths
        .first()
        .and_then(|p| p.file_name())
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!("Generated {} for '{}'", filename, name);
    Ok(GeneratedDocument {
        name,
        filename,
        paths,
        page_count: pages.len(),
        html_len: html.len(),
    })
}

/// Rasterise each page separately and write A4-height PNG slices.
async fn export_png_pages(
    profile: &ProfileRecord,
    pages: &[PageDescriptor],
    render_options: &RenderOptions,
    config: &GenerationConfig,
    backend: &Arc<dyn RenderBackend>,
    stem: &str,
) -> Result<Vec<PathBuf>, RecordError> {
    let name = profile.display_name();
    let viewport = Viewport::capture(config);
    let sheet_height = viewport.sheet_height_px();

    let mut paths = Vec::new();
    for index in 0..pages.len() {
        let Some(page_html) = render_single_page(profile, pages, index, render_options) else {
            continue;
        };
        let captured = bounded(name, config, backend.rasterize(&page_html, viewport)).await?;

        // Trimming, slicing and PNG encoding are CPU-bound.
        let encoded = tokio::task::spawn_blocking(move || {
            let trimmed = export::trim_trailing_background(&captured, sheet_height);
            export::slice_into_pages(&trimmed, sheet_height)
                .iter()
                .map(export::encode_png)
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| RecordError::ExportFailed {
            name: name.to_string(),
            detail: format!("slicing task panicked: {e}"),
        })?
        .map_err(|e| RecordError::ExportFailed {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

        for bytes in encoded {
            let path = config
                .output_dir
                .join(format!("{stem}_page_{:02}.png", paths.len() + 1));
            write_atomic(&path, &bytes)
                .await
                .map_err(|e| write_failed(name, &path, e))?;
            paths.push(path);
        }
    }
    Ok(paths)
}

fn require_backend(
    backend: Option<&Arc<dyn RenderBackend>>,
) -> Result<&Arc<dyn RenderBackend>, RecordError> {
    backend.ok_or_else(|| RecordError::BackendUnavailable {
        detail: "no rendering backend configured".to_string(),
    })
}

/// Run one backend call under `render_timeout_secs`, whatever the backend.
async fn bounded<T>(
    name: &str,
    config: &GenerationConfig,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, RecordError> {
    let secs = config.render_timeout_secs;
    match tokio::time::timeout(Duration::from_secs(secs), call).await {
        Ok(result) => result.map_err(|e| backend_failure(name, e)),
        Err(_) => {
            warn!("Rendering '{}' exceeded {}s", name, secs);
            Err(RecordError::Timeout {
                name: name.to_string(),
                secs,
            })
        }
    }
}

fn backend_failure(name: &str, err: BackendError) -> RecordError {
    let name = name.to_string();
    match err {
        BackendError::Unavailable(detail) => RecordError::BackendUnavailable { detail },
        BackendError::RenderFailed(detail) => RecordError::RenderFailed { name, detail },
        BackendError::ExportFailed(detail) => RecordError::ExportFailed { name, detail },
        BackendError::Timeout(secs) => RecordError::Timeout { name, secs },
    }
}

fn write_failed(name: &str, path: &Path, err: std::io::Error) -> RecordError {
    RecordError::WriteFailed {
        name: name.to_string(),
        path: path.to_path_buf(),
        detail: err.to_string(),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write to a sibling temp file, then rename into place.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Same-millisecond runs for the same name get a numeric suffix.
fn unique_stem(dir: &Path, stem: &str, ext: &str) -> String {
    let taken = |s: &str| {
        dir.join(format!("{s}.{ext}")).exists() || dir.join(format!("{s}_page_01.png")).exists()
    };
    if !taken(stem) {
        return stem.to_string();
    }
    (2..)
        .map(|n| format!("{stem}_{n}"))
        .find(|s| !taken(s))
        .unwrap_or_else(|| stem.to_string())
}

// ── Batch ────────────────────────────────────────────────────────────────

/// Owns the loaded records and the "batch in progress" flag.
///
/// ```rust,no_run
/// use contact2html::{BatchRunner, GenerationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let records = contact2html::pipeline::input::resolve_records("demo/demo-data.json", 30).await?;
/// let runner = BatchRunner::new(records.records, GenerationConfig::default());
/// let summary = runner.run().await?;
/// println!("{}", summary.status().message);
/// # Ok(())
/// # }
/// ```
pub struct BatchRunner {
    records: Vec<RawRecord>,
    config: GenerationConfig,
    in_progress: AtomicBool,
}

/// Resets the in-progress flag on every exit path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl BatchRunner {
    pub fn new(records: Vec<RawRecord>, config: GenerationConfig) -> Self {
        Self {
            records,
            config,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    fn try_start(&self) -> Result<RunGuard<'_>, ProfileError> {
        self.in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ProfileError::BatchInProgress)?;
        Ok(RunGuard(&self.in_progress))
    }

    /// Generate one document per record, in order.
    pub async fn run(&self) -> Result<BatchSummary, ProfileError> {
        let _guard = self.try_start()?;
        let config = &self.config;
        let total = self.records.len();
        let started = Instant::now();

        if total == 0 {
            return Err(ProfileError::NoRecords {
                source_name: "batch".to_string(),
            });
        }
        ensure_output_dir(&config.output_dir).await?;

        info!(
            "Generating {} {} documents into {}",
            total,
            config.format.extension(),
            config.output_dir.display()
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_start(total);
        }

        let mut summary = BatchSummary::new(total);
        let mut backend = BackendSlot::default();

        for (i, raw) in self.records.iter().enumerate() {
            let index = i + 1;
            let outcome = process_record(raw, index, total, config, &mut backend).await;

            if let Some(err) = outcome.error().filter(|e| e.is_batch_fatal()) {
                warn!("Aborting batch: {}", err);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_record_error(index, total, &err.to_string());
                }
                return Err(ProfileError::BatchAborted {
                    processed: summary.processed + 1,
                    total,
                    reason: err.to_string(),
                });
            }

            let touched_backend = !matches!(outcome, RecordOutcome::Skip { .. });
            summary.record(outcome);
            if let Some(ref cb) = config.progress_callback {
                cb.on_progress(summary.progress_percent());
            }

            if index < total
                && touched_backend
                && config.uses_browser()
                && config.inter_record_delay_ms > 0
            {
                tokio::time::sleep(Duration::from_millis(config.inter_record_delay_ms)).await;
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Batch complete: {}/{} successful, {} failed, {}ms",
            summary.successful, total, summary.failed, summary.duration_ms
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_complete(total, summary.successful, summary.failed);
        }
        Ok(summary)
    }

    /// Generate the document for the record at 1-indexed `index`.
    ///
    /// Shares the in-progress flag with [`BatchRunner::run`].
    pub async fn run_selected(&self, index: usize) -> Result<RecordOutcome, ProfileError> {
        let _guard = self.try_start()?;
        let total = self.records.len();
        let raw = index
            .checked_sub(1)
            .and_then(|i| self.records.get(i))
            .ok_or(ProfileError::RecordIndexOutOfRange { index, total })?;

        ensure_output_dir(&self.config.output_dir).await?;
        let mut backend = BackendSlot::default();
        let outcome = process_record(raw, index, total, &self.config, &mut backend).await;
        match outcome.error().filter(|e| e.is_batch_fatal()) {
            Some(err) => Err(ProfileError::BatchAborted {
                processed: 1,
                total: 1,
                reason: err.to_string(),
            }),
            None => Ok(outcome),
        }
    }
}

/// Select-one: generate a single record from a list (1-indexed).
pub async fn generate_selected(
    records: &[RawRecord],
    index: usize,
    config: &GenerationConfig,
) -> Result<RecordOutcome, ProfileError> {
    let total = records.len();
    let raw = index
        .checked_sub(1)
        .and_then(|i| records.get(i))
        .ok_or(ProfileError::RecordIndexOutOfRange { index, total })?;
    BatchRunner::new(vec![raw.clone()], config.clone())
        .run_selected(1)
        .await
        .map(|outcome| reindex(outcome, index))
}

fn reindex(outcome: RecordOutcome, index: usize) -> RecordOutcome {
    match outcome {
        RecordOutcome::Success { document, .. } => RecordOutcome::Success { index, document },
        RecordOutcome::Skip { .. } => RecordOutcome::Skip {
            index,
            error: RecordError::MissingName { index },
        },
        RecordOutcome::Fail { error, .. } => RecordOutcome::Fail { index, error },
    }
}

/// Load records from `input` and run a full batch.
pub async fn generate_from_input(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<BatchSummary, ProfileError> {
    let loaded = input::resolve_records(input_str.as_ref(), config.fetch_timeout_secs).await?;
    BatchRunner::new(loaded.records, config.clone()).run().await
}

/// Synchronous wrapper around [`generate_from_input`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<BatchSummary, ProfileError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ProfileError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_from_input(input_str, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn ensure_output_dir(dir: &Path) -> Result<(), ProfileError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ProfileError::OutputDirFailed {
            path: dir.to_path_buf(),
            source,
        })
}

/// Backend resolved on first use within one run.
#[derive(Default)]
pub(crate) struct BackendSlot {
    resolved: Option<Arc<dyn RenderBackend>>,
}

impl BackendSlot {
    pub(crate) fn get(
        &mut self,
        config: &GenerationConfig,
    ) -> Result<Arc<dyn RenderBackend>, RecordError> {
        if let Some(backend) = &self.resolved {
            return Ok(Arc::clone(backend));
        }
        let backend = export::resolve_backend(config).map_err(|e| RecordError::BackendUnavailable {
            detail: e.to_string(),
        })?;
        debug!("Rendering backend: {}", backend.name());
        self.resolved = Some(Arc::clone(&backend));
        Ok(backend)
    }
}

/// Normalise, validate and generate one record; never fails outright.
pub(crate) async fn process_record(
    raw: &RawRecord,
    index: usize,
    total: usize,
    config: &GenerationConfig,
    backend: &mut BackendSlot,
) -> RecordOutcome {
    let profile = normalize(raw);
    let cb = config.progress_callback.as_ref();

    if !profile.has_name() {
        let error = RecordError::MissingName { index };
        warn!("{}", error);
        if let Some(cb) = cb {
            cb.on_record_skipped(index, total, &error.to_string());
        }
        return RecordOutcome::Skip { index, error };
    }

    let name = profile.display_name();
    debug!("Record {}/{}: {}", index, total, name);
    if let Some(cb) = cb {
        cb.on_record_start(index, total, name);
    }

    let result = if config.uses_browser() {
        match backend.get(config) {
            Ok(b) => generate_document(&profile, config, Some(&b)).await,
            Err(e) => Err(e),
        }
    } else {
        generate_document(&profile, config, None).await
    };

    match result {
        Ok(document) => {
            if let Some(cb) = cb {
                cb.on_record_complete(index, total, &document.filename);
            }
            RecordOutcome::Success { index, document }
        }
        Err(error) => {
            warn!("Record {} failed: {}", index, error);
            if let Some(cb) = cb {
                if !error.is_batch_fatal() {
                    cb.on_record_error(index, total, &error.to_string());
                }
            }
            RecordOutcome::Fail { index, error }
        }
    }
}
