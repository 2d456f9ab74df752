//! CLI binary for contact2html.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use contact2html::preview::{preview_lines, selector_labels};
use contact2html::{
    resolve_records, trigger_workflow, AvatarFallback, BatchRunner, EventsLayout, ExportFormat,
    GenerationConfig, GenerationProgressCallback, ProgressCallback, RecordOutcome, StatusLevel,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn truncate(msg: &str, max: usize) -> String {
    if msg.chars().count() > max {
        let head: String = msg.chars().take(max - 1).collect();
        format!("{head}\u{2026}")
    } else {
        msg.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar over records plus one log line per
/// record (written, skipped or failed).
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the record currently being generated.
    started: Mutex<Option<Instant>>,
    /// Records that were skipped or failed.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports the record count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading contacts…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {percent:>3}%  {pos}/{len} contacts  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
        self.bar.set_message("");
        self.bar.reset_eta();
    }

    /// Stop the bar when the batch ends without `on_batch_complete`.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating {total} profile documents…"))
        ));
    }

    fn on_record_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_record_complete(&self, index: usize, total: usize, filename: &str) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            filename,
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_record_skipped(&self, index: usize, total: usize, reason: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            yellow("–"),
            index,
            total,
            yellow(&truncate(reason, 80)),
        ));
    }

    fn on_record_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&truncate(error, 80)),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_progress(&self, percent: f32) {
        let len = self.bar.length().unwrap_or(0);
        let pos = (percent as f64 / 100.0 * len as f64).round() as u64;
        self.bar.set_position(pos.min(len));
    }

    fn on_batch_complete(&self, _total: usize, _successful: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every contact in a CSV export, as HTML
  contact2html contacts.csv

  # From a JSON API, into a chosen directory
  contact2html https://api.example.com/contacts -o profiles

  # Print-ready PDFs (needs Chromium or Google Chrome)
  contact2html --format pdf demo/demo-data.json

  # One PNG per page for the third contact only
  contact2html --format png --select 3 contacts.csv

  # Show what would be generated
  contact2html --list contacts.csv

  # Self-contained HTML with embedded photos and no remote fonts
  contact2html --inline-images --no-web-fonts contacts.csv

  # Machine-readable batch summary
  contact2html --json contacts.csv > summary.json

  # Kick off the upstream workflow that refreshes the contact feed
  contact2html --webhook https://automation.example.com/webhook/refresh

INPUT:
  A local .json, .csv or .tsv file, or an http(s) URL returning JSON.
  JSON may be a bare array of objects or an object wrapping the array in
  one of: data, contacts, results, items.

ENVIRONMENT VARIABLES:
  CONTACT2HTML_BROWSER         Browser executable for PDF / PNG export
  CONTACT2HTML_BROWSER_ARGS    Extra browser flags, whitespace-separated
  CONTACT2HTML_CACHE_DIR       Parent directory for browser profiles
  CONTACT2HTML_OUTPUT          Same as --output
  CONTACT2HTML_FORMAT          Same as --format
  RUST_LOG                     Overrides the log filter (e.g. contact2html=debug)
"#;

/// Generate paginated profile documents from contact records.
#[derive(Parser, Debug)]
#[command(
    name = "contact2html",
    version,
    about = "Generate paginated profile documents from contact records (CSV or JSON API)",
    long_about = "Turn contact and company records from a CSV export, a JSON file or a JSON API \
into styled, paginated profile documents. Every record becomes one document with a contact \
card, a profile details page and, when company data is present, a company profile page. \
Output is self-contained HTML, or PDF / PNG rendered through a headless browser.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local JSON/CSV file path or HTTP/HTTPS URL.
    input: Option<String>,

    /// Directory receiving the generated documents.
    #[arg(short, long, env = "CONTACT2HTML_OUTPUT", default_value = "generated_profiles")]
    output: PathBuf,

    /// Output format.
    #[arg(long, env = "CONTACT2HTML_FORMAT", value_enum, default_value = "html")]
    format: FormatArg,

    /// Generate only the contact at this 1-indexed position.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    select: Option<u64>,

    /// List the contacts and exit without generating anything.
    #[arg(long)]
    list: bool,

    /// How the company's recent events render.
    #[arg(long, env = "CONTACT2HTML_EVENTS", value_enum, default_value = "auto")]
    events: EventsArg,

    /// What replaces a missing photo or logo.
    #[arg(long, env = "CONTACT2HTML_AVATAR", value_enum, default_value = "initials")]
    avatar: AvatarArg,

    /// Leave out the remote web-font stylesheet.
    #[arg(long, env = "CONTACT2HTML_NO_WEB_FONTS")]
    no_web_fonts: bool,

    /// Download photos and logos and embed them as data URIs.
    #[arg(long, env = "CONTACT2HTML_INLINE_IMAGES")]
    inline_images: bool,

    /// Browser executable for PDF / PNG export.
    #[arg(long, env = "CONTACT2HTML_BROWSER")]
    browser: Option<PathBuf>,

    /// HTTP timeout for the record endpoint, images and webhook, in seconds.
    #[arg(long, env = "CONTACT2HTML_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Per-record browser timeout in seconds.
    #[arg(long, env = "CONTACT2HTML_RENDER_TIMEOUT", default_value_t = 60)]
    render_timeout: u64,

    /// Time the browser gets to load images and fonts, in milliseconds.
    #[arg(long, env = "CONTACT2HTML_SETTLE_MS", default_value_t = 2000)]
    settle_ms: u64,

    /// Pause between records for PDF / PNG export, in milliseconds.
    #[arg(long, env = "CONTACT2HTML_DELAY_MS", default_value_t = 500)]
    delay_ms: u64,

    /// Device pixel ratio for PNG export (1–4).
    #[arg(long, env = "CONTACT2HTML_SCALE", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(1..=4))]
    scale: u32,

    /// Output the batch summary as JSON.
    #[arg(long, env = "CONTACT2HTML_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CONTACT2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CONTACT2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the summary line.
    #[arg(short, long, env = "CONTACT2HTML_QUIET")]
    quiet: bool,

    /// Trigger the workflow at this URL (before generating, if INPUT is given).
    #[arg(long, env = "CONTACT2HTML_WEBHOOK")]
    webhook: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Html,
    Pdf,
    Png,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Html => ExportFormat::Html,
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Png => ExportFormat::Png,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EventsArg {
    Auto,
    List,
    Paragraph,
}

impl From<EventsArg> for EventsLayout {
    fn from(v: EventsArg) -> Self {
        match v {
            EventsArg::Auto => EventsLayout::Auto,
            EventsArg::List => EventsLayout::List,
            EventsArg::Paragraph => EventsLayout::Paragraph,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AvatarArg {
    Initials,
    Blank,
}

impl From<AvatarArg> for AvatarFallback {
    fn from(v: AvatarArg) -> Self {
        match v {
            AvatarArg::Initials => AvatarFallback::Initials,
            AvatarArg::Blank => AvatarFallback::Blank,
        }
    }
}

#[derive(Serialize)]
struct ListEntry {
    index: usize,
    label: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The bar carries the per-record feedback; library INFO logs would only
    // tear it apart.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Webhook trigger ──────────────────────────────────────────────────
    if let Some(ref url) = cli.webhook {
        let outcome = trigger_workflow(url, cli.fetch_timeout)
            .await
            .context("Failed to trigger workflow")?;
        let status = outcome.status();
        if cli.json && cli.input.is_none() {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
            );
        } else {
            eprintln!("{} {}", status_mark(status.level), status.message);
        }
        if cli.input.is_none() {
            if status.level == StatusLevel::Error {
                std::process::exit(1);
            }
            return Ok(());
        }
    }

    let Some(ref input) = cli.input else {
        anyhow::bail!("No INPUT given. Pass a JSON/CSV file or an http(s) URL.");
    };

    // ── Load records ─────────────────────────────────────────────────────
    let loaded = resolve_records(input, cli.fetch_timeout)
        .await
        .with_context(|| format!("Failed to load contacts from {input}"))?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} Loaded {} contacts from {}",
            green("✔"),
            bold(&loaded.len().to_string()),
            loaded.source_name
        );
        if !cli.list {
            for line in preview_lines(&loaded.records) {
                eprintln!("   {}", dim(&line));
            }
        }
    }

    // ── List mode ────────────────────────────────────────────────────────
    if cli.list {
        let labels = selector_labels(&loaded.records);
        if cli.json {
            let entries: Vec<ListEntry> = labels
                .into_iter()
                .enumerate()
                .map(|(i, label)| ListEntry { index: i + 1, label })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("Failed to serialise list")?
            );
        } else {
            for label in labels {
                println!("{label}");
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let cli_cb = (show_progress && cli.select.is_none()).then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = cli_cb
        .clone()
        .map(|cb| cb as Arc<dyn GenerationProgressCallback>);
    let config = build_config(&cli, progress_cb)?;
    let runner = BatchRunner::new(loaded.records, config);

    // ── Select one ───────────────────────────────────────────────────────
    if let Some(index) = cli.select {
        let outcome = runner
            .run_selected(index as usize)
            .await
            .context("Generation failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
            );
        }
        return report_selected(&outcome);
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let summary = match runner.run().await {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(cb) = &cli_cb {
                cb.abandon();
            }
            return Err(e).context("Generation failed");
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet && !show_progress {
        for doc in &summary.documents {
            eprintln!("  {} {}", green("✓"), doc.filename);
        }
        for err in &summary.errors {
            eprintln!("  {} {}", red("✗"), err);
        }
    }

    let status = summary.status();
    eprintln!(
        "{} {}  {}  →  {}",
        status_mark(status.level),
        status.message,
        dim(&format!("{}ms", summary.duration_ms)),
        bold(&runner.config().output_dir.display().to_string()),
    );

    Ok(())
}

fn status_mark(level: StatusLevel) -> String {
    match level {
        StatusLevel::Success => green("✔"),
        StatusLevel::Warning => cyan("⚠"),
        StatusLevel::Error => red("✘"),
        StatusLevel::Loading => cyan("◆"),
    }
}

/// Print the single-record result; a skip or failure exits non-zero.
fn report_selected(outcome: &RecordOutcome) -> Result<()> {
    match outcome {
        RecordOutcome::Success { document, .. } => {
            eprintln!(
                "{} Generated {} for {}  ({} pages)",
                green("✔"),
                bold(&document.filename),
                document.name,
                document.page_count
            );
            Ok(())
        }
        RecordOutcome::Skip { error, .. } | RecordOutcome::Fail { error, .. } => {
            anyhow::bail!("{error}")
        }
    }
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .output_dir(&cli.output)
        .format(cli.format.into())
        .events_layout(cli.events.into())
        .avatar_fallback(cli.avatar.into())
        .web_fonts(!cli.no_web_fonts)
        .inline_images(cli.inline_images)
        .fetch_timeout_secs(cli.fetch_timeout)
        .render_timeout_secs(cli.render_timeout)
        .settle_budget_ms(cli.settle_ms)
        .inter_record_delay_ms(cli.delay_ms)
        .device_scale(cli.scale);

    if let Some(ref path) = cli.browser {
        builder = builder.browser_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_batch_clears_the_bar() {
        let cb = CliProgressCallback::new_dynamic();
        cb.on_batch_start(3);
        cb.on_record_start(1, 3, "Jane Doe");
        assert!(!cb.bar.is_finished());

        cb.abandon();
        assert!(cb.bar.is_finished());
        // Idempotent with a later on_batch_complete.
        cb.on_batch_complete(3, 0, 1);
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("short", 80), "short");
        assert!(truncate(&"x".repeat(100), 10).chars().count() <= 10);
    }
}
