//! # contact2html
//!
//! Turn contact/company records from a CSV export or a JSON API into styled,
//! paginated profile documents.
//!
//! ## Why this crate?
//!
//! Contact exports never agree on column names: one tool writes
//! `"Full Name"`, another `fullName`, a third `name`, and half the cells are
//! blank or `"N/A"`. This crate maps every record onto one canonical
//! [`ProfileRecord`] through an explicit alias table, decides which sections
//! and pages the profile actually needs, and renders a self-contained HTML
//! document (optionally printed to PDF or sliced into PNG pages by a headless
//! browser).
//!
//! ## Pipeline Overview
//!
//! ```text
//! CSV / JSON / endpoint
//!  │
//!  ├─ 1. Input      acquire raw records (array or data/contacts/results/items)
//!  ├─ 2. Normalize  alias table + presence test → ProfileRecord
//!  ├─ 3. Compose    gated section builders → 2 or 3 PageDescriptors
//!  ├─ 4. Render     escaped, self-contained HTML, one <section> per page
//!  ├─ 5. Export     HTML as-is, or PDF / PNG via a RenderBackend
//!  └─ 6. Output     one document per record + batch summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contact2html::{generate_from_input, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenerationConfig::builder().output_dir("profiles").build()?;
//!     let summary = generate_from_input("contacts.csv", &config).await?;
//!     println!("{}", summary.status().message);
//!     for doc in &summary.documents {
//!         println!("  {} ({} pages)", doc.filename, doc.page_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `contact2html` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! contact2html = { version = "0.3", default-features = false }
//! ```
//!
//! ## Output Formats
//!
//! | Format | Needs a browser | Files per record |
//! |--------|-----------------|------------------|
//! | `Html` | no  | `name_profile_<ts>.html` |
//! | `Pdf`  | yes | `name_profile_<ts>.pdf` |
//! | `Png`  | yes | `name_profile_<ts>_page_01.png`, `_page_02.png`, … |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod record;
pub mod stream;
pub mod styles;
pub mod webhook;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AvatarFallback, EventsLayout, ExportFormat, GenerationConfig, GenerationConfigBuilder};
pub use error::{ProfileError, RecordError};
pub use generate::{
    filename_base, generate_document, generate_from_input, generate_selected, generate_sync,
    output_filename, render_profile_html, BatchRunner,
};
pub use output::{BatchSummary, GeneratedDocument, RecordOutcome, Status, StatusLevel};
pub use pipeline::compose::{compose, compose_with, ComposeOptions, PageDescriptor, SectionBlock};
pub use pipeline::export::{BackendError, HeadlessBrowser, RenderBackend, Viewport};
pub use pipeline::input::{resolve_records, LoadedRecords};
pub use pipeline::normalize::{normalize, ProfileRecord};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{has_value, RawRecord};
pub use stream::{generate_stream, RecordStream};
pub use webhook::{trigger_workflow, WebhookOutcome};
