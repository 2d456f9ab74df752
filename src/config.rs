//! Configuration types for profile generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`],
//! built via its [`GenerationConfigBuilder`]. The rendering choices the
//! source data disagrees about (events as list or paragraph, initials or a
//! blank avatar) live here as explicit options instead of being baked into
//! the composer.

use crate::error::ProfileError;
use crate::pipeline::export::RenderBackend;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for generating profile documents.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use contact2html::{ExportFormat, GenerationConfig};
///
/// let config = GenerationConfig::builder()
///     .output_dir("out")
///     .format(ExportFormat::Pdf)
///     .render_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Directory receiving generated documents. Default: `./generated_profiles`.
    pub output_dir: PathBuf,

    /// Output document kind. Default: [`ExportFormat::Html`].
    pub format: ExportFormat,

    /// How "recent events" render. Default: [`EventsLayout::Auto`].
    pub events_layout: EventsLayout,

    /// What replaces a missing photo or logo. Default: [`AvatarFallback::Initials`].
    pub avatar_fallback: AvatarFallback,

    /// Include the remote web-font stylesheet link. Default: true.
    pub web_fonts: bool,

    /// Download photo/logo URLs and embed them as data URIs. Default: false.
    ///
    /// Makes the HTML fully self-contained at the cost of one request per
    /// image. Images that fail to download keep their original URL.
    pub inline_images: bool,

    /// Upper bound for any outbound HTTP call, in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Upper bound for one rendering backend call, in seconds. Default: 60.
    pub render_timeout_secs: u64,

    /// Budget the browser gets to finish loading images and fonts before
    /// capture, in milliseconds. Default: 2000.
    pub settle_budget_ms: u64,

    /// Pause between records for browser formats, in milliseconds. Default: 500.
    ///
    /// HTML output never touches the browser and skips the pause.
    pub inter_record_delay_ms: u64,

    /// Viewport width in CSS pixels. Default: 794 (A4 at 96 dpi).
    pub page_width_px: u32,

    /// Device pixel ratio used for screenshots. Range: 1–4. Default: 2.
    pub device_scale: u32,

    /// Explicit browser executable. If None, the locator searches for one.
    pub browser_path: Option<PathBuf>,

    /// Pre-constructed rendering backend. Takes precedence over `browser_path`.
    pub backend: Option<Arc<dyn RenderBackend>>,

    /// Receives batch and per-record events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated_profiles"),
            format: ExportFormat::default(),
            events_layout: EventsLayout::default(),
            avatar_fallback: AvatarFallback::default(),
            web_fonts: true,
            inline_images: false,
            fetch_timeout_secs: 30,
            render_timeout_secs: 60,
            settle_budget_ms: 2000,
            inter_record_delay_ms: 500,
            page_width_px: 794,
            device_scale: 2,
            browser_path: None,
            backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("output_dir", &self.output_dir)
            .field("format", &self.format)
            .field("events_layout", &self.events_layout)
            .field("avatar_fallback", &self.avatar_fallback)
            .field("web_fonts", &self.web_fonts)
            .field("inline_images", &self.inline_images)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("settle_budget_ms", &self.settle_budget_ms)
            .field("inter_record_delay_ms", &self.inter_record_delay_ms)
            .field("page_width_px", &self.page_width_px)
            .field("device_scale", &self.device_scale)
            .field("browser_path", &self.browser_path)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn RenderBackend>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Height of one output page in CSS pixels (A4 portrait ratio).
    pub fn page_height_px(&self) -> u32 {
        a4_height_for_width(self.page_width_px)
    }

    /// Whether the pause between records applies to this format.
    pub fn uses_browser(&self) -> bool {
        !matches!(self.format, ExportFormat::Html)
    }
}

/// A4 is 210 × 297 mm; keep that ratio for any width.
pub fn a4_height_for_width(width: u32) -> u32 {
    ((width as u64 * 297 + 105) / 210) as u32
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn format(mut self, format: ExportFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn events_layout(mut self, layout: EventsLayout) -> Self {
        self.config.events_layout = layout;
        self
    }

    pub fn avatar_fallback(mut self, fallback: AvatarFallback) -> Self {
        self.config.avatar_fallback = fallback;
        self
    }

    pub fn web_fonts(mut self, v: bool) -> Self {
        self.config.web_fonts = v;
        self
    }

    pub fn inline_images(mut self, v: bool) -> Self {
        self.config.inline_images = v;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn settle_budget_ms(mut self, ms: u64) -> Self {
        self.config.settle_budget_ms = ms;
        self
    }

    pub fn inter_record_delay_ms(mut self, ms: u64) -> Self {
        self.config.inter_record_delay_ms = ms;
        self
    }

    pub fn page_width_px(mut self, px: u32) -> Self {
        self.config.page_width_px = px.max(320);
        self
    }

    pub fn device_scale(mut self, scale: u32) -> Self {
        self.config.device_scale = scale.clamp(1, 4);
        self
    }

    pub fn browser_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_path = Some(path.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn RenderBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, ProfileError> {
        let c = &self.config;
        if c.fetch_timeout_secs == 0 {
            return Err(ProfileError::InvalidConfig(
                "Fetch timeout must be ≥ 1 second".into(),
            ));
        }
        if c.render_timeout_secs == 0 {
            return Err(ProfileError::InvalidConfig(
                "Render timeout must be ≥ 1 second".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(ProfileError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Kind of document written per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Self-contained HTML document (default). No browser needed.
    #[default]
    Html,
    /// PDF printed by the headless browser, one sheet per page descriptor
    /// (tall pages continue onto further sheets).
    Pdf,
    /// One PNG per A4-height slice of each rasterised page.
    Png,
}

impl ExportFormat {
    /// File extension of the primary output.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
        }
    }
}

/// Shape of the "recent events" block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventsLayout {
    /// Bulleted list when the value contains `;`, paragraph otherwise (default).
    #[default]
    Auto,
    /// Always a bulleted list.
    List,
    /// Always a paragraph.
    Paragraph,
}

/// Placeholder for a missing photo or logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AvatarFallback {
    /// Initials (person) or first letter (company) on a gradient (default).
    #[default]
    Initials,
    /// An empty tinted box.
    Blank,
}
