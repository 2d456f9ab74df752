//! Raster / PDF export through a rendering backend.
//!
//! The backend is the only collaborator that needs a real browser, so it sits
//! behind the [`RenderBackend`] trait. [`HeadlessBrowser`] drives a
//! Chromium-family executable in headless mode; tests inject a fake.
//!
//! ## Settle step
//!
//! Chromium's `--virtual-time-budget` holds the capture until the page has
//! been idle (images, fonts, layout) for the given budget, replacing a fixed
//! sleep with an explicit "resources are ready" signal.
//!
//! ## Page slicing
//!
//! A rasterised page is captured taller than one sheet so overflowing content
//! is not clipped. [`trim_trailing_background`] cuts the unused bottom, and
//! [`slice_into_pages`] cuts the remainder into A4-height images.

use crate::config::GenerationConfig;
use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Extra command-line arguments appended to every browser invocation,
/// whitespace separated (e.g. `--no-sandbox` inside containers).
pub const BROWSER_ARGS_ENV: &str = "CONTACT2HTML_BROWSER_ARGS";

/// Capture height in sheets for one rasterised page.
const CAPTURE_SHEETS: u32 = 3;

/// Failure reported by a backend; the caller attaches the record name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    RenderFailed(String),
    #[error("{0}")]
    ExportFailed(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Geometry of one capture, in CSS pixels plus device scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

impl Viewport {
    /// One sheet at the configured width and scale.
    pub fn page(config: &GenerationConfig) -> Self {
        Self {
            width: config.page_width_px,
            height: config.page_height_px(),
            scale: config.device_scale,
        }
    }

    /// Taller capture window used for rasterisation.
    pub fn capture(config: &GenerationConfig) -> Self {
        let page = Self::page(config);
        Self {
            height: page.height * CAPTURE_SHEETS,
            ..page
        }
    }

    /// Height of one output sheet in device pixels.
    pub fn sheet_height_px(&self) -> u32 {
        crate::config::a4_height_for_width(self.width) * self.scale
    }
}

/// Turns HTML into pixels or a printed PDF.
///
/// Implementations must be safe to share across tasks; the batch runner
/// calls them strictly one at a time.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str {
        "custom"
    }

    /// Rasterise `html` at `viewport`, returning the captured image.
    async fn rasterize(&self, html: &str, viewport: Viewport) -> Result<DynamicImage, BackendError>;

    /// Print `html` to a PDF at `output`.
    async fn print_pdf(
        &self,
        html: &str,
        viewport: Viewport,
        output: &Path,
    ) -> Result<(), BackendError>;
}

/// Chromium-family browser run once per capture in headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessBrowser {
    executable: PathBuf,
    profile_dir: Option<PathBuf>,
    timeout: Duration,
    settle_budget_ms: u64,
    extra_args: Vec<String>,
}

impl HeadlessBrowser {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        let extra_args = std::env::var(BROWSER_ARGS_ENV)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            executable: executable.into(),
            profile_dir: headless_locate::profile_dir().ok(),
            timeout: Duration::from_secs(60),
            settle_budget_ms: 2000,
            extra_args,
        }
    }

    /// Build from configuration: explicit `browser_path` first, then discovery.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, BackendError> {
        let executable = match &config.browser_path {
            Some(path) => headless_locate::browser_from_path(path).map_err(|e| {
                BackendError::Unavailable(format!("{}: {}", path.display(), e))
            })?,
            None => headless_locate::find_browser()
                .map_err(|e| BackendError::Unavailable(e.to_string()))?,
        };
        info!("Using browser: {}", executable.display());
        Ok(Self::new(executable)
            .with_timeout(Duration::from_secs(config.render_timeout_secs))
            .with_settle_budget_ms(config.settle_budget_ms))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle_budget_ms(mut self, ms: u64) -> Self {
        self.settle_budget_ms = ms;
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn base_args(&self, viewport: Viewport) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--headless=new".into(),
            "--disable-gpu".into(),
            "--hide-scrollbars".into(),
            "--no-first-run".into(),
            "--no-default-browser-check".into(),
            "--disable-extensions".into(),
            format!("--virtual-time-budget={}", self.settle_budget_ms).into(),
            format!("--window-size={},{}", viewport.width, viewport.height).into(),
            format!("--force-device-scale-factor={}", viewport.scale).into(),
        ];
        if let Some(dir) = &self.profile_dir {
            let mut arg = OsString::from("--user-data-dir=");
            arg.push(dir);
            args.push(arg);
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    async fn run(&self, mut args: Vec<OsString>, page: &Path) -> Result<(), BackendError> {
        let url = reqwest::Url::from_file_path(page).map_err(|_| {
            BackendError::RenderFailed(format!("not an absolute path: {}", page.display()))
        })?;
        args.push(url.as_str().into());

        debug!("{} {:?}", self.executable.display(), args);
        let child = tokio::process::Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| BackendError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BackendError::Unavailable(format!(
                        "browser executable vanished: {}",
                        self.executable.display()
                    ))
                } else {
                    BackendError::RenderFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::RenderFailed(format!(
                "browser exited with {}: {}",
                output.status,
                tail(&stderr, 400)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RenderBackend for HeadlessBrowser {
    fn name(&self) -> &str {
        "headless-browser"
    }

    async fn rasterize(&self, html: &str, viewport: Viewport) -> Result<DynamicImage, BackendError> {
        let scratch = Scratch::new(html).await.map_err(BackendError::RenderFailed)?;
        let shot = scratch.dir.path().join("capture.png");

        let mut args = self.base_args(viewport);
        let mut arg = OsString::from("--screenshot=");
        arg.push(&shot);
        args.push(arg);
        self.run(args, &scratch.page).await?;

        let bytes = tokio::fs::read(&shot)
            .await
            .map_err(|e| BackendError::RenderFailed(format!("no screenshot produced: {e}")))?;
        image::load_from_memory(&bytes).map_err(|e| BackendError::RenderFailed(e.to_string()))
    }

    async fn print_pdf(
        &self,
        html: &str,
        viewport: Viewport,
        output: &Path,
    ) -> Result<(), BackendError> {
        let scratch = Scratch::new(html).await.map_err(BackendError::ExportFailed)?;
        let pdf = scratch.dir.path().join("print.pdf");

        let mut args = self.base_args(viewport);
        args.push("--no-pdf-header-footer".into());
        let mut arg = OsString::from("--print-to-pdf=");
        arg.push(&pdf);
        args.push(arg);
        self.run(args, &scratch.page).await?;

        let bytes = tokio::fs::read(&pdf)
            .await
            .map_err(|e| BackendError::ExportFailed(format!("no PDF produced: {e}")))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(BackendError::ExportFailed("browser output is not a PDF".into()));
        }
        tokio::fs::write(output, &bytes)
            .await
            .map_err(|e| BackendError::ExportFailed(format!("{}: {e}", output.display())))
    }
}

/// Temp directory holding the page being captured; removed on drop.
struct Scratch {
    dir: tempfile::TempDir,
    page: PathBuf,
}

impl Scratch {
    async fn new(html: &str) -> Result<Self, String> {
        let dir = tempfile::Builder::new()
            .prefix("contact2html-")
            .tempdir()
            .map_err(|e| format!("temp dir: {e}"))?;
        let page = dir.path().join("page.html");
        tokio::fs::write(&page, html)
            .await
            .map_err(|e| format!("temp page: {e}"))?;
        Ok(Self { dir, page })
    }
}

fn tail(s: &str, max: usize) -> &str {
    let s = s.trim();
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// Backend for `config`: the injected one, else a headless browser.
pub fn resolve_backend(config: &GenerationConfig) -> Result<Arc<dyn RenderBackend>, BackendError> {
    if let Some(backend) = &config.backend {
        return Ok(Arc::clone(backend));
    }
    Ok(Arc::new(HeadlessBrowser::from_config(config)?))
}

// ── Image helpers ────────────────────────────────────────────────────────

/// Drop trailing rows that match the bottom-left pixel, keeping at least
/// `min_height` rows.
pub fn trim_trailing_background(img: &DynamicImage, min_height: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width == 0 || height <= min_height {
        return img.clone();
    }
    let rgba = img.to_rgba8();
    let background = *rgba.get_pixel(0, height - 1);

    let mut content_end = height;
    while content_end > min_height {
        let row = content_end - 1;
        if (0..width).any(|x| !close(rgba.get_pixel(x, row), &background)) {
            break;
        }
        content_end -= 1;
    }
    img.crop_imm(0, 0, width, content_end.max(min_height))
}

fn close(a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
    a.0.iter().zip(b.0.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
}

/// Cut an image into `sheet_height` slices; the last one is padded white.
pub fn slice_into_pages(img: &DynamicImage, sheet_height: u32) -> Vec<DynamicImage> {
    let (width, height) = img.dimensions();
    if sheet_height == 0 || height == 0 {
        return vec![img.clone()];
    }
    let mut pages = Vec::new();
    let mut y = 0;
    while y < height {
        let h = sheet_height.min(height - y);
        let slice = img.crop_imm(0, y, width, h);
        if h == sheet_height {
            pages.push(slice);
        } else {
            let mut sheet = RgbaImage::from_pixel(width, sheet_height, Rgba([255, 255, 255, 255]));
            image::imageops::overlay(&mut sheet, &slice.to_rgba8(), 0, 0);
            pages.push(DynamicImage::ImageRgba8(sheet));
        }
        y += h;
    }
    pages
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} page → {} bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}
