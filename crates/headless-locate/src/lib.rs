//! # headless-locate
//!
//! Find a Chromium-family browser executable that can run with `--headless`,
//! so that callers printing HTML to PDF or taking page screenshots do not
//! need to hard-code an install location per platform.
//!
//! ## How it works
//!
//! On first call to [`find_browser`]:
//!
//! 1. Honours `CONTACT2HTML_BROWSER` when it points at an existing file.
//! 2. Walks every `PATH` entry looking for the well-known executable names
//!    (`chromium`, `google-chrome`, `microsoft-edge`, …).
//! 3. Falls back to the standard install locations for the current OS.
//!
//! The resolved path is memoised for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use headless_locate::{find_browser, profile_dir};
//!
//! let browser = find_browser().expect("no headless-capable browser installed");
//! let profile = profile_dir().expect("profile directory");
//! println!("{} --user-data-dir={}", browser.display(), profile.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `CONTACT2HTML_BROWSER` — explicit browser executable; skips the search.
//! - `CONTACT2HTML_CACHE_DIR` — override the base of the scratch profile dir.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable naming an explicit browser executable.
pub const BROWSER_ENV: &str = "CONTACT2HTML_BROWSER";

/// Environment variable overriding the cache base directory.
pub const CACHE_DIR_ENV: &str = "CONTACT2HTML_CACHE_DIR";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by headless-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The current OS has no known browser install layout.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No candidate executable exists on this machine.
    #[error(
        "No Chromium-family browser found (searched {searched} locations).\n\
Install Chromium or Google Chrome, or set {BROWSER_ENV}=/path/to/browser."
    )]
    NotFound { searched: usize },

    /// Could not create the scratch profile directory.
    #[error("Browser profile directory error: {0}")]
    ProfileDir(#[source] std::io::Error),
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Executable names looked up on `PATH`.
    executable_names: &'static [&'static str],
    /// Absolute install locations checked after `PATH`.
    install_paths: &'static [&'static str],
}

fn detect_platform() -> Result<PlatformInfo, LocateError> {
    let os = std::env::consts::OS;

    match os {
        "linux" | "freebsd" | "openbsd" => Ok(PlatformInfo {
            executable_names: &[
                "chromium",
                "chromium-browser",
                "google-chrome",
                "google-chrome-stable",
                "microsoft-edge",
                "chrome",
            ],
            install_paths: &[
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/usr/bin/google-chrome",
                "/snap/bin/chromium",
                "/opt/google/chrome/chrome",
            ],
        }),
        "macos" => Ok(PlatformInfo {
            executable_names: &["chromium", "google-chrome", "chrome"],
            install_paths: &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
                "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            ],
        }),
        "windows" => Ok(PlatformInfo {
            executable_names: &["chrome.exe", "msedge.exe", "chromium.exe"],
            install_paths: &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
            ],
        }),
        other => Err(LocateError::UnsupportedPlatform {
            os: other.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }),
    }
}

// ── Profile directory resolution ─────────────────────────────────────────────

/// Returns the scratch `--user-data-dir` used for headless runs, creating it
/// if needed.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/contact2html/browser-profile/`
/// - **Linux**: `~/.cache/contact2html/browser-profile/`
/// - **Windows**: `%LOCALAPPDATA%\contact2html\browser-profile\`
///
/// Override the base by setting `CONTACT2HTML_CACHE_DIR`.
pub fn profile_dir() -> Result<PathBuf, LocateError> {
    let dir = profile_dir_path();
    std::fs::create_dir_all(&dir).map_err(LocateError::ProfileDir)?;
    Ok(dir)
}

fn profile_dir_path() -> PathBuf {
    if let Ok(override_dir) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(override_dir).join("browser-profile");
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("contact2html").join("browser-profile")
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the browser executable, searching on first call only.
///
/// Safe to call from multiple threads; a racing second search resolves to
/// the same path.
pub fn find_browser() -> Result<PathBuf, LocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = search()?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` when a browser can be located without error.
pub fn is_browser_available() -> bool {
    find_browser().is_ok()
}

/// Validates an explicit browser path supplied by the caller.
pub fn browser_from_path(path: &Path) -> Result<PathBuf, LocateError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(LocateError::NotFound { searched: 1 })
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn search() -> Result<PathBuf, LocateError> {
    // 1. Environment variable override.
    if let Ok(env_path) = std::env::var(BROWSER_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_file() {
            return Ok(p);
        }
        // Fall through: env var set but file missing → keep searching.
        eprintln!(
            "headless-locate: {BROWSER_ENV} '{}' not found; searching PATH …",
            p.display()
        );
    }

    let info = detect_platform()?;
    let path_dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();

    // 2. PATH lookup in candidate priority order.
    if let Some(found) = find_on_path(&path_dirs, info.executable_names) {
        return Ok(found);
    }

    // 3. Well-known install locations.
    if let Some(found) = info
        .install_paths
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
    {
        return Ok(found);
    }

    Err(LocateError::NotFound {
        searched: path_dirs.len() * info.executable_names.len() + info.install_paths.len(),
    })
}

/// First `dir/name` that exists, iterating names before directories so the
/// preferred browser wins even when it sits later on `PATH`.
fn find_on_path(dirs: &[PathBuf], names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .flat_map(|name| dirs.iter().map(move |dir| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
