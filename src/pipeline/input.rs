//! Input acquisition: turn a user-supplied URL or path into raw records.
//!
//! Three sources are recognised:
//!
//! * an HTTP(S) JSON endpoint, bounded by the configured fetch timeout;
//! * a local JSON file (same shape rules as the endpoint);
//! * a delimited text file with a header row (`.csv`, or `.tsv` for tabs).
//!
//! Every failure here happens before a batch starts and is returned as a
//! fatal [`ProfileError`].

use crate::error::ProfileError;
use crate::record::RawRecord;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Wrapper keys an endpoint may nest its record array under, in lookup order.
pub const WRAPPER_KEYS: [&str; 4] = ["data", "contacts", "results", "items"];

/// Records loaded from one source, plus a label for messages.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    pub records: Vec<RawRecord>,
    /// URL or file path the records came from.
    pub source_name: String,
}

impl LoadedRecords {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// How a local file will be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFormat {
    Json,
    Delimited(u8),
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load records from a URL or a local file.
pub async fn resolve_records(
    input: &str,
    timeout_secs: u64,
) -> Result<LoadedRecords, ProfileError> {
    let input = input.trim();
    if is_url(input) {
        return fetch_records(input, timeout_secs).await;
    }
    if input.is_empty() || input.contains("://") {
        return Err(ProfileError::InvalidInput {
            input: input.to_string(),
        });
    }
    load_local(Path::new(input)).await
}

/// Fetch records from a JSON endpoint.
pub async fn fetch_records(url: &str, timeout_secs: u64) -> Result<LoadedRecords, ProfileError> {
    info!("Fetching records from: {}", url);

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            ProfileError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ProfileError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(map_err)?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(map_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProfileError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(map_err)?;
    let records = parse_json_text(&body, url)?;
    info!("Fetched {} records", records.len());

    Ok(LoadedRecords {
        records,
        source_name: url.to_string(),
    })
}

/// Load a local JSON or delimited file.
pub async fn load_local(path: &Path) -> Result<LoadedRecords, ProfileError> {
    let bytes = read_local(path).await?;
    let source_name = path.display().to_string();

    let records = match detect_format(path, &bytes) {
        LocalFormat::Json => {
            let text = String::from_utf8_lossy(&bytes);
            parse_json_text(&text, &source_name)?
        }
        LocalFormat::Delimited(delimiter) => {
            let records = parse_delimited(&bytes, path, delimiter)?;
            if records.is_empty() {
                return Err(ProfileError::NoRecords { source_name });
            }
            records
        }
    };

    info!("Loaded {} records from {}", records.len(), source_name);
    Ok(LoadedRecords {
        records,
        source_name,
    })
}

/// Pick a parser from the extension, falling back to content sniffing.
pub fn detect_format(path: &Path, bytes: &[u8]) -> LocalFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => LocalFormat::Json,
        Some("csv") => LocalFormat::Delimited(b','),
        Some("tsv") | Some("tab") => LocalFormat::Delimited(b'\t'),
        _ => {
            // UTF-8 BOM bytes are skipped along with whitespace.
            let first = bytes
                .iter()
                .copied()
                .find(|b| !(b.is_ascii_whitespace() || matches!(b, 0xEF | 0xBB | 0xBF)));
            match first {
                Some(b'[') | Some(b'{') => LocalFormat::Json,
                _ => LocalFormat::Delimited(b','),
            }
        }
    }
}

/// Parse a JSON document and apply the array-or-wrapper shape rule.
pub fn parse_json_text(text: &str, source_name: &str) -> Result<Vec<RawRecord>, ProfileError> {
    let text = text.trim_start_matches('\u{feff}');
    let value: Value = serde_json::from_str(text).map_err(|e| ProfileError::MalformedJson {
        source_name: source_name.to_string(),
        detail: e.to_string(),
    })?;
    parse_response_data(value, source_name)
}

/// Accept a bare array, or an object whose first recognised wrapper key
/// holds an array. Every element must be an object; the list must not be empty.
pub fn parse_response_data(
    value: Value,
    source_name: &str,
) -> Result<Vec<RawRecord>, ProfileError> {
    let unexpected = || ProfileError::UnexpectedShape {
        source_name: source_name.to_string(),
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let key = WRAPPER_KEYS
                .iter()
                .find(|k| matches!(map.get(**k), Some(Value::Array(_))))
                .ok_or_else(unexpected)?;
            debug!("Records nested under '{}'", key);
            match map.remove(*key) {
                Some(Value::Array(items)) => items,
                _ => return Err(unexpected()),
            }
        }
        _ => return Err(unexpected()),
    };

    if items.is_empty() {
        return Err(ProfileError::NoRecords {
            source_name: source_name.to_string(),
        });
    }

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            _ => Err(unexpected()),
        })
        .collect()
}

/// Parse delimited text with a header row into string-valued records.
///
/// Rows may be shorter or longer than the header; missing cells are simply
/// absent and extra cells are ignored. Rows whose cells are all blank are
/// skipped.
pub fn parse_delimited(
    bytes: &[u8],
    path: &Path,
    delimiter: u8,
) -> Result<Vec<RawRecord>, ProfileError> {
    let malformed = |detail: String| ProfileError::MalformedCsv {
        path: path.to_path_buf(),
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(malformed("missing header row".to_string()));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| malformed(e.to_string()))?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), Value::String(cell.to_string())))
            .collect();
        records.push(record);
    }

    debug!("Parsed {} delimited rows from {}", records.len(), path.display());
    Ok(records)
}

async fn read_local(path: &Path) -> Result<Vec<u8>, ProfileError> {
    let path_buf: PathBuf = path.to_path_buf();
    if !path.exists() {
        return Err(ProfileError::FileNotFound { path: path_buf });
    }
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ProfileError::PermissionDenied { path: path_buf })
        }
        Err(_) => Err(ProfileError::FileNotFound { path: path_buf }),
    }
}
