//! Optional image inlining: photo / logo URL → base64 `data:` URI.
//!
//! A document with inlined images renders identically offline and gives the
//! browser nothing to wait for during the settle step. Any image that cannot
//! be downloaded keeps its original URL; inlining never fails a record.

use crate::pipeline::normalize::ProfileRecord;
use crate::record::is_present;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;
use tracing::{debug, warn};

/// Images larger than this stay remote.
pub const MAX_INLINE_BYTES: usize = 5 * 1024 * 1024;

/// Replace the photo and logo URLs of `record` with data URIs where possible.
///
/// Returns the number of images inlined.
pub async fn inline_images(record: &mut ProfileRecord, timeout_secs: u64) -> usize {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!("Image inlining disabled: {}", e);
            return 0;
        }
    };

    let mut inlined = 0;
    for url in [&mut record.photo_url, &mut record.company_logo_url] {
        if !is_present(url) || !is_remote(url) {
            continue;
        }
        match fetch_data_uri(&client, url, MAX_INLINE_BYTES).await {
            Ok(data_uri) => {
                debug!("Inlined {} ({} bytes as data URI)", url, data_uri.len());
                *url = data_uri;
                inlined += 1;
            }
            Err(reason) => warn!("Keeping remote image {}: {}", url, reason),
        }
    }
    inlined
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

async fn fetch_data_uri(
    client: &reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<String, String> {
    let mut response = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let header_mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
    if let Some(declared) = response.content_length().filter(|&n| n > limit as u64) {
        return Err(format!("{declared} bytes exceeds inline limit"));
    }

    // Content-Length may be absent or wrong; enforce the cap while reading.
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
        if bytes.len() + chunk.len() > limit {
            return Err(format!("more than {limit} bytes, exceeds inline limit"));
        }
        bytes.extend_from_slice(&chunk);
    }
    let mime = image_mime(header_mime.as_deref(), &bytes).ok_or("not an image")?;
    Ok(to_data_uri(mime, &bytes))
}

/// The content type to embed, preferring an `image/*` header and otherwise
/// sniffing the bytes.
pub fn image_mime(header: Option<&str>, bytes: &[u8]) -> Option<String> {
    if let Some(h) = header.filter(|h| h.starts_with("image/")) {
        return Some(h.to_string());
    }
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

pub fn to_data_uri(mime: impl AsRef<str>, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime.as_ref(), STANDARD.encode(bytes))
}
