//! Fire-and-check trigger for an external workflow endpoint.
//!
//! The endpoint is pinged with a GET carrying `triggered_at` and `source`
//! query parameters. If the GET cannot be sent at all, the same payload is
//! retried once as a JSON POST. A transport failure on both attempts does
//! not prove the workflow did not run, so it is reported as
//! [`WebhookOutcome::PossiblyTriggered`] rather than as an error.

use crate::error::ProfileError;
use crate::output::Status;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Value sent in the `source` field.
pub const WEBHOOK_SOURCE: &str = "contact2html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WebhookMethod {
    Get,
    Post,
}

impl fmt::Display for WebhookMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookMethod::Get => f.write_str("GET"),
            WebhookMethod::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// The endpoint answered 2xx.
    Triggered { method: WebhookMethod },
    /// The endpoint answered with a non-2xx status.
    Rejected { status: u16 },
    /// Neither request got an answer; the workflow may still have run.
    PossiblyTriggered { detail: String },
}

impl WebhookOutcome {
    pub fn status(&self) -> Status {
        match self {
            WebhookOutcome::Triggered { method } => {
                Status::success(format!("Workflow triggered successfully ({method})"))
            }
            WebhookOutcome::Rejected { status } => {
                Status::error(format!("Workflow trigger failed: HTTP {status}"))
            }
            WebhookOutcome::PossiblyTriggered { detail } => Status::warning(format!(
                "Could not confirm the workflow trigger ({detail}). It may still have been \
triggered. Check the workflow logs."
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct TriggerPayload<'a> {
    triggered_at: String,
    source: &'a str,
}

/// Trigger the workflow at `url`.
///
/// # Errors
/// Only an invalid URL is an error; every network result maps to an outcome.
pub async fn trigger_workflow(url: &str, timeout_secs: u64) -> Result<WebhookOutcome, ProfileError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| ProfileError::InvalidInput {
        input: url.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ProfileError::InvalidInput {
            input: url.to_string(),
        });
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProfileError::Internal(format!("HTTP client: {e}")))?;

    let payload = TriggerPayload {
        triggered_at: chrono::Utc::now().to_rfc3339(),
        source: WEBHOOK_SOURCE,
    };

    info!("Triggering workflow: {}", parsed);
    let get = client.get(parsed.clone()).query(&payload).send().await;
    let (method, response) = match get {
        Ok(response) => (WebhookMethod::Get, response),
        Err(get_err) => {
            warn!("GET trigger failed ({}); retrying as POST", get_err);
            match client.post(parsed).json(&payload).send().await {
                Ok(response) => (WebhookMethod::Post, response),
                Err(post_err) => {
                    warn!("POST trigger failed: {}", post_err);
                    return Ok(WebhookOutcome::PossiblyTriggered {
                        detail: post_err.to_string(),
                    });
                }
            }
        }
    };

    let status = response.status();
    if status.is_success() {
        Ok(WebhookOutcome::Triggered { method })
    } else {
        Ok(WebhookOutcome::Rejected {
            status: status.as_u16(),
        })
    }
}
