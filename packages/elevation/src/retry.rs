//! HTTP retry helper for transient errors.
//!
//! Elevation lookups go through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every request gets
//! bounded retry with exponential backoff for transient failures
//! (timeouts, connection resets, server errors, rate limiting). The
//! `build_request` closure is called on each attempt to construct a
//! fresh builder, since builders are consumed by `.send()`.

use std::time::Duration;

use crate::ElevationError;

/// Maximum retry attempts for transient HTTP errors. With exponential
/// backoff (2s, 4s, 8s) the total wait before giving up is 14 seconds.
const MAX_RETRIES: u32 = 3;

/// Sends an HTTP request and parses the response body as JSON.
///
/// Retries transient failures (connection errors, timeouts, HTTP 429,
/// HTTP 5xx) up to [`MAX_RETRIES`] times. Does **not** retry other 4xx —
/// those are permanent.
///
/// # Errors
///
/// Returns [`ElevationError::Transient`] when retries are exhausted,
/// [`ElevationError::Http`] for permanent request failures, and
/// [`ElevationError::Decode`] when the body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, ElevationError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_message = String::new();

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_secs(1_u64 << attempt);
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    last_message = e.to_string();
                    continue;
                }
                return Err(ElevationError::Http(e));
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if attempt < MAX_RETRIES {
                log::warn!("  HTTP {status}, retrying");
                last_message = format!("HTTP {status}");
                continue;
            }
            last_message = format!("HTTP {status}");
            break;
        }

        if status.is_client_error() {
            return Err(ElevationError::Decode {
                message: format!("HTTP {status}"),
            });
        }

        let text = response.text().await.map_err(ElevationError::Http)?;
        return serde_json::from_str(&text).map_err(|e| ElevationError::Decode {
            message: format!("JSON parse failed: {e}"),
        });
    }

    Err(ElevationError::Transient {
        message: format!("request failed after {MAX_RETRIES} retries: {last_message}"),
    })
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}
