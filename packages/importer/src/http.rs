//! HTTP client wrapper for downloading the division-code listing.

use std::io::Read;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::{DEFAULT_MAX_RESPONSE_SIZE, HTTP_TIMEOUT_SECS};
use crate::error::{ImporterError, Result};

/// User agent string identifying this importer.
const USER_AGENT: &str = concat!("divcode-importer/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Create a configured HTTP client.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download a URL with retry logic and the default size limit.
pub fn download_bytes_default(client: &Client, url: &str) -> Result<Vec<u8>> {
    download_bytes(client, url, DEFAULT_MAX_RESPONSE_SIZE)
}

/// Download content from a URL with retry logic.
///
/// Uses exponential backoff for transient failures (network errors, 5xx responses).
/// Client errors (4xx) fail immediately.
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to download from
/// * `max_size` - Maximum accepted body size in bytes
pub fn download_bytes(client: &Client, url: &str, max_size: u64) -> Result<Vec<u8>> {
    let mut last_error: Option<String> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 500ms, 1000ms
            let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
            tracing::debug!(attempt, delay_ms = delay, "Retrying after delay");
            thread::sleep(Duration::from_millis(delay));
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                let response = response.error_for_status()?;

                if let Some(size) = response.content_length() {
                    if size > max_size {
                        return Err(ImporterError::ResponseTooLarge {
                            size,
                            limit: max_size,
                        });
                    }
                }

                // Content-Length may be absent or wrong, so cap the read as well
                let mut body = Vec::new();
                response
                    .take(max_size + 1)
                    .read_to_end(&mut body)?;
                if body.len() as u64 > max_size {
                    return Err(ImporterError::ResponseTooLarge {
                        size: body.len() as u64,
                        limit: max_size,
                    });
                }
                return Ok(body);
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(ImporterError::Http(e));
            }
        }
    }

    Err(ImporterError::RetriesExhausted {
        attempts: MAX_RETRIES,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Decode a response body as UTF-8, replacing invalid sequences.
pub fn bytes_to_string(bytes: &[u8], what: &str) -> String {
    match String::from_utf8_lossy(bytes) {
        std::borrow::Cow::Borrowed(s) => s.to_string(),
        std::borrow::Cow::Owned(s) => {
            tracing::warn!(source = what, "Invalid UTF-8 replaced while decoding");
            s
        }
    }
}
