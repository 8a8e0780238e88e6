//! Error types for try-on generation.

use std::time::Duration;

/// Longest error body kept from an API response.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while preparing or generating try-on images.
#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded. Surfaced as-is; nothing retries.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Billing is not enabled for the API key.
    #[error("billing error: {0}")]
    Billing(String),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Uploaded file is not a PNG, JPEG or WebP image.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading an upload or saving a result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model answered but the answer had no usable image.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type alias for try-on operations.
pub type Result<T> = std::result::Result<T, TryOnError>;

/// Reads a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Redacts anything that looks like an API key and caps the length of an
/// error body before it ends up in a user-visible message.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_inclusive(|c: char| c.is_whitespace() || c == '"' || c == '=' || c == '&')
        .map(|token| {
            let word = token.trim_end_matches(|c: char| {
                c.is_whitespace() || c == '"' || c == '=' || c == '&'
            });
            if word.starts_with("AIza") && word.len() >= 30 {
                token.replacen(word, "[REDACTED]", 1)
            } else {
                token.to_string()
            }
        })
        .collect();
    let message = redacted.concat();
    let message = message.trim();

    if message.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        message.to_string()
    }
}
