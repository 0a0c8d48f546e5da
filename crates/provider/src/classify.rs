//! Error classification for provider HTTP responses
//!
//! Maps a status code plus error body onto the `CallError` taxonomy. This is
//! the only place where provider error text is inspected; everything above
//! the provider layer works with the typed result.

use crate::CallError;

/// Phrases in a 429 body that identify a per-day quota rather than a
/// short per-minute rate limit.
const DAILY_QUOTA_PATTERNS: &[&str] = &[
    "per day",
    "perday",
    "daily limit",
    "daily quota",
];

/// Phrases the provider uses when it answers 400 for a bad or revoked key.
const INVALID_KEY_PATTERNS: &[&str] = &[
    "api key not valid",
    "api_key_invalid",
    "api key expired",
    "api key was reported as leaked",
];

/// Longest body excerpt carried in an error message.
const MAX_MESSAGE_LEN: usize = 300;

/// Whether a rate-limit body refers to a daily quota.
pub fn is_daily_quota(body: &str) -> bool {
    let lower = body.to_lowercase();
    DAILY_QUOTA_PATTERNS.iter().any(|p| lower.contains(p))
}

fn is_invalid_key(body: &str) -> bool {
    let lower = body.to_lowercase();
    INVALID_KEY_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Classify an upstream error by HTTP status and response body.
///
/// 401/403 and the provider's "invalid key" 400 are `Unauthorized`. 429, or
/// any body reporting `RESOURCE_EXHAUSTED`, is `RateLimited`. Everything else
/// (408, 5xx, unknown statuses) is a retryable `Server` fault.
pub fn classify_status(status: u16, body: &str) -> CallError {
    let message = error_message(body);
    match status {
        401 | 403 => CallError::Unauthorized(message),
        400 if is_invalid_key(body) => CallError::Unauthorized(message),
        429 => CallError::RateLimited {
            daily: is_daily_quota(body),
            message,
        },
        _ if body.contains("RESOURCE_EXHAUSTED") => CallError::RateLimited {
            daily: is_daily_quota(body),
            message,
        },
        _ => CallError::Server {
            status: Some(status),
            message,
        },
    }
}

/// Pull `error.message` out of a JSON error body, falling back to a trimmed
/// excerpt of the raw body.
pub(crate) fn error_message(body: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });
    let message = extracted.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return "<no body>".to_string();
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        let cut: String = message.chars().take(MAX_MESSAGE_LEN).collect();
        return format!("{cut}...");
    }
    message
}
