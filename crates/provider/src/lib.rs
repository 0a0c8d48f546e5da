//! Provider abstraction for hosted text-generation APIs
//!
//! Defines the `TextProvider` trait that decouples orchestration logic from a
//! concrete LLM vendor, plus the typed `CallError` taxonomy every provider
//! reports failures with. Orchestrators decide retry, cooldown or credential
//! disablement from the error variant alone; they never inspect messages.
//!
//! `GeminiProvider` is the production implementation (Google Generative
//! Language API, non-streaming and SSE streaming).

pub mod classify;
pub mod gemini;

pub use classify::{classify_status, is_daily_quota};
pub use gemini::GeminiProvider;

use futures_util::Stream;
use std::future::Future;
use std::pin::Pin;

/// A provider API key. Redacted in logs, zeroed on drop.
pub type ApiKey = common::Secret<String>;

/// Typed classification of a failed provider call.
///
/// Produced by the provider layer from the HTTP status and error body:
/// - `Unauthorized` permanently invalidates the credential that was used
/// - `RateLimited` cools the credential down; `daily` marks a per-day quota
/// - `Server` is a provider-side fault, retryable after backoff
/// - `Timeout` means no complete response arrived in time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("credential rejected: {0}")]
    Unauthorized(String),

    #[error("rate limited (daily quota: {daily}): {message}")]
    RateLimited { daily: bool, message: String },

    #[error("provider fault: {message}")]
    Server { status: Option<u16>, message: String },

    #[error("provider call timed out: {0}")]
    Timeout(String),
}

/// Result alias for provider calls.
pub type Result<T> = std::result::Result<T, CallError>;

/// Generation options recognized by every provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Overrides the provider's configured default model for this call.
    pub model: Option<String>,
    /// Sampling temperature; `None` leaves the provider default in place.
    pub temperature: Option<f32>,
    /// Ask the provider for an `application/json` response body.
    pub json_mode: bool,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Attach the provider's web search grounding tool.
    pub use_external_retrieval: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            json_mode: false,
            max_output_tokens: 8192,
            use_external_retrieval: false,
        }
    }
}

/// One fully-specified generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub config: GenerationConfig,
}

/// Incremental text chunks from a streaming call. Finite, not restartable.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Abstraction over a hosted text-generation API.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn TextProvider>`). Implementations hold no credential state: the
/// key to use is chosen by the caller for each call.
pub trait TextProvider: Send + Sync {
    /// Identifier for logging (e.g. "gemini")
    fn id(&self) -> &str;

    /// Generate the complete response text for `request`.
    fn generate<'a>(
        &'a self,
        key: &'a ApiKey,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Open a streaming generation.
    ///
    /// Errors detected before the first chunk (bad status, rejected key) are
    /// returned from the future; errors after that arrive as stream items.
    fn generate_stream<'a>(
        &'a self,
        key: &'a ApiKey,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChunkStream>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_error_display_carries_message() {
        let err = CallError::RateLimited {
            daily: true,
            message: "Quota exceeded for requests per day".into(),
        };
        let text = err.to_string();
        assert!(text.contains("daily quota: true"), "got: {text}");
        assert!(text.contains("requests per day"), "got: {text}");
    }

    #[test]
    fn default_config_leaves_temperature_to_provider() {
        let config = GenerationConfig::default();
        assert!(config.temperature.is_none());
        assert!(config.model.is_none());
        assert!(!config.json_mode);
        assert!(!config.use_external_retrieval);
    }
}
