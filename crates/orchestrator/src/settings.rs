//! Orchestrator tuning
//!
//! Every field has a default, so an empty `[orchestrator]` TOML table (or
//! none at all) yields a working configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::backoff::BackoffPolicy;

/// Retry, timeout and fallback knobs shared by both orchestrators.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Timeout floor for any provider call.
    pub timeout_base_secs: u64,
    /// Extra timeout per 1000 prompt characters.
    pub timeout_per_kchar_ms: u64,
    /// Timeout ceiling regardless of prompt size.
    pub timeout_max_secs: u64,
    pub rate_limit_backoff: BackoffPolicy,
    pub server_backoff: BackoffPolicy,
    /// Longest single wait on a cooling credential before moving on.
    pub cooldown_wait_cap_secs: u64,
    /// Longest gap between two stream chunks before the stream counts as stalled.
    pub stream_stall_secs: u64,
    /// Fraction of the prompt kept after a timeout.
    pub shrink_ratio: f64,
    /// Temperature for the last-resort structured-output call.
    pub fallback_temperature: f32,
    /// Model for the last-resort structured-output call; `None` keeps the
    /// provider default.
    pub fallback_model: Option<String>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            timeout_base_secs: 45,
            timeout_per_kchar_ms: 2_000,
            timeout_max_secs: 180,
            rate_limit_backoff: BackoffPolicy::new(2_000, 30_000),
            server_backoff: BackoffPolicy::new(1_000, 15_000),
            cooldown_wait_cap_secs: 30,
            stream_stall_secs: 45,
            shrink_ratio: 0.6,
            fallback_temperature: 0.1,
            fallback_model: None,
        }
    }
}

impl OrchestratorSettings {
    /// Provider-call timeout for a prompt of `prompt_chars` characters:
    /// base floor plus a linear term, capped at the maximum.
    pub fn call_timeout(&self, prompt_chars: usize) -> Duration {
        let base = Duration::from_secs(self.timeout_base_secs);
        let linear = Duration::from_millis(
            (prompt_chars as u64).saturating_mul(self.timeout_per_kchar_ms) / 1000,
        );
        (base + linear).min(Duration::from_secs(self.timeout_max_secs))
    }

    pub fn cooldown_wait_cap(&self) -> Duration {
        Duration::from_secs(self.cooldown_wait_cap_secs)
    }

    pub fn stream_stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_stall_secs)
    }
}

/// Keep the head of `prompt`, dropping the tail so roughly `ratio` of its
/// characters remain. Never cuts inside a UTF-8 sequence.
pub fn shrink_prompt(prompt: &str, ratio: f64) -> String {
    let total = prompt.chars().count();
    let keep = ((total as f64) * ratio.clamp(0.0, 1.0)).floor() as usize;
    prompt.chars().take(keep.max(1).min(total)).collect()
}
