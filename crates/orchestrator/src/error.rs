//! Orchestration error taxonomy
//!
//! `Failure` is what a single attempt can end with. Failures are absorbed by
//! the retry loop and never reach the caller on their own. `Error` holds the
//! only conditions that do propagate, each phrased so an operator knows what
//! to do about it.

use std::time::Duration;

use provider::CallError;
use thiserror::Error;

/// Outcome of one failed attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    #[error(transparent)]
    Call(#[from] CallError),

    #[error("structured output could not be repaired: {excerpt}")]
    MalformedOutput { excerpt: String },

    #[error("stream produced no chunk for {0:?}")]
    Stalled(Duration),

    #[error("credential {credential} still cooling, {remaining:?} left")]
    CoolingDown {
        credential: usize,
        remaining: Duration,
    },
}

/// Coarse failure classes used for decisions, logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Authorization,
    RateLimited,
    DailyQuota,
    ServerFault,
    Timeout,
    MalformedOutput,
    Stalled,
    CoolingDown,
}

impl FailureClass {
    pub fn label(&self) -> &'static str {
        match self {
            FailureClass::Authorization => "authorization",
            FailureClass::RateLimited => "rate_limited",
            FailureClass::DailyQuota => "daily_quota",
            FailureClass::ServerFault => "server_fault",
            FailureClass::Timeout => "timeout",
            FailureClass::MalformedOutput => "malformed_output",
            FailureClass::Stalled => "stalled",
            FailureClass::CoolingDown => "cooling_down",
        }
    }
}

impl Failure {
    pub fn class(&self) -> FailureClass {
        match self {
            Failure::Call(CallError::Unauthorized(_)) => FailureClass::Authorization,
            Failure::Call(CallError::RateLimited { daily: true, .. }) => FailureClass::DailyQuota,
            Failure::Call(CallError::RateLimited { daily: false, .. }) => FailureClass::RateLimited,
            Failure::Call(CallError::Server { .. }) => FailureClass::ServerFault,
            Failure::Call(CallError::Timeout(_)) => FailureClass::Timeout,
            Failure::MalformedOutput { .. } => FailureClass::MalformedOutput,
            Failure::Stalled(_) => FailureClass::Stalled,
            Failure::CoolingDown { .. } => FailureClass::CoolingDown,
        }
    }

    /// Build a `MalformedOutput` carrying the first 200 characters of `raw`.
    pub(crate) fn malformed(raw: &str) -> Self {
        let mut excerpt: String = raw.chars().take(200).collect();
        if excerpt.len() < raw.len() {
            excerpt.push_str("...");
        }
        Failure::MalformedOutput { excerpt }
    }
}

/// Conditions surfaced to the caller of a generate operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(
        "generation failed after {attempts} attempts, last failure: {last}; \
         retry later or reduce the prompt size"
    )]
    Exhausted { attempts: u32, last: Failure },

    #[error(
        "all {total} API keys were rejected by the provider; \
         replace the configured credentials"
    )]
    AllCredentialsDead { total: usize },

    #[error(
        "every usable API key has exhausted its daily quota; \
         wait for the quota reset or add credentials"
    )]
    AllDailyQuotaExhausted,

    #[error(
        "stream interrupted after {chunks} chunks: {cause}; \
         partial output was delivered, restart the request to retry"
    )]
    StreamInterrupted { chunks: usize, cause: Failure },
}

impl From<credential_pool::Error> for Error {
    fn from(err: credential_pool::Error) -> Self {
        match err {
            credential_pool::Error::AllCredentialsDead { total } => {
                Error::AllCredentialsDead { total }
            }
        }
    }
}

impl Error {
    /// True when the same request may succeed later without changing the
    /// configured credentials.
    pub fn is_retryable_later(&self) -> bool {
        !matches!(self, Error::AllCredentialsDead { .. })
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Exhausted { .. } => "exhausted",
            Error::AllCredentialsDead { .. } => "all_credentials_dead",
            Error::AllDailyQuotaExhausted => "all_daily_quota_exhausted",
            Error::StreamInterrupted { .. } => "stream_interrupted",
        }
    }
}

/// Result alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_errors_map_to_classes() {
        let cases = [
            (CallError::Unauthorized("revoked".into()), FailureClass::Authorization),
            (
                CallError::RateLimited {
                    daily: false,
                    message: "slow down".into(),
                },
                FailureClass::RateLimited,
            ),
            (
                CallError::RateLimited {
                    daily: true,
                    message: "per day".into(),
                },
                FailureClass::DailyQuota,
            ),
            (
                CallError::Server {
                    status: Some(503),
                    message: "overloaded".into(),
                },
                FailureClass::ServerFault,
            ),
            (CallError::Timeout("45s".into()), FailureClass::Timeout),
        ];
        for (call, class) in cases {
            assert_eq!(Failure::from(call).class(), class);
        }
        assert_eq!(Failure::Stalled(Duration::from_secs(1)).class().label(), "stalled");
    }

    #[test]
    fn malformed_excerpt_is_truncated() {
        let raw = "x".repeat(500);
        let Failure::MalformedOutput { excerpt } = Failure::malformed(&raw) else {
            panic!("expected MalformedOutput");
        };
        assert_eq!(excerpt.len(), 203);
        assert!(excerpt.ends_with("..."));

        let Failure::MalformedOutput { excerpt } = Failure::malformed("short") else {
            panic!("expected MalformedOutput");
        };
        assert_eq!(excerpt, "short");
    }

    #[test]
    fn messages_are_actionable() {
        let dead = Error::AllCredentialsDead { total: 3 }.to_string();
        assert!(dead.contains("replace the configured credentials"), "got: {dead}");

        let daily = Error::AllDailyQuotaExhausted.to_string();
        assert!(daily.contains("wait for the quota reset"), "got: {daily}");

        let exhausted = Error::Exhausted {
            attempts: 4,
            last: Failure::Call(CallError::Timeout("65s".into())),
        }
        .to_string();
        assert!(exhausted.contains("4 attempts"), "got: {exhausted}");
        assert!(exhausted.contains("timed out"), "got: {exhausted}");
    }

    #[test]
    fn only_dead_credentials_need_operator_action() {
        assert!(!Error::AllCredentialsDead { total: 1 }.is_retryable_later());
        assert!(Error::AllDailyQuotaExhausted.is_retryable_later());
        assert_eq!(Error::AllDailyQuotaExhausted.kind(), "all_daily_quota_exhausted");
    }

    #[test]
    fn pool_error_converts() {
        let err: Error = credential_pool::Error::AllCredentialsDead { total: 2 }.into();
        assert_eq!(err, Error::AllCredentialsDead { total: 2 });
    }
}
