//! Resilient generate operations over a shared credential pool
//!
//! `RequestOrchestrator` returns a complete response; `StreamOrchestrator`
//! yields it chunk by chunk. Both rotate through the `CredentialPool`, honor
//! per-credential spacing and cooldowns, classify provider failures and
//! retry up to one attempt per credential plus one:
//!
//! - rejected key → credential marked dead, next credential immediately
//! - rate limit → credential cooled down, jittered backoff, next credential
//! - server fault or stalled stream → jittered backoff, next credential
//! - timeout → prompt tail dropped, next credential
//! - unparseable JSON → next credential; on the final attempt one extra
//!   call with a more deterministic configuration
//!
//! Only exhaustion, an all-dead pool and an all-daily-exhausted pool reach
//! the caller (plus `StreamInterrupted` for streams that already delivered
//! output).

pub mod backoff;
mod dispatch;
pub mod error;
pub mod metrics;
pub mod options;
pub mod repair;
pub mod request;
pub mod settings;
pub mod stream;

#[cfg(test)]
mod test_support;

pub use backoff::BackoffPolicy;
pub use error::{Error, Failure, FailureClass, Result};
pub use options::{GenerateOptions, StreamOptions};
pub use repair::{RepairFailed, parse_repaired, repair};
pub use request::RequestOrchestrator;
pub use settings::{OrchestratorSettings, shrink_prompt};
pub use stream::{StreamOrchestrator, TextStream};
