//! Credential pool for a hosted LLM provider
//!
//! Holds a fixed set of provider API keys with per-key health state, hands
//! them out round-robin, and enforces per-key request spacing. The pool is
//! process-wide shared state: every orchestration call borrows credentials
//! from the same `Arc<CredentialPool>` and reports outcomes back to it.
//!
//! Credential lifecycle:
//! 1. Keys load at startup, every credential `Alive`
//! 2. `next()` rotates over credentials, never returning a `Dead` one
//! 3. Provider answers 429 → `Cooling` (short, or until reset for daily quotas)
//! 4. Provider rejects the key (401/403) → `Dead`, permanently
//! 5. Transient cooldown elapses → treated as `Alive` again
//! 6. Daily quotas clear only through an external reset (see `reset`)

pub mod error;
pub mod pool;
pub mod reset;

pub use error::{Error, Result};
pub use pool::{CredentialPool, CredentialState, PoolSettings, SelectedCredential};
pub use reset::spawn_quota_reset_task;
