//! Error types for pool operations

/// Errors from pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("all {total} credentials are permanently rejected; replace the API keys")]
    AllCredentialsDead { total: usize },
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
