//! Shared types for the content generation workspace
//!
//! `Secret` keeps provider API keys out of logs; `Error` covers configuration
//! loading failures shared by every crate that reads TOML.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
