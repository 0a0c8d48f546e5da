//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! API keys are loaded from the GEMINI_API_KEYS env var or api_keys_file,
//! never stored in the TOML directly to avoid leaking secrets.

use credential_pool::PoolSettings;
use orchestrator::OrchestratorSettings;
use provider::ApiKey;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Env var holding a comma-separated list of API keys.
pub const API_KEYS_ENV: &str = "GEMINI_API_KEYS";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Path to a file with one API key per line (alternative to GEMINI_API_KEYS)
    #[serde(default)]
    pub api_keys_file: Option<PathBuf>,
    #[serde(skip)]
    pub api_keys: Vec<ApiKey>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

/// Upstream API settings
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Credential pool timing
#[derive(Debug, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_daily_quota_cooldown_secs")]
    pub daily_quota_cooldown_secs: u64,
    /// How often the background task looks for daily quotas to restore
    #[serde(default = "default_reset_interval_secs")]
    pub reset_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_spacing_ms: default_min_spacing_ms(),
            cooldown_secs: default_cooldown_secs(),
            daily_quota_cooldown_secs: default_daily_quota_cooldown_secs(),
            reset_interval_secs: default_reset_interval_secs(),
        }
    }
}

impl PoolConfig {
    pub fn settings(&self) -> PoolSettings {
        PoolSettings {
            min_spacing: Duration::from_millis(self.min_spacing_ms),
            cooldown: Duration::from_secs(self.cooldown_secs),
            daily_quota_cooldown: Duration::from_secs(self.daily_quota_cooldown_secs),
        }
    }

    pub fn reset_interval(&self) -> Duration {
        Duration::from_secs(self.reset_interval_secs)
    }
}

fn default_base_url() -> String {
    provider::gemini::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    provider::gemini::DEFAULT_MODEL.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_min_spacing_ms() -> u64 {
    4_000
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_daily_quota_cooldown_secs() -> u64 {
    24 * 60 * 60
}

fn default_reset_interval_secs() -> u64 {
    600
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// API key resolution order:
    /// 1. GEMINI_API_KEYS env var (comma separated)
    /// 2. api_keys_file path from config (one per line, `#` comments allowed)
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        if let Ok(raw) = std::env::var(API_KEYS_ENV) {
            config.api_keys = parse_keys(raw.split(','));
            if config.api_keys.is_empty() {
                return Err(common::Error::Config(format!(
                    "{API_KEYS_ENV} is set but contains no keys"
                )));
            }
        } else if let Some(ref key_file) = config.api_keys_file {
            let raw = std::fs::read_to_string(key_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read api_keys_file {}: {e}",
                    key_file.display()
                ))
            })?;
            config.api_keys = parse_keys(raw.lines().filter(|l| !l.trim_start().starts_with('#')));
        }

        if config.api_keys.is_empty() {
            return Err(common::Error::Config(format!(
                "no API keys configured; set {API_KEYS_ENV} or api_keys_file"
            )));
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        // Validate base_url is a valid URL with http(s) scheme
        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "provider.base_url must start with http:// or https://, got: {}",
                self.provider.base_url
            )));
        }

        if self.provider.model.trim().is_empty() {
            return Err(common::Error::Config("provider.model must not be empty".into()));
        }

        if self.pool.min_spacing_ms == 0 {
            return Err(common::Error::Config(
                "pool.min_spacing_ms must be greater than 0".into(),
            ));
        }

        if self.pool.reset_interval_secs == 0 {
            return Err(common::Error::Config(
                "pool.reset_interval_secs must be greater than 0".into(),
            ));
        }

        if self.orchestrator.timeout_base_secs == 0 {
            return Err(common::Error::Config(
                "orchestrator.timeout_base_secs must be greater than 0".into(),
            ));
        }

        let ratio = self.orchestrator.shrink_ratio;
        if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
            return Err(common::Error::Config(format!(
                "orchestrator.shrink_ratio must be in (0, 1], got: {ratio}"
            )));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("content-gen.toml")
    }
}

/// Trimmed, non-empty, de-duplicated keys in their original order.
fn parse_keys<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<ApiKey> {
    let mut seen: Vec<&str> = Vec::new();
    let mut keys = Vec::new();
    for key in raw.map(str::trim).filter(|k| !k.is_empty()) {
        if seen.contains(&key) {
            warn!("duplicate API key ignored");
            continue;
        }
        seen.push(key);
        keys.push(ApiKey::new(key.to_owned()));
    }
    keys
}
