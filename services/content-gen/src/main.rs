//! Content generator CLI
//!
//! Single-binary front end for the orchestrators:
//! 1. Loads TOML config and API keys
//! 2. Builds the credential pool, Gemini provider and orchestrators
//! 3. Reads the prompt from stdin
//! 4. Prints the generated text, or streams it chunk by chunk

mod config;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use credential_pool::{CredentialPool, spawn_quota_reset_task};
use futures_util::StreamExt;
use orchestrator::{GenerateOptions, RequestOrchestrator, StreamOptions, StreamOrchestrator};
use provider::{GeminiProvider, TextProvider};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Exit status when the failure is operational and a later retry may work
/// (sysexits EX_TEMPFAIL).
const EXIT_TEMPFAIL: i32 = 75;

/// Generate text from a prompt on stdin, rotating across Gemini API keys.
#[derive(Debug, Default, PartialEq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (falls back to CONFIG_PATH, then content-gen.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// System instruction sent with the prompt
    #[arg(long, value_name = "TEXT", default_value = "")]
    system: String,

    /// Request JSON output and repair it before printing
    #[arg(long, conflicts_with = "stream")]
    json: bool,

    /// Print chunks as they arrive
    #[arg(long)]
    stream: bool,

    /// Sampling temperature (provider default when unset)
    #[arg(long, value_name = "N")]
    temperature: Option<f32>,

    /// Output token cap
    #[arg(long, value_name = "N")]
    max_output_tokens: Option<u32>,

    /// Ground the answer with the provider's search tool
    #[arg(long)]
    search: bool,
}

impl Args {
    fn generate_options(&self) -> GenerateOptions {
        let defaults = GenerateOptions::default();
        GenerateOptions {
            temperature: self.temperature,
            json_mode: self.json,
            max_output_tokens: self.max_output_tokens.unwrap_or(defaults.max_output_tokens),
            use_external_retrieval: self.search,
        }
    }

    fn stream_options(&self) -> StreamOptions {
        let defaults = StreamOptions::default();
        StreamOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens.unwrap_or(defaults.max_output_tokens),
            use_external_retrieval: self.search,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr; stdout carries the generated text
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config_path = Config::resolve_path(args.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.provider.base_url,
        model = %config.provider.model,
        credentials = config.api_keys.len(),
        "configuration loaded"
    );

    let mut prompt = String::new();
    tokio::io::stdin()
        .read_to_string(&mut prompt)
        .await
        .context("failed to read prompt from stdin")?;
    if prompt.trim().is_empty() {
        bail!("no prompt on stdin");
    }

    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(config.provider.connect_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    let provider: Arc<dyn TextProvider> = Arc::new(GeminiProvider::new(
        client,
        config.provider.base_url.clone(),
        config.provider.model.clone(),
    ));

    let keys = std::mem::take(&mut config.api_keys);
    let pool = Arc::new(CredentialPool::new(keys, config.pool.settings()));
    let reset_task = spawn_quota_reset_task(pool.clone(), config.pool.reset_interval());

    let outcome = if args.stream {
        let orchestrator =
            StreamOrchestrator::new(pool.clone(), provider, config.orchestrator.clone());
        run_stream(&orchestrator, &args, &prompt).await
    } else {
        let orchestrator =
            RequestOrchestrator::new(pool.clone(), provider, config.orchestrator.clone());
        run_request(&orchestrator, &args, &prompt).await
    };

    info!(health = %pool.health().await, "credential pool state");
    reset_task.abort();

    match outcome {
        Ok(()) => Ok(()),
        Err(Outcome::Generate(err)) => {
            error!(kind = err.kind(), "{err}");
            if err.is_retryable_later() {
                warn!("the failure is temporary, retry later");
                std::process::exit(EXIT_TEMPFAIL);
            }
            std::process::exit(1);
        }
        Err(Outcome::Output(err)) => Err(anyhow::Error::from(err).context("failed to write output")),
    }
}

/// Why a run ended without output.
enum Outcome {
    Generate(orchestrator::Error),
    Output(std::io::Error),
}

async fn run_request(
    orchestrator: &RequestOrchestrator,
    args: &Args,
    prompt: &str,
) -> std::result::Result<(), Outcome> {
    let text = orchestrator
        .generate(&args.system, prompt, &args.generate_options())
        .await
        .map_err(Outcome::Generate)?;
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await.map_err(Outcome::Output)?;
    stdout.write_all(b"\n").await.map_err(Outcome::Output)?;
    stdout.flush().await.map_err(Outcome::Output)
}

async fn run_stream(
    orchestrator: &StreamOrchestrator,
    args: &Args,
    prompt: &str,
) -> std::result::Result<(), Outcome> {
    let mut chunks = orchestrator.generate(&args.system, prompt, &args.stream_options());
    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(Outcome::Generate)?;
        stdout.write_all(chunk.as_bytes()).await.map_err(Outcome::Output)?;
        stdout.flush().await.map_err(Outcome::Output)?;
    }
    stdout.write_all(b"\n").await.map_err(Outcome::Output)?;
    stdout.flush().await.map_err(Outcome::Output)
}
