//! Non-streaming generate with credential rotation, retries and repair

use std::ops::ControlFlow;
use std::sync::Arc;

use credential_pool::{CredentialPool, SelectedCredential};
use provider::{GenerationRequest, TextProvider};
use tokio::time::Instant;
use tracing::{Instrument, info, warn};

use crate::dispatch::{Acquired, Dispatcher, RetryAttempt};
use crate::error::{Error, Failure, FailureClass, Result};
use crate::metrics;
use crate::options::GenerateOptions;
use crate::repair;
use crate::settings::{OrchestratorSettings, shrink_prompt};

/// Appended to the prompt of the last-resort structured-output call.
const JSON_ONLY_SUFFIX: &str = "\n\nRespond with a single valid JSON value only. \
Do not add explanations, markdown fences, or any text outside the JSON.";

/// Drives one "generate and return the complete text" operation.
///
/// Cheap to clone; clones share the pool and provider.
#[derive(Clone)]
pub struct RequestOrchestrator {
    dispatch: Dispatcher,
}

impl RequestOrchestrator {
    pub fn new(
        pool: Arc<CredentialPool>,
        provider: Arc<dyn TextProvider>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            dispatch: Dispatcher {
                pool,
                provider,
                settings: Arc::new(settings),
            },
        }
    }

    /// Generate a complete response for `prompt`.
    ///
    /// Tries up to one attempt per credential plus one. With
    /// `options.json_mode` the returned text is guaranteed to parse as JSON.
    pub async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String> {
        let started = Instant::now();
        let result = self.run(system_instruction, prompt, options).await;
        metrics::record_generate(
            "request",
            result.as_ref().map(|_| ()),
            started.elapsed().as_secs_f64(),
        );
        if let Err(err) = &result {
            warn!(kind = err.kind(), error = %err, "generate failed");
        }
        result
    }

    async fn run(
        &self,
        system_instruction: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String> {
        let settings = &self.dispatch.settings;
        let max_attempts = self.dispatch.max_attempts();
        let mut request = GenerationRequest {
            system_instruction: system_instruction.to_string(),
            prompt: prompt.to_string(),
            config: options.generation_config(),
        };
        let mut last: Option<Failure> = None;

        for attempt in 0..max_attempts {
            self.dispatch.check_pool().await?;

            let selected = match self.dispatch.acquire().await? {
                Acquired::Ready(selected) => selected,
                Acquired::StillCooling(failure) => {
                    metrics::record_attempt("request", failure.class().label());
                    info!(attempt, error = %failure, "attempt skipped");
                    last = Some(failure);
                    continue;
                }
            };
            let credential = selected.index;
            let span = RetryAttempt {
                number: attempt,
                credential,
                prompt: &request.prompt,
                previous: last.as_ref().map(Failure::class),
            }
            .span("request");

            let timeout = settings.call_timeout(request.prompt.chars().count());
            let outcome = self
                .dispatch
                .call(&selected, &request, timeout)
                .instrument(span.clone())
                .await;

            let failure = match outcome {
                Ok(text) if !options.json_mode => {
                    return Ok(self.succeed(credential, text).await);
                }
                Ok(text) => match repair::repair(&text) {
                    Ok(json) => return Ok(self.succeed(credential, json).await),
                    Err(_) => {
                        // The credential answered, only the payload is bad.
                        self.dispatch.pool.mark_success(credential).await;
                        Failure::malformed(&text)
                    }
                },
                Err(err) => Failure::from(err),
            };

            let class = failure.class();
            metrics::record_attempt("request", class.label());
            span.in_scope(|| warn!(class = class.label(), error = %failure, "attempt failed"));

            let is_last = attempt + 1 == max_attempts;
            if is_last && class == FailureClass::MalformedOutput {
                metrics::record_failure(class);
                return self.fallback(&selected, &request, max_attempts).await;
            }

            let wait = match self.dispatch.absorb(credential, &failure, attempt).await {
                ControlFlow::Break(err) => return Err(err),
                ControlFlow::Continue(wait) => wait,
            };
            if class == FailureClass::Timeout {
                request.prompt = shrink_prompt(&request.prompt, settings.shrink_ratio);
                info!(
                    attempt,
                    prompt_chars = request.prompt.chars().count(),
                    "prompt shrunk after timeout"
                );
            }
            last = Some(failure);

            if !is_last && !wait.is_zero() {
                info!(
                    attempt,
                    class = class.label(),
                    wait_ms = wait.as_millis() as u64,
                    "backing off"
                );
                tokio::time::sleep(wait).await;
            }
        }

        match last {
            Some(last) => Err(Error::Exhausted {
                attempts: max_attempts,
                last,
            }),
            None => Err(Error::AllCredentialsDead {
                total: self.dispatch.pool.size(),
            }),
        }
    }

    async fn succeed(&self, credential: usize, text: String) -> String {
        self.dispatch.pool.mark_success(credential).await;
        metrics::record_attempt("request", "success");
        text
    }

    /// One extra structured-output call with a more deterministic
    /// configuration, on the credential the final attempt used. Skips
    /// rotation and cooldown checks.
    async fn fallback(
        &self,
        selected: &SelectedCredential,
        request: &GenerationRequest,
        attempts: u32,
    ) -> Result<String> {
        let settings = &self.dispatch.settings;
        let mut fallback = request.clone();
        fallback.prompt.push_str(JSON_ONLY_SUFFIX);
        fallback.config.temperature = Some(settings.fallback_temperature);
        fallback.config.model = settings.fallback_model.clone();
        fallback.config.json_mode = true;

        info!(
            credential = selected.index,
            model = fallback.config.model.as_deref().unwrap_or("default"),
            "structured output still malformed, trying fallback configuration"
        );

        let timeout = settings.call_timeout(fallback.prompt.chars().count());
        let failure = match self.dispatch.call(selected, &fallback, timeout).await {
            Ok(text) => match repair::repair(&text) {
                Ok(json) => return Ok(self.succeed(selected.index, json).await),
                Err(_) => Failure::malformed(&text),
            },
            Err(err) => Failure::from(err),
        };

        metrics::record_attempt("request", failure.class().label());
        if let ControlFlow::Break(err) = self
            .dispatch
            .absorb(selected.index, &failure, attempts)
            .await
        {
            return Err(err);
        }
        Err(Error::Exhausted {
            attempts: attempts + 1,
            last: failure,
        })
    }
}
