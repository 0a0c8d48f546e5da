//! Streaming generate
//!
//! Same credential and backoff machinery as the request orchestrator, with
//! one extra rule: once a chunk has been handed to the caller the attempt
//! can no longer be retried, so any later failure ends the stream with
//! `Error::StreamInterrupted`.

use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;

use credential_pool::CredentialPool;
use futures_util::{Stream, StreamExt};
use provider::{CallError, GenerationRequest, TextProvider};
use tokio::time::Instant;
use tracing::{Instrument, info, warn};

use crate::dispatch::{Acquired, Dispatcher, RetryAttempt};
use crate::error::{Error, Failure, FailureClass, Result};
use crate::metrics;
use crate::options::StreamOptions;
use crate::settings::{OrchestratorSettings, shrink_prompt};

/// Lazy, finite sequence of text chunks. Not restartable; dropping it stops
/// consumption.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Drives "generate and emit incremental text" operations.
#[derive(Clone)]
pub struct StreamOrchestrator {
    dispatch: Dispatcher,
}

impl StreamOrchestrator {
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

    /// Start a streaming generation.
    ///
    /// Nothing happens until the stream is polled. Failures before the first
    /// chunk are retried on the next credential like non-streaming ones. An
    /// `Err` item is always the last item.
    pub fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
        options: &StreamOptions,
    ) -> TextStream {
        let dispatch = self.dispatch.clone();
        let mut request = GenerationRequest {
            system_instruction: system_instruction.to_string(),
            prompt: prompt.to_string(),
            config: options.generation_config(),
        };

        Box::pin(async_stream::stream! {
            let started = Instant::now();
            let settings = dispatch.settings.clone();
            let stall = settings.stream_stall_timeout();
            let max_attempts = dispatch.max_attempts();
            let mut last: Option<Failure> = None;

            for attempt in 0..max_attempts {
                if let Err(err) = dispatch.check_pool().await {
                    finish(started, Err(&err));
                    yield Err(err);
                    return;
                }

                let selected = match dispatch.acquire().await {
                    Ok(Acquired::Ready(selected)) => selected,
                    Ok(Acquired::StillCooling(failure)) => {
                        metrics::record_attempt("stream", failure.class().label());
                        info!(attempt, error = %failure, "attempt skipped");
                        last = Some(failure);
                        continue;
                    }
                    Err(err) => {
                        finish(started, Err(&err));
                        yield Err(err);
                        return;
                    }
                };
                let credential = selected.index;
                let span = RetryAttempt {
                    number: attempt,
                    credential,
                    prompt: &request.prompt,
                    previous: last.as_ref().map(Failure::class),
                }
                .span("stream");

                let open_timeout = settings.call_timeout(request.prompt.chars().count());
                let opened = dispatch
                    .open_stream(&selected, &request, open_timeout)
                    .instrument(span.clone())
                    .await;

                let failure = match opened {
                    Err(err) => Failure::from(err),
                    Ok(mut chunks) => {
                        let mut emitted = 0usize;
                        let failure = loop {
                            let failure = match tokio::time::timeout(stall, chunks.next()).await {
                                Ok(Some(Ok(chunk))) => {
                                    if !chunk.is_empty() {
                                        emitted += 1;
                                        yield Ok(chunk);
                                    }
                                    continue;
                                }
                                Ok(None) if emitted > 0 => {
                                    dispatch.pool.mark_success(credential).await;
                                    metrics::record_attempt("stream", "success");
                                    span.in_scope(|| info!(chunks = emitted, "stream complete"));
                                    finish(started, Ok(()));
                                    return;
                                }
                                Ok(None) => Failure::Call(CallError::Server {
                                    status: None,
                                    message: "stream ended without output".into(),
                                }),
                                Ok(Some(Err(err))) => Failure::from(err),
                                Err(_) => Failure::Stalled(stall),
                            };
                            break failure;
                        };

                        if emitted > 0 {
                            metrics::record_attempt("stream", failure.class().label());
                            span.in_scope(|| warn!(
                                chunks = emitted,
                                class = failure.class().label(),
                                error = %failure,
                                "stream failed after output was delivered"
                            ));
                            // No retry after output; a pool-wide condition still wins.
                            let err = match dispatch.absorb(credential, &failure, attempt).await {
                                ControlFlow::Break(pool_err) => pool_err,
                                ControlFlow::Continue(_) => Error::StreamInterrupted {
                                    chunks: emitted,
                                    cause: failure,
                                },
                            };
                            finish(started, Err(&err));
                            yield Err(err);
                            return;
                        }
                        failure
                    }
                };

                let class = failure.class();
                metrics::record_attempt("stream", class.label());
                span.in_scope(|| {
                    warn!(
                        class = class.label(),
                        error = %failure,
                        "attempt failed before output"
                    )
                });

                let wait = match dispatch.absorb(credential, &failure, attempt).await {
                    ControlFlow::Break(err) => {
                        finish(started, Err(&err));
                        yield Err(err);
                        return;
                    }
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

                if attempt + 1 < max_attempts && !wait.is_zero() {
                    info!(
                        attempt,
                        class = class.label(),
                        wait_ms = wait.as_millis() as u64,
                        "backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
            }

            let err = match last {
                Some(last) => Error::Exhausted {
                    attempts: max_attempts,
                    last,
                },
                None => Error::AllCredentialsDead {
                    total: dispatch.pool.size(),
                },
            };
            finish(started, Err(&err));
            yield Err(err);
        })
    }
}

fn finish(started: Instant, result: std::result::Result<(), &Error>) {
    if let Err(err) = result {
        warn!(kind = err.kind(), error = %err, "stream generate failed");
    }
    metrics::record_generate("stream", result, started.elapsed().as_secs_f64());
}
