//! Attempt machinery shared by the request and stream orchestrators
//!
//! One attempt is: check the pool is still usable, take the next credential,
//! wait out its (capped) cooldown and its spacing, dispatch under a timeout, then
//! fold the outcome back into pool state and decide whether the operation
//! continues.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use credential_pool::{CredentialPool, SelectedCredential};
use provider::{CallError, ChunkStream, GenerationRequest, TextProvider};
use tracing::{Span, debug, info, info_span, warn};

use crate::error::{Error, Failure, FailureClass};
use crate::metrics;
use crate::settings::OrchestratorSettings;

/// Per-iteration bookkeeping for one attempt. Lives for one loop iteration.
#[derive(Debug)]
pub(crate) struct RetryAttempt<'p> {
    pub number: u32,
    pub credential: usize,
    pub prompt: &'p str,
    pub previous: Option<FailureClass>,
}

impl RetryAttempt<'_> {
    pub fn span(&self, mode: &'static str) -> Span {
        info_span!(
            "attempt",
            mode,
            attempt = self.number,
            credential = self.credential,
            prompt_chars = self.prompt.chars().count(),
            previous = self.previous.map(|c| c.label()),
        )
    }
}

/// Result of taking a credential for an attempt.
pub(crate) enum Acquired {
    Ready(SelectedCredential),
    /// The credential was still cooling after the capped wait; the attempt
    /// is spent without a provider call.
    StillCooling(Failure),
}

#[derive(Clone)]
pub(crate) struct Dispatcher {
    pub pool: Arc<CredentialPool>,
    pub provider: Arc<dyn TextProvider>,
    pub settings: Arc<OrchestratorSettings>,
}

impl Dispatcher {
    /// Attempts per operation: one per credential plus one.
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.pool.size()).unwrap_or(u32::MAX - 1) + 1
    }

    /// Fail fast when no credential can serve the request.
    pub async fn check_pool(&self) -> Result<(), Error> {
        if self.pool.alive_count().await == 0 {
            return Err(Error::AllCredentialsDead {
                total: self.pool.size(),
            });
        }
        if self.pool.all_daily_exhausted().await {
            return Err(Error::AllDailyQuotaExhausted);
        }
        Ok(())
    }

    /// Take the next credential and wait until it may be used.
    pub async fn acquire(&self) -> Result<Acquired, Error> {
        let selected = self.pool.next().await?;
        let credential = selected.index;

        let cooling = self.pool.cooldown_wait(credential).await;
        if !cooling.is_zero() {
            let wait = cooling.min(self.settings.cooldown_wait_cap());
            info!(credential, wait_ms = wait.as_millis() as u64, "waiting out credential cooldown");
            tokio::time::sleep(wait).await;

            let remaining = self.pool.cooldown_wait(credential).await;
            if !remaining.is_zero() {
                return Ok(Acquired::StillCooling(Failure::CoolingDown {
                    credential,
                    remaining,
                }));
            }
        }

        let spacing = self.pool.reserve_slot(credential).await;
        if !spacing.is_zero() {
            debug!(
                credential,
                wait_ms = spacing.as_millis() as u64,
                "waiting for credential spacing"
            );
            tokio::time::sleep(spacing).await;
        }

        Ok(Acquired::Ready(selected))
    }

    /// Issue a non-streaming call on `selected` bounded by `timeout`.
    pub async fn call(
        &self,
        selected: &SelectedCredential,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<String, CallError> {
        self.pool.mark_used(selected.index).await;
        match tokio::time::timeout(timeout, self.provider.generate(&selected.key, request)).await {
            Ok(result) => result,
            Err(_) => Err(timed_out(timeout)),
        }
    }

    /// Open a stream on `selected`; only the opening is bounded by `timeout`.
    pub async fn open_stream(
        &self,
        selected: &SelectedCredential,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<ChunkStream, CallError> {
        self.pool.mark_used(selected.index).await;
        match tokio::time::timeout(timeout, self.provider.generate_stream(&selected.key, request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(timed_out(timeout)),
        }
    }

    /// Reflect a provider error in the credential's pool state.
    pub async fn apply_to_pool(&self, credential: usize, err: &CallError) {
        match err {
            CallError::Unauthorized(_) => self.pool.mark_dead(credential).await,
            CallError::RateLimited { daily, .. } => {
                self.pool.mark_cooldown(credential, *daily).await
            }
            CallError::Server { .. } | CallError::Timeout(_) => {}
        }
    }

    /// Fold a failed attempt into pool state and decide what happens next.
    ///
    /// `Break` carries a pool-wide condition that ends the operation.
    /// `Continue` carries the backoff to sleep before the next attempt.
    pub async fn absorb(
        &self,
        credential: usize,
        failure: &Failure,
        attempt: u32,
    ) -> ControlFlow<Error, Duration> {
        let class = failure.class();
        metrics::record_failure(class);
        if let Failure::Call(err) = failure {
            self.apply_to_pool(credential, err).await;
        }

        match class {
            FailureClass::Authorization => {
                if self.pool.alive_count().await == 0 {
                    warn!("every credential has been rejected");
                    return ControlFlow::Break(Error::AllCredentialsDead {
                        total: self.pool.size(),
                    });
                }
                ControlFlow::Continue(Duration::ZERO)
            }
            FailureClass::RateLimited | FailureClass::DailyQuota => {
                if self.pool.all_daily_exhausted().await {
                    warn!("every usable credential is out of daily quota");
                    return ControlFlow::Break(Error::AllDailyQuotaExhausted);
                }
                ControlFlow::Continue(self.settings.rate_limit_backoff.delay(attempt))
            }
            FailureClass::ServerFault | FailureClass::Stalled => {
                ControlFlow::Continue(self.settings.server_backoff.delay(attempt))
            }
            FailureClass::Timeout | FailureClass::MalformedOutput | FailureClass::CoolingDown => {
                ControlFlow::Continue(Duration::ZERO)
            }
        }
    }
}

fn timed_out(timeout: Duration) -> CallError {
    CallError::Timeout(format!("no response within {}s", timeout.as_secs()))
}
