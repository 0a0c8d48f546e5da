//! Background daily-quota reset
//!
//! Daily-exhausted credentials never recover on their own inside the pool.
//! This task is the external reset: it periodically restores every
//! credential whose estimated quota horizon has passed. Runs independently
//! of the request path.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::pool::CredentialPool;

/// Spawn a background task that restores daily-exhausted credentials.
///
/// Runs every `interval`; the first check happens one interval after spawn.
/// Returns a `JoinHandle` so the owner can abort it on shutdown.
pub fn spawn_quota_reset_task(
    pool: Arc<CredentialPool>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the immediate first tick, nothing can have expired yet
        ticker.tick().await;

        loop {
            ticker.tick().await;
            reset_cycle(&pool).await;
        }
    })
}

/// Run one reset pass and log the outcome.
async fn reset_cycle(pool: &CredentialPool) -> usize {
    let restored = pool.reset_expired_daily_quotas().await;
    if restored > 0 {
        let alive = pool.alive_count().await;
        info!(
            restored,
            alive,
            "daily quota reset pass restored credentials"
        );
    } else {
        debug!("daily quota reset pass found nothing to restore");
    }
    restored
}
