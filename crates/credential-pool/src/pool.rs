//! Credential state machine and round-robin selection
//!
//! The pool holds per-credential state (Alive, Cooling, Dead) plus the time of
//! the last dispatch on each credential. Keys themselves are immutable and
//! shared by `Arc`; only the state vector sits behind the lock, and the
//! rotation cursor is a lock-free counter.
//!
//! Transient cooldowns lapse on their own: a `Cooling` credential whose
//! deadline has passed is reported and treated as `Alive`. Daily-quota
//! cooldowns never lapse by time alone; they need `reset_daily_quota` or
//! `reset_expired_daily_quotas`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use provider::ApiKey;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Health state of one credential.
///
/// Transitions:
/// - Alive → Cooling (rate-limit signal)
/// - Cooling → Alive (transient deadline elapsed, success, or daily reset)
/// - Alive | Cooling → Dead (authorization failure, irreversible)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Alive,
    Cooling {
        until: Instant,
        daily_exhausted: bool,
    },
    Dead,
}

impl CredentialState {
    /// Status label for health/logging.
    pub fn label(&self) -> &'static str {
        match self {
            CredentialState::Alive => "alive",
            CredentialState::Cooling {
                daily_exhausted: true,
                ..
            } => "daily_exhausted",
            CredentialState::Cooling { .. } => "cooling",
            CredentialState::Dead => "dead",
        }
    }

    fn is_dead(&self) -> bool {
        matches!(self, CredentialState::Dead)
    }

    fn is_daily_exhausted(&self) -> bool {
        matches!(
            self,
            CredentialState::Cooling {
                daily_exhausted: true,
                ..
            }
        )
    }

    /// Collapse an elapsed transient cooldown into `Alive`.
    fn at(self, now: Instant) -> CredentialState {
        match self {
            CredentialState::Cooling {
                until,
                daily_exhausted: false,
            } if now >= until => CredentialState::Alive,
            other => other,
        }
    }
}

/// Timing knobs for the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Minimum gap between two dispatches on the same credential.
    pub min_spacing: Duration,
    /// Cooldown after an ordinary rate-limit signal.
    pub cooldown: Duration,
    /// Estimated time until a daily quota resets. Used as the cooling
    /// deadline for daily-exhausted credentials and by the reset task.
    pub daily_quota_cooldown: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_spacing: Duration::from_secs(4),
            cooldown: Duration::from_secs(30),
            daily_quota_cooldown: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// A credential handed out by the pool: its index plus a read-only key handle.
#[derive(Debug, Clone)]
pub struct SelectedCredential {
    pub index: usize,
    pub key: Arc<ApiKey>,
}

#[derive(Debug)]
struct Slot {
    state: CredentialState,
    last_used: Option<Instant>,
}

/// Fixed-size pool of provider credentials shared by all orchestration calls.
///
/// All mutation goes through the pool's methods. Methods taking an index
/// ignore out-of-range values with a warning.
pub struct CredentialPool {
    keys: Vec<Arc<ApiKey>>,
    slots: RwLock<Vec<Slot>>,
    cursor: AtomicUsize,
    settings: PoolSettings,
}

impl CredentialPool {
    /// Create a pool over `keys`. Every credential starts `Alive`.
    pub fn new(keys: Vec<ApiKey>, settings: PoolSettings) -> Self {
        let fingerprints: Vec<String> = keys.iter().map(|k| k.fingerprint()).collect();
        info!(
            credentials = keys.len(),
            keys = ?fingerprints,
            min_spacing_ms = settings.min_spacing.as_millis() as u64,
            "credential pool initialized"
        );
        let slots = keys
            .iter()
            .map(|_| Slot {
                state: CredentialState::Alive,
                last_used: None,
            })
            .collect();
        Self {
            keys: keys.into_iter().map(Arc::new).collect(),
            slots: RwLock::new(slots),
            cursor: AtomicUsize::new(0),
            settings,
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Number of credentials, fixed at construction.
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// Hand out the next credential in rotation.
    ///
    /// Advances the cursor once per call and scans forward from it, skipping
    /// `Dead` credentials. Daily-exhausted credentials are also skipped while
    /// some other credential is neither dead nor daily-exhausted. Transiently
    /// cooling credentials stay in rotation; the caller waits them out via
    /// `cooldown_wait`.
    ///
    /// Fails immediately when every credential is dead.
    pub async fn next(&self) -> Result<SelectedCredential> {
        let n = self.keys.len();
        if n == 0 {
            return Err(Error::AllCredentialsDead { total: 0 });
        }

        let now = Instant::now();
        let mut slots = self.slots.write().await;
        for (index, slot) in slots.iter_mut().enumerate() {
            let effective = slot.state.at(now);
            if effective != slot.state {
                info!(credential = index, "cooldown expired, credential available again");
                slot.state = effective;
            }
        }

        let has_regular = slots
            .iter()
            .any(|s| !s.state.is_dead() && !s.state.is_daily_exhausted());

        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % n;
        for offset in 0..n {
            let index = (start + offset) % n;
            let state = slots[index].state;
            if state.is_dead() || (has_regular && state.is_daily_exhausted()) {
                continue;
            }
            debug!(credential = index, state = state.label(), "credential selected");
            return Ok(SelectedCredential {
                index,
                key: self.keys[index].clone(),
            });
        }

        Err(Error::AllCredentialsDead { total: n })
    }

    /// How long the caller must wait before dispatching on `index` again,
    /// given the per-credential minimum spacing.
    pub async fn rate_limit_wait(&self, index: usize) -> Duration {
        let slots = self.slots.read().await;
        let Some(slot) = slots.get(index) else {
            warn!(credential = index, "rate_limit_wait for unknown credential");
            return Duration::ZERO;
        };
        match slot.last_used {
            Some(last) => {
                (last + self.settings.min_spacing).saturating_duration_since(Instant::now())
            }
            None => Duration::ZERO,
        }
    }

    /// Record a dispatch on `index` now. Never moves the timestamp back past
    /// a slot already claimed with `reserve_slot`.
    pub async fn mark_used(&self, index: usize) {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        match slots.get_mut(index) {
            Some(slot) => slot.last_used = Some(slot.last_used.map_or(now, |last| last.max(now))),
            None => warn!(credential = index, "mark_used for unknown credential"),
        }
    }

    /// Claim the next dispatch slot on `index` and return how long the
    /// caller must wait before using it. Concurrent callers sharing one
    /// credential are handed slots `min_spacing` apart.
    pub async fn reserve_slot(&self, index: usize) -> Duration {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(index) else {
            warn!(credential = index, "reserve_slot for unknown credential");
            return Duration::ZERO;
        };
        let at = match slot.last_used {
            Some(last) => (last + self.settings.min_spacing).max(now),
            None => now,
        };
        slot.last_used = Some(at);
        at - now
    }

    /// Time left until a cooling credential becomes usable; zero otherwise.
    ///
    /// For daily-exhausted credentials this is the estimated reset horizon.
    pub async fn cooldown_wait(&self, index: usize) -> Duration {
        let slots = self.slots.read().await;
        let Some(slot) = slots.get(index) else {
            warn!(credential = index, "cooldown_wait for unknown credential");
            return Duration::ZERO;
        };
        let now = Instant::now();
        match slot.state.at(now) {
            CredentialState::Cooling { until, .. } => until.saturating_duration_since(now),
            CredentialState::Alive | CredentialState::Dead => Duration::ZERO,
        }
    }

    /// Confirm `index` is healthy: a cooling credential returns to `Alive`.
    pub async fn mark_success(&self, index: usize) {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(index) else {
            warn!(credential = index, "mark_success for unknown credential");
            return;
        };
        if let CredentialState::Cooling { .. } = slot.state {
            info!(credential = index, "credential healthy again after cooldown");
            slot.state = CredentialState::Alive;
            record_transition(CredentialState::Alive);
        }
    }

    /// Put `index` into cooldown after a rate-limit signal.
    ///
    /// A daily-quota signal cools the credential until external reset. A
    /// transient signal never downgrades an existing daily cooldown. Dead
    /// credentials stay dead.
    pub async fn mark_cooldown(&self, index: usize, is_daily_quota: bool) {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(index) else {
            warn!(credential = index, "mark_cooldown for unknown credential");
            return;
        };
        if slot.state.is_dead() {
            return;
        }
        let daily_exhausted = is_daily_quota || slot.state.is_daily_exhausted();
        let duration = if daily_exhausted {
            self.settings.daily_quota_cooldown
        } else {
            self.settings.cooldown
        };
        slot.state = CredentialState::Cooling {
            until: Instant::now() + duration,
            daily_exhausted,
        };
        record_transition(slot.state);
        info!(
            credential = index,
            daily_exhausted,
            cooldown_secs = duration.as_secs(),
            "credential entering cooldown"
        );
    }

    /// Permanently retire `index`.
    pub async fn mark_dead(&self, index: usize) {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(index) else {
            warn!(credential = index, "mark_dead for unknown credential");
            return;
        };
        if !slot.state.is_dead() {
            slot.state = CredentialState::Dead;
            record_transition(CredentialState::Dead);
            warn!(credential = index, "credential rejected by provider, marked dead");
        }
    }

    /// Number of credentials that are not dead.
    pub async fn alive_count(&self) -> usize {
        self.slots
            .read()
            .await
            .iter()
            .filter(|s| !s.state.is_dead())
            .count()
    }

    /// True when every credential is either daily-exhausted or dead.
    ///
    /// Vacuously true for an all-dead pool, so check `alive_count` first
    /// when the two conditions need telling apart.
    pub async fn all_daily_exhausted(&self) -> bool {
        self.slots
            .read()
            .await
            .iter()
            .all(|s| s.state.is_dead() || s.state.is_daily_exhausted())
    }

    /// Snapshot of one credential's state, with lapsed cooldowns shown as
    /// `Alive`.
    pub async fn state(&self, index: usize) -> Option<CredentialState> {
        let now = Instant::now();
        self.slots
            .read()
            .await
            .get(index)
            .map(|slot| slot.state.at(now))
    }

    /// Clear a daily-quota cooldown on `index`. Returns whether anything changed.
    pub async fn reset_daily_quota(&self, index: usize) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get_mut(index) {
            Some(slot) if slot.state.is_daily_exhausted() => {
                slot.state = CredentialState::Alive;
                record_transition(CredentialState::Alive);
                info!(credential = index, "daily quota reset");
                true
            }
            Some(_) => false,
            None => {
                warn!(credential = index, "reset_daily_quota for unknown credential");
                false
            }
        }
    }

    /// Clear every daily-quota cooldown whose reset horizon has passed.
    /// Returns how many credentials were restored.
    pub async fn reset_expired_daily_quotas(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        let mut restored = 0usize;
        for (index, slot) in slots.iter_mut().enumerate() {
            if let CredentialState::Cooling {
                until,
                daily_exhausted: true,
            } = slot.state
                && now >= until
            {
                slot.state = CredentialState::Alive;
                record_transition(CredentialState::Alive);
                info!(credential = index, "daily quota horizon passed, credential restored");
                restored += 1;
            }
        }
        restored
    }

    /// Pool health summary for logs and status reporting.
    ///
    /// Status mapping: all alive → healthy, some usable → degraded, none
    /// usable → unhealthy.
    pub async fn health(&self) -> serde_json::Value {
        let now = Instant::now();
        let slots = self.slots.read().await;

        let mut credentials = Vec::with_capacity(slots.len());
        let (mut alive, mut cooling, mut daily, mut dead) = (0usize, 0usize, 0usize, 0usize);

        for (index, slot) in slots.iter().enumerate() {
            let state = slot.state.at(now);
            match state {
                CredentialState::Alive => {
                    alive += 1;
                    credentials.push(serde_json::json!({
                        "index": index,
                        "state": state.label(),
                    }));
                }
                CredentialState::Cooling {
                    until,
                    daily_exhausted,
                } => {
                    if daily_exhausted {
                        daily += 1;
                    } else {
                        cooling += 1;
                    }
                    credentials.push(serde_json::json!({
                        "index": index,
                        "state": state.label(),
                        "cooldown_remaining_secs": until.saturating_duration_since(now).as_secs(),
                    }));
                }
                CredentialState::Dead => {
                    dead += 1;
                    credentials.push(serde_json::json!({
                        "index": index,
                        "state": state.label(),
                    }));
                }
            }
        }

        let total = slots.len();
        let status = if total > 0 && alive == total {
            "healthy"
        } else if alive + cooling > 0 {
            "degraded"
        } else {
            "unhealthy"
        };

        serde_json::json!({
            "status": status,
            "credentials_total": total,
            "credentials_alive": alive,
            "credentials_cooling": cooling,
            "credentials_daily_exhausted": daily,
            "credentials_dead": dead,
            "credentials": credentials,
        })
    }
}

fn record_transition(to: CredentialState) {
    metrics::counter!("credential_transitions_total", "to" => to.label()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<ApiKey> {
        (0..n)
            .map(|i| ApiKey::new(format!("AIzaSyTestKey{i:04}")))
            .collect()
    }

    fn pool(n: usize) -> CredentialPool {
        CredentialPool::new(keys(n), PoolSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn round_robin_cycles_through_credentials() {
        let pool = pool(3);
        let mut picked = Vec::new();
        for _ in 0..4 {
            picked.push(pool.next().await.unwrap().index);
        }
        assert_eq!(picked, vec![0, 1, 2, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn selected_handle_exposes_matching_key() {
        let pool = pool(2);
        let selected = pool.next().await.unwrap();
        assert_eq!(selected.index, 0);
        assert_eq!(selected.key.expose(), "AIzaSyTestKey0000");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_fails_fast() {
        let pool = pool(0);
        assert_eq!(
            pool.next().await.unwrap_err(),
            Error::AllCredentialsDead { total: 0 }
        );
        assert_eq!(pool.alive_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn all_dead_pool_fails_fast() {
        let pool = pool(2);
        pool.mark_dead(0).await;
        pool.mark_dead(1).await;
        assert_eq!(pool.alive_count().await, 0);
        for _ in 0..3 {
            assert_eq!(
                pool.next().await.unwrap_err(),
                Error::AllCredentialsDead { total: 2 }
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dead_credential_is_never_returned_again() {
        let pool = pool(3);
        pool.mark_dead(1).await;
        pool.mark_success(1).await;
        pool.mark_cooldown(1, false).await;
        pool.reset_daily_quota(1).await;
        for _ in 0..12 {
            assert_ne!(pool.next().await.unwrap().index, 1);
        }
        assert_eq!(pool.state(1).await, Some(CredentialState::Dead));
        assert_eq!(pool.alive_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn single_alive_credential_is_shared_by_concurrent_callers() {
        let pool = Arc::new(pool(3));
        pool.mark_dead(0).await;
        pool.mark_dead(2).await;
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { pool.next().await.unwrap().index })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_get_distinct_credentials() {
        let pool = Arc::new(pool(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { pool.next().await.unwrap().index })
            })
            .collect();
        let mut indices = Vec::new();
        for handle in handles {
            indices.push(handle.await.unwrap());
        }
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_transitions_are_not_lost() {
        let pool = Arc::new(pool(6));
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        pool.mark_dead(i).await;
                    } else {
                        pool.mark_cooldown(i, true).await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(pool.alive_count().await, 3);
        assert!(pool.all_daily_exhausted().await);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_wait_counts_down_from_min_spacing() {
        let pool = pool(2);
        assert_eq!(pool.rate_limit_wait(0).await, Duration::ZERO);

        pool.mark_used(0).await;
        let spacing = pool.settings().min_spacing;
        assert!(pool.rate_limit_wait(0).await >= spacing);
        // Spacing is per credential
        assert_eq!(pool.rate_limit_wait(1).await, Duration::ZERO);

        let mut previous = pool.rate_limit_wait(0).await;
        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(1)).await;
            let current = pool.rate_limit_wait(0).await;
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(previous, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn reserved_slots_are_spaced_apart() {
        let pool = pool(2);
        assert_eq!(pool.reserve_slot(0).await, Duration::ZERO);
        assert_eq!(pool.reserve_slot(0).await, Duration::from_secs(4));
        assert_eq!(pool.reserve_slot(0).await, Duration::from_secs(8));
        assert_eq!(pool.reserve_slot(1).await, Duration::ZERO);

        // Dispatching the first slot must not release the later ones
        pool.mark_used(0).await;
        assert_eq!(pool.rate_limit_wait(0).await, Duration::from_secs(12));
        assert_eq!(pool.reserve_slot(7).await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_cooldown_lapses() {
        let pool = pool(1);
        pool.mark_cooldown(0, false).await;
        let wait = pool.cooldown_wait(0).await;
        assert_eq!(wait, Duration::from_secs(30));
        assert_eq!(pool.state(0).await.unwrap().label(), "cooling");

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(pool.cooldown_wait(0).await, Duration::ZERO);
        assert_eq!(pool.state(0).await, Some(CredentialState::Alive));
    }

    #[tokio::test(start_paused = true)]
    async fn daily_cooldown_does_not_lapse_by_time() {
        let pool = pool(1);
        pool.mark_cooldown(0, true).await;
        tokio::time::advance(Duration::from_secs(25 * 60 * 60)).await;
        assert!(pool.state(0).await.unwrap().label() == "daily_exhausted");
        assert!(pool.all_daily_exhausted().await);

        assert!(pool.reset_daily_quota(0).await);
        assert_eq!(pool.state(0).await, Some(CredentialState::Alive));
        assert!(!pool.all_daily_exhausted().await);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_signal_keeps_daily_cooldown() {
        let pool = pool(1);
        pool.mark_cooldown(0, true).await;
        pool.mark_cooldown(0, false).await;
        assert_eq!(pool.state(0).await.unwrap().label(), "daily_exhausted");
    }

    #[tokio::test(start_paused = true)]
    async fn mark_success_clears_cooling() {
        let pool = pool(1);
        pool.mark_cooldown(0, false).await;
        pool.mark_success(0).await;
        assert_eq!(pool.state(0).await, Some(CredentialState::Alive));
        assert_eq!(pool.cooldown_wait(0).await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cooling_credential_stays_in_rotation() {
        let pool = pool(2);
        pool.mark_cooldown(0, false).await;
        let picked: Vec<usize> = vec![
            pool.next().await.unwrap().index,
            pool.next().await.unwrap().index,
        ];
        assert_eq!(picked, vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_exhausted_credential_is_skipped_while_others_remain() {
        let pool = pool(3);
        pool.mark_cooldown(1, true).await;
        for _ in 0..6 {
            assert_ne!(pool.next().await.unwrap().index, 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn all_daily_exhausted_requires_every_credential() {
        let pool = pool(3);
        assert!(!pool.all_daily_exhausted().await);
        pool.mark_cooldown(0, true).await;
        pool.mark_dead(1).await;
        assert!(!pool.all_daily_exhausted().await);
        pool.mark_cooldown(2, true).await;
        assert!(pool.all_daily_exhausted().await);
        // Still hands out a daily-exhausted credential rather than failing
        assert_eq!(pool.next().await.unwrap().index % 2, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_daily_quotas_are_reset_in_bulk() {
        let settings = PoolSettings {
            daily_quota_cooldown: Duration::from_secs(3600),
            ..PoolSettings::default()
        };
        let pool = CredentialPool::new(keys(3), settings);
        pool.mark_cooldown(0, true).await;
        pool.mark_cooldown(1, true).await;
        assert_eq!(pool.reset_expired_daily_quotas().await, 0);

        tokio::time::advance(Duration::from_secs(3601)).await;
        pool.mark_cooldown(2, true).await;
        assert_eq!(pool.reset_expired_daily_quotas().await, 2);
        assert_eq!(pool.state(0).await, Some(CredentialState::Alive));
        assert_eq!(pool.state(2).await.unwrap().label(), "daily_exhausted");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_index_is_ignored() {
        let pool = pool(1);
        pool.mark_dead(7).await;
        pool.mark_cooldown(7, true).await;
        pool.mark_used(7).await;
        assert_eq!(pool.rate_limit_wait(7).await, Duration::ZERO);
        assert_eq!(pool.cooldown_wait(7).await, Duration::ZERO);
        assert!(pool.state(7).await.is_none());
        assert_eq!(pool.alive_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn health_reports_counts_and_status() {
        let pool = pool(4);
        let health = pool.health().await;
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["credentials_total"], 4);

        pool.mark_cooldown(0, false).await;
        pool.mark_cooldown(1, true).await;
        pool.mark_dead(2).await;
        let health = pool.health().await;
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["credentials_alive"], 1);
        assert_eq!(health["credentials_cooling"], 1);
        assert_eq!(health["credentials_daily_exhausted"], 1);
        assert_eq!(health["credentials_dead"], 1);
        assert_eq!(health["credentials"][0]["cooldown_remaining_secs"], 30);

        pool.mark_dead(3).await;
        pool.mark_dead(0).await;
        assert_eq!(pool.health().await["status"], "unhealthy");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_health_is_unhealthy() {
        let health = pool(0).health().await;
        assert_eq!(health["status"], "unhealthy");
        assert_eq!(health["credentials_total"], 0);
    }
}
