//! Sync engine: outbox drain, authoritative pull refresh, optimistic write
//! path, and the background loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::connectivity::ConnectivitySignal;
use crate::errors::{Error, Precondition, Result};
use crate::identity::{Identity, IdentityProvider};
use crate::remote::RemoteStore;

use super::model::{
    EntityKind, SyncConfig, SyncCycleTrigger, SyncEngineStatus, SyncOperation, SyncOutcome,
    SyncRepositoryTrait, SyncStatus,
};
use super::scheduler::{
    OUTBOX_PUSH_BATCH_LIMIT, SYNC_FOREGROUND_INTERVAL_SECS, SYNC_INTERVAL_JITTER_SECS,
};

/// Exponential backoff in seconds with cap, keyed on an entry's retry count.
pub fn backoff_seconds(retry_count: i32) -> i64 {
    const MAX_EXPONENT: i32 = 8;
    const BASE_DELAY_SECONDS: i64 = 5;

    let capped = retry_count.clamp(0, MAX_EXPONENT) as u32;
    2_i64.pow(capped) * BASE_DELAY_SECONDS
}

/// Reconciles local pending writes with the remote service and refreshes the
/// local tables from remote state.
///
/// Passes are serialized by an internal mutex: overlapping triggers (user
/// mutation, connectivity event, periodic tick) queue up rather than draining
/// the same outbox entry twice.
pub struct SyncEngine {
    repository: Arc<dyn SyncRepositoryTrait>,
    remote: Arc<dyn RemoteStore>,
    identity: Arc<dyn IdentityProvider>,
    connectivity: Arc<dyn ConnectivitySignal>,
    config: SyncConfig,
    cycle_mutex: Mutex<()>,
    background_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(
        repository: Arc<dyn SyncRepositoryTrait>,
        remote: Arc<dyn RemoteStore>,
        identity: Arc<dyn IdentityProvider>,
        connectivity: Arc<dyn ConnectivitySignal>,
        config: SyncConfig,
    ) -> Self {
        Self {
            repository,
            remote,
            identity,
            connectivity,
            config,
            cycle_mutex: Mutex::new(()),
            background_task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// Owner id stamped on records created under the current session.
    pub fn owner_id(&self) -> Option<String> {
        self.identity.current_identity().map(|identity| identity.user_id)
    }

    /// Persisted status line from the last finished pass.
    pub fn engine_status(&self) -> Result<SyncEngineStatus> {
        self.repository.get_engine_status()
    }

    fn check_preconditions(&self) -> std::result::Result<Option<Identity>, Precondition> {
        if !self.config.sync_enabled {
            return Err(Precondition::SyncDisabled);
        }
        if !self.connectivity.is_online() {
            return Err(Precondition::Offline);
        }
        let identity = self.identity.current_identity();
        if self.config.auth_required && identity.is_none() {
            return Err(Precondition::NoIdentity);
        }
        Ok(identity)
    }

    /// Runs one push+pull pass.
    ///
    /// Unmet preconditions end the pass with an `offline`/`not_attempted`
    /// outcome, never an error; only local store faults reject.
    pub async fn run_cycle(&self, trigger: SyncCycleTrigger) -> Result<SyncOutcome> {
        let _guard = self.cycle_mutex.lock().await;
        let started_at = std::time::Instant::now();
        debug!("[Sync] cycle start trigger={:?}", trigger);

        let identity = match self.check_preconditions() {
            Ok(identity) => identity,
            Err(precondition) => {
                let status = match precondition {
                    Precondition::Offline => SyncStatus::Offline,
                    Precondition::NoIdentity | Precondition::SyncDisabled => {
                        SyncStatus::NotAttempted
                    }
                };
                debug!("[Sync] cycle skipped: {}", precondition);
                let duration_ms = started_at.elapsed().as_millis() as i64;
                self.repository
                    .mark_cycle_outcome(status, duration_ms, None)
                    .await?;
                return Ok(SyncOutcome {
                    status,
                    pushed_count: 0,
                    pulled_count: 0,
                    duration_ms,
                });
            }
        };
        let identity_ref = identity.as_ref();
        self.repository
            .mark_cycle_outcome(SyncStatus::Syncing, 0, None)
            .await?;

        // Push phase: entries in enqueue order, each confirmed as its upsert
        // succeeds. A failed entry stays queued with a backoff and never
        // blocks the rest.
        let mut pushed_count = 0usize;
        let mut push_failures = 0usize;
        let mut last_error: Option<String> = None;
        for entry in self.repository.list_pending_outbox(OUTBOX_PUSH_BATCH_LIMIT)? {
            let result = match serde_json::from_str::<serde_json::Value>(&entry.payload) {
                Ok(payload) => match entry.op {
                    SyncOperation::Upsert => {
                        self.remote.upsert(identity_ref, entry.entity, &payload).await
                    }
                    SyncOperation::Delete => {
                        self.remote
                            .delete(identity_ref, entry.entity, &entry.entity_id)
                            .await
                    }
                },
                Err(err) => Err(crate::remote::RemoteError::api(
                    400,
                    format!("undecodable outbox payload: {}", err),
                )),
            };

            match result {
                Ok(()) => {
                    self.repository.confirm_outbox_entry(entry.id).await?;
                    pushed_count += 1;
                }
                Err(err) => {
                    warn!(
                        "[Sync] push failed for {} {}: {}",
                        entry.entity.table_name(),
                        entry.entity_id,
                        err
                    );
                    last_error = Some(err.to_string());
                    self.repository
                        .schedule_outbox_retry(
                            entry.id,
                            backoff_seconds(entry.retry_count),
                            Some(err.to_string()),
                        )
                        .await?;
                    push_failures += 1;
                }
            }
        }

        // Pull phase: parents before children. A failed fetch aborts the
        // remaining pulls; tables already pulled stay refreshed.
        let mut pulled_count = 0usize;
        let mut pull_aborted = false;
        for kind in EntityKind::ALL {
            let rows = match self.remote.fetch_all(identity_ref, kind).await {
                Ok(rows) => rows,
                Err(err) => {
                    warn!("[Sync] pull failed for {}: {}", kind.table_name(), err);
                    last_error = Some(err.to_string());
                    pull_aborted = true;
                    break;
                }
            };
            match self.repository.replace_table(kind, rows).await {
                Ok(count) => pulled_count += count,
                Err(err) => {
                    // Storage fault, not a remote hiccup: surface it after
                    // recording the broken pass.
                    let duration_ms = started_at.elapsed().as_millis() as i64;
                    let _ = self
                        .repository
                        .mark_cycle_outcome(SyncStatus::Error, duration_ms, Some(err.to_string()))
                        .await;
                    return Err(err);
                }
            }
        }

        let status = if push_failures == 0 && !pull_aborted {
            SyncStatus::Synced
        } else {
            SyncStatus::Partial
        };
        let duration_ms = started_at.elapsed().as_millis() as i64;
        self.repository
            .mark_cycle_outcome(status, duration_ms, last_error)
            .await?;
        debug!(
            "[Sync] cycle done status={} pushed={} pulled={}",
            status, pushed_count, pulled_count
        );

        Ok(SyncOutcome {
            status,
            pushed_count,
            pulled_count,
            duration_ms,
        })
    }

    /// Optimistic write path for creates: one immediate remote attempt, with
    /// the outbox as fallback so the record survives until a later pass.
    ///
    /// The remote upsert is idempotent by id, so a crash between remote
    /// success and entry confirmation merely re-upserts the same row.
    pub async fn push_optimistic<T: Serialize>(
        &self,
        kind: EntityKind,
        entity_id: &str,
        record: &T,
    ) -> Result<()> {
        if !self.config.sync_enabled {
            return Ok(());
        }
        let payload = serde_json::to_value(record)?;

        match self.check_preconditions() {
            Ok(identity) => match self.remote.upsert(identity.as_ref(), kind, &payload).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    warn!(
                        "[Sync] optimistic upsert failed for {} {}: {} (queued for retry)",
                        kind.table_name(),
                        entity_id,
                        err
                    );
                    self.repository
                        .enqueue_outbox(kind, entity_id.to_string(), SyncOperation::Upsert, payload)
                        .await?;
                    Ok(())
                }
            },
            Err(precondition) => {
                debug!(
                    "[Sync] queueing {} {} ({})",
                    kind.table_name(),
                    entity_id,
                    precondition
                );
                self.repository
                    .enqueue_outbox(kind, entity_id.to_string(), SyncOperation::Upsert, payload)
                    .await?;
                Ok(())
            }
        }
    }

    /// Immediate remote delete. Deletes are never queued, so connectivity and
    /// identity are hard requirements while sync is enabled.
    pub async fn delete_remote(&self, kind: EntityKind, id: &str) -> Result<()> {
        if !self.config.sync_enabled {
            return Ok(());
        }
        match self.check_preconditions() {
            Ok(identity) => {
                self.remote.delete(identity.as_ref(), kind, id).await?;
                Ok(())
            }
            Err(precondition) => Err(Error::PreconditionNotMet(precondition)),
        }
    }

    /// Spawns the background loop: one pass at startup, then wakes on
    /// connectivity coming back online, identity becoming available, or the
    /// periodic interval with jitter.
    pub async fn spawn_background(self: &Arc<Self>) {
        let mut guard = self.background_task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
            guard.take();
        }

        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut connectivity_rx = engine.connectivity.watch();
            let mut identity_rx = engine.identity.watch();

            if let Err(err) = engine.run_cycle(SyncCycleTrigger::Startup).await {
                warn!("[Sync] startup cycle failed: {}", err);
            }

            loop {
                let jitter_bound = SYNC_INTERVAL_JITTER_SECS.saturating_mul(1000);
                let jitter_ms = if jitter_bound > 0 {
                    Utc::now().timestamp_millis().unsigned_abs() % jitter_bound
                } else {
                    0
                };
                let delay =
                    Duration::from_millis(SYNC_FOREGROUND_INTERVAL_SECS * 1000 + jitter_ms);

                let trigger = tokio::select! {
                    _ = tokio::time::sleep(delay) => SyncCycleTrigger::Periodic,
                    changed = connectivity_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if !*connectivity_rx.borrow_and_update() {
                            continue;
                        }
                        SyncCycleTrigger::ConnectivityRestored
                    }
                    changed = identity_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if identity_rx.borrow_and_update().is_none() {
                            continue;
                        }
                        SyncCycleTrigger::IdentityChanged
                    }
                };

                if let Err(err) = engine.run_cycle(trigger).await {
                    warn!("[Sync] background cycle failed: {}", err);
                }
            }
            info!("[Sync] background loop stopped");
        });
        *guard = Some(handle);
    }

    /// Aborts the background loop if one is running.
    pub async fn stop_background(&self) {
        let mut guard = self.background_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::backoff_seconds;

    #[test]
    fn backoff_is_exponential_and_capped() {
        assert_eq!(backoff_seconds(0), 5);
        assert_eq!(backoff_seconds(1), 10);
        assert_eq!(backoff_seconds(2), 20);
        assert_eq!(backoff_seconds(9), backoff_seconds(8));
    }
}
