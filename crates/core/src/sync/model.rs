//! Sync domain models shared between the engine, the storage backend, and
//! the UI shell.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Canonical list of local tables that participate in sync, in pull order
/// (parents before children, since records reference each other by id).
pub const SYNC_TABLES: [&str; 3] = ["apiaries", "hives", "inspections"];

/// Entity kinds mirrored between the local store and the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Apiary,
    Hive,
    Inspection,
}

impl EntityKind {
    /// All kinds, in `SYNC_TABLES` order.
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Apiary,
        EntityKind::Hive,
        EntityKind::Inspection,
    ];

    /// Local and remote table name for this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Apiary => "apiaries",
            EntityKind::Hive => "hives",
            EntityKind::Inspection => "inspections",
        }
    }
}

/// Supported remote write operations.
///
/// Deletes are immediate remote calls and are never queued by the current
/// facade; the variant exists so the outbox format does not change if a
/// queued-delete variant is ever wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Upsert,
    Delete,
}

/// Pending remote write, persisted until the remote operation that subsumes
/// it succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    /// Auto-assigned, monotonically increasing
    pub id: i64,
    pub entity: EntityKind,
    pub entity_id: String,
    pub op: SyncOperation,
    /// Full JSON record payload
    pub payload: String,
    pub retry_count: i32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
}

/// User-visible sync state, rendered as a single status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    NotAttempted,
    Offline,
    Syncing,
    Partial,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::NotAttempted => "not_attempted",
            SyncStatus::Offline => "offline",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Partial => "partial",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub status: SyncStatus,
    pub pushed_count: usize,
    pub pulled_count: usize,
    pub duration_ms: i64,
}

/// Trigger source for sync passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCycleTrigger {
    Startup,
    ConnectivityRestored,
    IdentityChanged,
    LocalMutation,
    Periodic,
    Manual,
}

/// Persisted engine state surfaced to the UI as the status line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineStatus {
    pub last_push_at: Option<String>,
    pub last_pull_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: i32,
    pub last_cycle_status: Option<String>,
    pub last_cycle_duration_ms: Option<i64>,
}

/// Collapses the source app variants (with/without auth, with/without sync)
/// into one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub sync_enabled: bool,
    pub auth_required: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            auth_required: true,
        }
    }
}

/// Storage contract the sync engine drives: outbox, persisted engine state,
/// and atomic table replacement for pull refreshes.
#[async_trait]
pub trait SyncRepositoryTrait: Send + Sync {
    /// Peek pending entries in id order, skipping entries whose
    /// `next_retry_at` is still in the future.
    fn list_pending_outbox(&self, limit: i64) -> Result<Vec<OutboxEntry>>;

    /// Append an entry; returns its assigned id once persisted.
    async fn enqueue_outbox(
        &self,
        entity: EntityKind,
        entity_id: String,
        op: SyncOperation,
        payload: serde_json::Value,
    ) -> Result<i64>;

    /// Remove one confirmed entry. Idempotent.
    async fn confirm_outbox_entry(&self, entry_id: i64) -> Result<()>;

    /// Leave a failed entry queued with a bumped retry counter and backoff.
    async fn schedule_outbox_retry(
        &self,
        entry_id: i64,
        backoff_seconds: i64,
        last_error: Option<String>,
    ) -> Result<()>;

    /// Drop every entry. Reserved for tests and explicit local-data resets.
    async fn clear_outbox(&self) -> Result<()>;

    /// Atomically empty one table and insert the given remote rowset;
    /// returns the number of rows inserted.
    async fn replace_table(
        &self,
        entity: EntityKind,
        rows: Vec<serde_json::Value>,
    ) -> Result<usize>;

    fn get_engine_status(&self) -> Result<SyncEngineStatus>;

    /// Persist the outcome of a finished pass.
    async fn mark_cycle_outcome(
        &self,
        status: SyncStatus,
        duration_ms: i64,
        last_error: Option<String>,
    ) -> Result<()>;
}
