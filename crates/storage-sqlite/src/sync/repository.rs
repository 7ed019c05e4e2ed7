//! Repository for the sync outbox, engine state, and pull-phase table swaps.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;

use apiario_core::errors::Result;
use apiario_core::sync::{
    EntityKind, OutboxEntry, SyncEngineStatus, SyncOperation, SyncRepositoryTrait, SyncStatus,
};

use crate::apiaries::ApiaryDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::hives::HiveDB;
use crate::inspections::InspectionDB;
use crate::schema::{apiaries, hives, inspections, sync_engine_state, sync_outbox};

use super::model::{NewOutboxEntryDB, OutboxEntryDB, SyncEngineStateDB};

fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}

fn to_outbox_entry(row: OutboxEntryDB) -> Result<OutboxEntry> {
    Ok(OutboxEntry {
        id: row.id,
        entity: enum_from_db(&row.entity)?,
        entity_id: row.entity_id,
        op: enum_from_db(&row.op)?,
        payload: row.payload,
        retry_count: row.retry_count,
        next_retry_at: row.next_retry_at,
        last_error: row.last_error,
        created_at: row.created_at,
    })
}

pub struct SyncRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SyncRepository { pool, writer }
    }
}

#[async_trait]
impl SyncRepositoryTrait for SyncRepository {
    fn list_pending_outbox(&self, limit: i64) -> Result<Vec<OutboxEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now().to_rfc3339();

        let rows = sync_outbox::table
            .filter(
                sync_outbox::next_retry_at
                    .is_null()
                    .or(sync_outbox::next_retry_at.le(now)),
            )
            .order(sync_outbox::id.asc())
            .limit(limit)
            .load::<OutboxEntryDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(to_outbox_entry).collect()
    }

    async fn enqueue_outbox(
        &self,
        entity: EntityKind,
        entity_id: String,
        op: SyncOperation,
        payload: serde_json::Value,
    ) -> Result<i64> {
        let entity_value = enum_to_db(&entity)?;
        let op_value = enum_to_db(&op)?;

        self.writer
            .exec(move |conn| {
                let row = NewOutboxEntryDB {
                    entity: entity_value,
                    entity_id,
                    op: op_value,
                    payload: payload.to_string(),
                    retry_count: 0,
                    next_retry_at: None,
                    last_error: None,
                    created_at: Utc::now().to_rfc3339(),
                };

                let entry_id = diesel::insert_into(sync_outbox::table)
                    .values(&row)
                    .returning(sync_outbox::id)
                    .get_result::<i64>(conn)
                    .map_err(StorageError::from)?;
                Ok(entry_id)
            })
            .await
    }

    async fn confirm_outbox_entry(&self, entry_id: i64) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::delete(sync_outbox::table.find(entry_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn schedule_outbox_retry(
        &self,
        entry_id: i64,
        backoff_seconds: i64,
        last_error: Option<String>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let retry_at = (Utc::now() + Duration::seconds(backoff_seconds)).to_rfc3339();
                diesel::update(sync_outbox::table.find(entry_id))
                    .set((
                        sync_outbox::retry_count.eq(sync_outbox::retry_count + 1),
                        sync_outbox::next_retry_at.eq(Some(retry_at)),
                        sync_outbox::last_error.eq(last_error),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn clear_outbox(&self) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::delete(sync_outbox::table)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn replace_table(
        &self,
        entity: EntityKind,
        rows: Vec<serde_json::Value>,
    ) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                // One transaction per table: readers never observe the table
                // half-empty, and a malformed row rolls the swap back.
                let count = match entity {
                    EntityKind::Apiary => {
                        let rows_db = rows
                            .into_iter()
                            .map(serde_json::from_value::<ApiaryDB>)
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        diesel::delete(apiaries::table)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        diesel::insert_into(apiaries::table)
                            .values(&rows_db)
                            .execute(conn)
                            .map_err(StorageError::from)?
                    }
                    EntityKind::Hive => {
                        let rows_db = rows
                            .into_iter()
                            .map(serde_json::from_value::<HiveDB>)
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        diesel::delete(hives::table)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        diesel::insert_into(hives::table)
                            .values(&rows_db)
                            .execute(conn)
                            .map_err(StorageError::from)?
                    }
                    EntityKind::Inspection => {
                        let rows_db = rows
                            .into_iter()
                            .map(serde_json::from_value::<InspectionDB>)
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        diesel::delete(inspections::table)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        diesel::insert_into(inspections::table)
                            .values(&rows_db)
                            .execute(conn)
                            .map_err(StorageError::from)?
                    }
                };
                Ok(count)
            })
            .await
    }

    fn get_engine_status(&self) -> Result<SyncEngineStatus> {
        let mut conn = get_connection(&self.pool)?;
        let state = sync_engine_state::table
            .find(1)
            .first::<SyncEngineStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(SyncEngineStatus {
            last_push_at: state.as_ref().and_then(|s| s.last_push_at.clone()),
            last_pull_at: state.as_ref().and_then(|s| s.last_pull_at.clone()),
            last_error: state.as_ref().and_then(|s| s.last_error.clone()),
            consecutive_failures: state.as_ref().map(|s| s.consecutive_failures).unwrap_or(0),
            last_cycle_status: state.as_ref().and_then(|s| s.last_cycle_status.clone()),
            last_cycle_duration_ms: state.and_then(|s| s.last_cycle_duration_ms),
        })
    }

    async fn mark_cycle_outcome(
        &self,
        status: SyncStatus,
        duration_ms: i64,
        last_error: Option<String>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let status_value = status.as_str().to_string();

                diesel::insert_into(sync_engine_state::table)
                    .values(SyncEngineStateDB::empty())
                    .on_conflict(sync_engine_state::id)
                    .do_nothing()
                    .execute(conn)
                    .map_err(StorageError::from)?;

                match status {
                    SyncStatus::Synced => {
                        diesel::update(sync_engine_state::table.find(1))
                            .set((
                                sync_engine_state::last_push_at.eq(Some(now.clone())),
                                sync_engine_state::last_pull_at.eq(Some(now)),
                                sync_engine_state::last_error.eq::<Option<String>>(None),
                                sync_engine_state::consecutive_failures.eq(0),
                                sync_engine_state::last_cycle_status.eq(Some(status_value)),
                                sync_engine_state::last_cycle_duration_ms.eq(Some(duration_ms)),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                    SyncStatus::Partial | SyncStatus::Error => {
                        diesel::update(sync_engine_state::table.find(1))
                            .set((
                                sync_engine_state::last_error.eq(last_error),
                                sync_engine_state::consecutive_failures
                                    .eq(sync_engine_state::consecutive_failures + 1),
                                sync_engine_state::last_cycle_status.eq(Some(status_value)),
                                sync_engine_state::last_cycle_duration_ms.eq(Some(duration_ms)),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                    // Unmet preconditions are a normal state, not a failure.
                    SyncStatus::NotAttempted | SyncStatus::Offline | SyncStatus::Syncing => {
                        diesel::update(sync_engine_state::table.find(1))
                            .set((
                                sync_engine_state::last_cycle_status.eq(Some(status_value)),
                                sync_engine_state::last_cycle_duration_ms.eq(Some(duration_ms)),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                }
                Ok(())
            })
            .await
    }
}
