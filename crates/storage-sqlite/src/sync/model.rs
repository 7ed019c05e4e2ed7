//! Database models for the sync infrastructure tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::sync_outbox)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutboxEntryDB {
    pub id: i64,
    pub entity: String,
    pub entity_id: String,
    pub op: String,
    pub payload: String,
    pub retry_count: i32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
}

/// Insert row without the auto-assigned id.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_outbox)]
pub struct NewOutboxEntryDB {
    pub entity: String,
    pub entity_id: String,
    pub op: String,
    pub payload: String,
    pub retry_count: i32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::sync_engine_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncEngineStateDB {
    pub id: i32,
    pub last_push_at: Option<String>,
    pub last_pull_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: i32,
    pub last_cycle_status: Option<String>,
    pub last_cycle_duration_ms: Option<i64>,
}

impl SyncEngineStateDB {
    /// The single status row.
    pub fn empty() -> Self {
        SyncEngineStateDB {
            id: 1,
            last_push_at: None,
            last_pull_at: None,
            last_error: None,
            consecutive_failures: 0,
            last_cycle_status: None,
            last_cycle_duration_ms: None,
        }
    }
}
