//! Local store behavior against a real on-disk SQLite database.

use std::sync::Arc;

use diesel::prelude::*;
use tempfile::TempDir;
use uuid::Uuid;

use apiario_core::apiaries::{Apiary, ApiaryRepositoryTrait};
use apiario_core::hives::{Hive, HiveRepositoryTrait};
use apiario_core::inspections::{Inspection, InspectionRepositoryTrait};
use apiario_core::sync::{EntityKind, SyncOperation, SyncRepositoryTrait, SyncStatus};

use apiario_storage_sqlite::apiaries::ApiaryRepository;
use apiario_storage_sqlite::hives::HiveRepository;
use apiario_storage_sqlite::inspections::InspectionRepository;
use apiario_storage_sqlite::sync::SyncRepository;
use apiario_storage_sqlite::{create_pool, get_connection, DbPool, WriteHandle};

struct TestStore {
    // Held so the database file outlives the pool.
    _dir: TempDir,
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TestStore {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = dir
            .path()
            .join("apiario-test.db")
            .to_string_lossy()
            .to_string();
        let pool = create_pool(&url).expect("create pool");
        let writer = WriteHandle::spawn(pool.clone()).expect("spawn writer");
        TestStore {
            _dir: dir,
            pool,
            writer,
        }
    }

    fn apiaries(&self) -> ApiaryRepository {
        ApiaryRepository::new(self.pool.clone(), self.writer.clone())
    }

    fn hives(&self) -> HiveRepository {
        HiveRepository::new(self.pool.clone(), self.writer.clone())
    }

    fn inspections(&self) -> InspectionRepository {
        InspectionRepository::new(self.pool.clone(), self.writer.clone())
    }

    fn sync(&self) -> SyncRepository {
        SyncRepository::new(self.pool.clone(), self.writer.clone())
    }
}

fn apiary(name: &str) -> Apiary {
    Apiary {
        id: Uuid::new_v4().to_string(),
        user_id: Some("beekeeper-1".to_string()),
        name: name.to_string(),
        latitude: None,
        longitude: None,
        note: None,
        created_at: "2026-05-01T08:00:00+00:00".to_string(),
    }
}

fn hive(apiary_id: &str, code: &str) -> Hive {
    Hive {
        id: Uuid::new_v4().to_string(),
        user_id: Some("beekeeper-1".to_string()),
        apiary_id: apiary_id.to_string(),
        code: code.to_string(),
        queen_installed_at: None,
        note: None,
        created_at: "2026-05-01T08:05:00+00:00".to_string(),
    }
}

fn inspection(hive_id: &str, visited_at: &str) -> Inspection {
    Inspection {
        id: Uuid::new_v4().to_string(),
        user_id: Some("beekeeper-1".to_string()),
        hive_id: hive_id.to_string(),
        visited_at: visited_at.to_string(),
        queen_seen: true,
        eggs_seen: false,
        frames_bees: 8,
        stores_kg: 12.5,
        note: None,
        created_at: visited_at.to_string(),
    }
}

#[tokio::test]
async fn upsert_is_insert_or_overwrite_by_id() {
    let store = TestStore::new();
    let repo = store.apiaries();

    let mut record = apiary("North Field");
    repo.upsert_apiary(record.clone()).await.unwrap();

    record.name = "North Field (renamed)".to_string();
    repo.upsert_apiary(record.clone()).await.unwrap();

    let listed = repo.list_apiaries().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "North Field (renamed)");
}

#[tokio::test]
async fn delete_of_absent_record_is_idempotent() {
    let store = TestStore::new();

    let removed = store
        .inspections()
        .delete_inspection("no-such-id".to_string())
        .await
        .unwrap();
    assert_eq!(removed, 0);

    let removed = store
        .apiaries()
        .delete_apiary_cascade("no-such-id".to_string())
        .await
        .unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn apiary_delete_cascades_to_hives_and_their_inspections() {
    let store = TestStore::new();
    let apiaries = store.apiaries();
    let hives = store.hives();
    let inspections = store.inspections();

    let doomed = apiary("Doomed Yard");
    let kept = apiary("Kept Yard");
    apiaries.upsert_apiary(doomed.clone()).await.unwrap();
    apiaries.upsert_apiary(kept.clone()).await.unwrap();

    let doomed_hive_a = hive(&doomed.id, "D-1");
    let doomed_hive_b = hive(&doomed.id, "D-2");
    let kept_hive = hive(&kept.id, "K-1");
    for h in [&doomed_hive_a, &doomed_hive_b, &kept_hive] {
        hives.upsert_hive(h.clone()).await.unwrap();
    }

    inspections
        .upsert_inspection(inspection(&doomed_hive_a.id, "2026-05-02T09:00:00+00:00"))
        .await
        .unwrap();
    inspections
        .upsert_inspection(inspection(&doomed_hive_b.id, "2026-05-03T09:00:00+00:00"))
        .await
        .unwrap();
    inspections
        .upsert_inspection(inspection(&kept_hive.id, "2026-05-04T09:00:00+00:00"))
        .await
        .unwrap();

    let removed = apiaries.delete_apiary_cascade(doomed.id.clone()).await.unwrap();
    assert_eq!(removed, 1);

    assert!(hives.list_hives_for_apiary(&doomed.id).unwrap().is_empty());
    assert!(inspections
        .list_inspections_for_hive(&doomed_hive_a.id)
        .unwrap()
        .is_empty());
    assert!(inspections
        .list_inspections_for_hive(&doomed_hive_b.id)
        .unwrap()
        .is_empty());

    // The other apiary's subtree is untouched.
    assert_eq!(hives.list_hives_for_apiary(&kept.id).unwrap().len(), 1);
    assert_eq!(
        inspections
            .list_inspections_for_hive(&kept_hive.id)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn replace_table_swaps_the_full_rowset() {
    let store = TestStore::new();
    let apiaries = store.apiaries();
    let sync = store.sync();

    apiaries.upsert_apiary(apiary("Local A")).await.unwrap();
    apiaries.upsert_apiary(apiary("Local B")).await.unwrap();

    let remote_row = serde_json::to_value(apiary("Remote Only")).unwrap();
    let inserted = sync
        .replace_table(EntityKind::Apiary, vec![remote_row])
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let listed = apiaries.list_apiaries().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Remote Only");
}

#[tokio::test]
async fn replace_table_rolls_back_on_malformed_row() {
    let store = TestStore::new();
    let apiaries = store.apiaries();
    let sync = store.sync();

    apiaries.upsert_apiary(apiary("Survivor")).await.unwrap();

    let rows = vec![
        serde_json::to_value(apiary("Fine Row")).unwrap(),
        serde_json::json!({ "id": "broken" }),
    ];
    let result = sync.replace_table(EntityKind::Apiary, rows).await;
    assert!(result.is_err());

    // The swap is one transaction: the previous rowset is intact.
    let listed = apiaries.list_apiaries().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Survivor");
}

#[tokio::test]
async fn outbox_drains_in_insertion_order_and_confirms_per_entry() {
    let store = TestStore::new();
    let sync = store.sync();

    let first = sync
        .enqueue_outbox(
            EntityKind::Apiary,
            "a1".to_string(),
            SyncOperation::Upsert,
            serde_json::json!({"id": "a1"}),
        )
        .await
        .unwrap();
    let second = sync
        .enqueue_outbox(
            EntityKind::Hive,
            "h1".to_string(),
            SyncOperation::Upsert,
            serde_json::json!({"id": "h1"}),
        )
        .await
        .unwrap();
    let third = sync
        .enqueue_outbox(
            EntityKind::Inspection,
            "i1".to_string(),
            SyncOperation::Upsert,
            serde_json::json!({"id": "i1"}),
        )
        .await
        .unwrap();
    assert!(first < second && second < third);

    let pending = sync.list_pending_outbox(10).unwrap();
    let ids: Vec<&str> = pending.iter().map(|e| e.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "h1", "i1"]);

    // Confirming one entry leaves the others queued.
    sync.confirm_outbox_entry(second).await.unwrap();
    sync.confirm_outbox_entry(second).await.unwrap(); // idempotent

    let pending = sync.list_pending_outbox(10).unwrap();
    let ids: Vec<&str> = pending.iter().map(|e| e.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "i1"]);

    // Explicit local-data reset drops whatever is left.
    sync.clear_outbox().await.unwrap();
    assert!(sync.list_pending_outbox(10).unwrap().is_empty());
}

#[tokio::test]
async fn retry_backoff_hides_entry_until_due() {
    let store = TestStore::new();
    let sync = store.sync();

    let entry_id = sync
        .enqueue_outbox(
            EntityKind::Apiary,
            "a1".to_string(),
            SyncOperation::Upsert,
            serde_json::json!({"id": "a1"}),
        )
        .await
        .unwrap();

    sync.schedule_outbox_retry(entry_id, 300, Some("service unavailable".to_string()))
        .await
        .unwrap();

    // Not due yet, so the push phase sees nothing.
    assert!(sync.list_pending_outbox(10).unwrap().is_empty());

    // The entry itself is still persisted with its retry metadata.
    use apiario_storage_sqlite::schema::sync_outbox;
    use apiario_storage_sqlite::sync::OutboxEntryDB;
    let mut conn = get_connection(&store.pool).unwrap();
    let row = sync_outbox::table
        .find(entry_id)
        .first::<OutboxEntryDB>(&mut conn)
        .unwrap();
    assert_eq!(row.retry_count, 1);
    assert_eq!(row.last_error.as_deref(), Some("service unavailable"));
    assert!(row.next_retry_at.is_some());
}

#[tokio::test]
async fn engine_state_tracks_cycle_outcomes() {
    let store = TestStore::new();
    let sync = store.sync();

    sync.mark_cycle_outcome(SyncStatus::Synced, 120, None)
        .await
        .unwrap();
    let status = sync.get_engine_status().unwrap();
    assert_eq!(status.last_cycle_status.as_deref(), Some("synced"));
    assert_eq!(status.consecutive_failures, 0);
    assert!(status.last_push_at.is_some());
    assert!(status.last_pull_at.is_some());

    sync.mark_cycle_outcome(SyncStatus::Partial, 80, Some("pull failed".to_string()))
        .await
        .unwrap();
    sync.mark_cycle_outcome(SyncStatus::Partial, 90, Some("pull failed".to_string()))
        .await
        .unwrap();
    let status = sync.get_engine_status().unwrap();
    assert_eq!(status.last_cycle_status.as_deref(), Some("partial"));
    assert_eq!(status.consecutive_failures, 2);
    assert_eq!(status.last_error.as_deref(), Some("pull failed"));

    // A skipped pass records its status without counting as a failure.
    sync.mark_cycle_outcome(SyncStatus::Offline, 1, None)
        .await
        .unwrap();
    let status = sync.get_engine_status().unwrap();
    assert_eq!(status.last_cycle_status.as_deref(), Some("offline"));
    assert_eq!(status.consecutive_failures, 2);
}

#[tokio::test]
async fn inspections_are_scoped_to_their_hive() {
    let store = TestStore::new();
    let inspections = store.inspections();

    inspections
        .upsert_inspection(inspection("h1", "2026-05-02T09:00:00+00:00"))
        .await
        .unwrap();
    inspections
        .upsert_inspection(inspection("h1", "2026-05-09T09:00:00+00:00"))
        .await
        .unwrap();
    inspections
        .upsert_inspection(inspection("h2", "2026-05-05T09:00:00+00:00"))
        .await
        .unwrap();

    assert_eq!(inspections.list_inspections_for_hive("h1").unwrap().len(), 2);
    assert_eq!(inspections.list_inspections_for_hive("h2").unwrap().len(), 1);
    assert_eq!(inspections.list_inspections().unwrap().len(), 3);
}
