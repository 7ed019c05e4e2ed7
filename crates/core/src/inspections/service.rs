use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::sync::{EntityKind, SyncEngine};

use super::model::{Inspection, InspectionRepositoryTrait, NewInspection};

/// Orders two RFC3339 timestamps, newest first.
///
/// Parses when both sides parse; falls back to lexical ordering for foreign
/// formats (one producer writes `Utc::now().to_rfc3339()`, so local data
/// always takes the parsed path).
fn newest_first(a: &str, b: &str) -> Ordering {
    let parse = |value: &str| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.timestamp_millis())
            .ok()
    };
    match (parse(a), parse(b)) {
        (Some(a_ms), Some(b_ms)) => b_ms.cmp(&a_ms),
        _ => b.cmp(a),
    }
}

/// Facade the UI calls for inspections.
#[async_trait]
pub trait InspectionServiceTrait: Send + Sync {
    async fn create_inspection(&self, new_inspection: NewInspection) -> Result<Inspection>;

    /// Inspection history of one hive, newest visit first.
    fn list_inspections(&self, hive_id: &str) -> Result<Vec<Inspection>>;

    /// Immediate delete. Requires connectivity while sync is enabled.
    async fn remove_inspection(&self, inspection_id: &str) -> Result<()>;
}

pub struct InspectionService {
    repository: Arc<dyn InspectionRepositoryTrait>,
    sync: Arc<SyncEngine>,
}

impl InspectionService {
    pub fn new(repository: Arc<dyn InspectionRepositoryTrait>, sync: Arc<SyncEngine>) -> Self {
        Self { repository, sync }
    }
}

#[async_trait]
impl InspectionServiceTrait for InspectionService {
    async fn create_inspection(&self, new_inspection: NewInspection) -> Result<Inspection> {
        if new_inspection.hive_id.is_empty() {
            return Err(Error::validation("inspection requires a parent hive"));
        }
        if new_inspection.frames_bees < 0 {
            return Err(Error::validation("frame count must not be negative"));
        }

        let now = Utc::now().to_rfc3339();
        let inspection = Inspection {
            id: Uuid::new_v4().to_string(),
            user_id: self.sync.owner_id(),
            hive_id: new_inspection.hive_id,
            visited_at: new_inspection.visited_at.unwrap_or_else(|| now.clone()),
            queen_seen: new_inspection.queen_seen,
            eggs_seen: new_inspection.eggs_seen,
            frames_bees: new_inspection.frames_bees,
            stores_kg: new_inspection.stores_kg,
            note: new_inspection.note,
            created_at: now,
        };

        self.repository.upsert_inspection(inspection.clone()).await?;
        self.sync
            .push_optimistic(EntityKind::Inspection, &inspection.id, &inspection)
            .await?;
        Ok(inspection)
    }

    fn list_inspections(&self, hive_id: &str) -> Result<Vec<Inspection>> {
        let mut inspections = self.repository.list_inspections_for_hive(hive_id)?;
        inspections.sort_by(|a, b| newest_first(&a.visited_at, &b.visited_at));
        Ok(inspections)
    }

    async fn remove_inspection(&self, inspection_id: &str) -> Result<()> {
        self.sync
            .delete_remote(EntityKind::Inspection, inspection_id)
            .await?;
        self.repository
            .delete_inspection(inspection_id.to_string())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::newest_first;
    use std::cmp::Ordering;

    #[test]
    fn newest_first_orders_by_timestamp_value() {
        assert_eq!(
            newest_first("2026-03-01T10:00:00+00:00", "2026-03-02T10:00:00+00:00"),
            Ordering::Greater
        );
        // Offset formats compare by instant, not text.
        assert_eq!(
            newest_first("2026-03-01T12:00:00+02:00", "2026-03-01T10:00:00+00:00"),
            Ordering::Equal
        );
    }

    #[test]
    fn newest_first_falls_back_to_lexical_for_foreign_formats() {
        assert_eq!(newest_first("b", "a"), Ordering::Less);
    }
}
