use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::inspections::InspectionRepositoryTrait;
use crate::sync::{EntityKind, SyncEngine};

use super::model::{Hive, HiveRepositoryTrait, NewHive};

/// Facade the UI calls for hives.
#[async_trait]
pub trait HiveServiceTrait: Send + Sync {
    async fn create_hive(&self, new_hive: NewHive) -> Result<Hive>;

    /// Hives of one apiary in creation order.
    fn list_hives(&self, apiary_id: &str) -> Result<Vec<Hive>>;

    /// Cascading delete (hive, its inspections). Requires connectivity while
    /// sync is enabled.
    async fn remove_hive(&self, hive_id: &str) -> Result<()>;
}

pub struct HiveService {
    repository: Arc<dyn HiveRepositoryTrait>,
    inspection_repository: Arc<dyn InspectionRepositoryTrait>,
    sync: Arc<SyncEngine>,
}

impl HiveService {
    pub fn new(
        repository: Arc<dyn HiveRepositoryTrait>,
        inspection_repository: Arc<dyn InspectionRepositoryTrait>,
        sync: Arc<SyncEngine>,
    ) -> Self {
        Self {
            repository,
            inspection_repository,
            sync,
        }
    }
}

#[async_trait]
impl HiveServiceTrait for HiveService {
    async fn create_hive(&self, new_hive: NewHive) -> Result<Hive> {
        let code = new_hive.code.trim().to_string();
        if code.is_empty() {
            return Err(Error::validation("hive code must not be empty"));
        }
        if new_hive.apiary_id.is_empty() {
            return Err(Error::validation("hive requires a parent apiary"));
        }

        let hive = Hive {
            id: Uuid::new_v4().to_string(),
            user_id: self.sync.owner_id(),
            apiary_id: new_hive.apiary_id,
            code,
            queen_installed_at: new_hive.queen_installed_at,
            note: new_hive.note,
            created_at: Utc::now().to_rfc3339(),
        };

        self.repository.upsert_hive(hive.clone()).await?;
        self.sync
            .push_optimistic(EntityKind::Hive, &hive.id, &hive)
            .await?;
        Ok(hive)
    }

    fn list_hives(&self, apiary_id: &str) -> Result<Vec<Hive>> {
        let mut hives = self.repository.list_hives_for_apiary(apiary_id)?;
        hives.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(hives)
    }

    async fn remove_hive(&self, hive_id: &str) -> Result<()> {
        for inspection in self.inspection_repository.list_inspections_for_hive(hive_id)? {
            self.sync
                .delete_remote(EntityKind::Inspection, &inspection.id)
                .await?;
        }
        self.sync.delete_remote(EntityKind::Hive, hive_id).await?;

        self.repository.delete_hive_cascade(hive_id.to_string()).await?;
        Ok(())
    }
}
