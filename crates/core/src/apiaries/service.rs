use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::hives::HiveRepositoryTrait;
use crate::inspections::InspectionRepositoryTrait;
use crate::sync::{EntityKind, SyncEngine};

use super::model::{Apiary, ApiaryRepositoryTrait, NewApiary};

/// Facade the UI calls for apiaries; hides whether a write also needs an
/// outbox enqueue.
#[async_trait]
pub trait ApiaryServiceTrait: Send + Sync {
    async fn create_apiary(&self, new_apiary: NewApiary) -> Result<Apiary>;

    /// All apiaries in creation order.
    fn list_apiaries(&self) -> Result<Vec<Apiary>>;

    /// Cascading delete (apiary, its hives, their inspections), remote
    /// children-first, then local in one transaction. Requires connectivity
    /// while sync is enabled; deletes are never queued.
    async fn remove_apiary(&self, apiary_id: &str) -> Result<()>;
}

pub struct ApiaryService {
    repository: Arc<dyn ApiaryRepositoryTrait>,
    hive_repository: Arc<dyn HiveRepositoryTrait>,
    inspection_repository: Arc<dyn InspectionRepositoryTrait>,
    sync: Arc<SyncEngine>,
}

impl ApiaryService {
    pub fn new(
        repository: Arc<dyn ApiaryRepositoryTrait>,
        hive_repository: Arc<dyn HiveRepositoryTrait>,
        inspection_repository: Arc<dyn InspectionRepositoryTrait>,
        sync: Arc<SyncEngine>,
    ) -> Self {
        Self {
            repository,
            hive_repository,
            inspection_repository,
            sync,
        }
    }
}

#[async_trait]
impl ApiaryServiceTrait for ApiaryService {
    async fn create_apiary(&self, new_apiary: NewApiary) -> Result<Apiary> {
        let name = new_apiary.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("apiary name must not be empty"));
        }

        let apiary = Apiary {
            id: Uuid::new_v4().to_string(),
            user_id: self.sync.owner_id(),
            name,
            latitude: new_apiary.latitude,
            longitude: new_apiary.longitude,
            note: new_apiary.note,
            created_at: Utc::now().to_rfc3339(),
        };

        self.repository.upsert_apiary(apiary.clone()).await?;
        self.sync
            .push_optimistic(EntityKind::Apiary, &apiary.id, &apiary)
            .await?;
        Ok(apiary)
    }

    fn list_apiaries(&self) -> Result<Vec<Apiary>> {
        let mut apiaries = self.repository.list_apiaries()?;
        apiaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(apiaries)
    }

    async fn remove_apiary(&self, apiary_id: &str) -> Result<()> {
        // Remote children first so a failure partway leaves no orphans
        // server-side and the local store untouched.
        for hive in self.hive_repository.list_hives_for_apiary(apiary_id)? {
            for inspection in self
                .inspection_repository
                .list_inspections_for_hive(&hive.id)?
            {
                self.sync
                    .delete_remote(EntityKind::Inspection, &inspection.id)
                    .await?;
            }
            self.sync.delete_remote(EntityKind::Hive, &hive.id).await?;
        }
        self.sync.delete_remote(EntityKind::Apiary, apiary_id).await?;

        self.repository
            .delete_apiary_cascade(apiary_id.to_string())
            .await?;
        Ok(())
    }
}
