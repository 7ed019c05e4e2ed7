use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// A hive exists only in the context of an apiary; deleting the apiary
/// cascades here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hive {
    pub id: String,
    pub user_id: Option<String>,
    /// Parent apiary; referential integrity is the caller's concern, not a
    /// stored constraint
    pub apiary_id: String,
    pub code: String,
    /// RFC3339 date of the current queen's installation
    pub queen_installed_at: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

/// Form input for a new hive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHive {
    pub apiary_id: String,
    pub code: String,
    pub queen_installed_at: Option<String>,
    pub note: Option<String>,
}

/// Local store contract for hives.
#[async_trait]
pub trait HiveRepositoryTrait: Send + Sync {
    fn list_hives(&self) -> Result<Vec<Hive>>;

    fn list_hives_for_apiary(&self, apiary_id: &str) -> Result<Vec<Hive>>;

    /// Insert-or-overwrite by id. No outbox write at this layer.
    async fn upsert_hive(&self, hive: Hive) -> Result<()>;

    /// Remove the hive and its inspections in one transaction; resolves with
    /// the number of hives removed (0 when absent).
    async fn delete_hive_cascade(&self, hive_id: String) -> Result<usize>;
}
