use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// One visit to a hive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: String,
    pub user_id: Option<String>,
    pub hive_id: String,
    /// RFC3339 visit timestamp; defaults to the creation instant
    pub visited_at: String,
    pub queen_seen: bool,
    pub eggs_seen: bool,
    pub frames_bees: i32,
    pub stores_kg: f64,
    pub note: Option<String>,
    pub created_at: String,
}

/// Form input for a new inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInspection {
    pub hive_id: String,
    pub visited_at: Option<String>,
    pub queen_seen: bool,
    pub eggs_seen: bool,
    pub frames_bees: i32,
    pub stores_kg: f64,
    pub note: Option<String>,
}

/// Local store contract for inspections.
#[async_trait]
pub trait InspectionRepositoryTrait: Send + Sync {
    fn list_inspections(&self) -> Result<Vec<Inspection>>;

    fn list_inspections_for_hive(&self, hive_id: &str) -> Result<Vec<Inspection>>;

    /// Insert-or-overwrite by id. No outbox write at this layer.
    async fn upsert_inspection(&self, inspection: Inspection) -> Result<()>;

    /// Remove one inspection; resolves with the number removed (0 when
    /// absent).
    async fn delete_inspection(&self, inspection_id: String) -> Result<usize>;
}
