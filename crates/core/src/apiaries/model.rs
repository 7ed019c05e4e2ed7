use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Root of the record hierarchy; hives and inspections hang off it.
///
/// Field names are the wire format shared with the remote table service, so
/// the same struct serializes for the outbox, the optimistic push, and pull
/// replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apiary {
    /// Client-generated, unique within the table
    pub id: String,
    /// Owner; `None` until created under an authenticated session
    pub user_id: Option<String>,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
    /// RFC3339, client clock
    pub created_at: String,
}

/// Form input for a new apiary; id, owner, and creation timestamp are
/// assigned by the facade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewApiary {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
}

/// Local store contract for apiaries.
#[async_trait]
pub trait ApiaryRepositoryTrait: Send + Sync {
    fn list_apiaries(&self) -> Result<Vec<Apiary>>;

    /// Insert-or-overwrite by id. No outbox write at this layer.
    async fn upsert_apiary(&self, apiary: Apiary) -> Result<()>;

    /// Remove the apiary, its hives, and their inspections in one
    /// transaction; resolves with the number of apiaries removed (0 when
    /// absent).
    async fn delete_apiary_cascade(&self, apiary_id: String) -> Result<usize>;
}
