use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use apiario_core::apiaries::Apiary;

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
#[diesel(table_name = crate::schema::apiaries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
// Re-save is the only mutation path, so an upsert must overwrite the whole
// row, cleared optional fields included.
#[diesel(treat_none_as_null = true)]
pub struct ApiaryDB {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<ApiaryDB> for Apiary {
    fn from(row: ApiaryDB) -> Self {
        Apiary {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

impl From<Apiary> for ApiaryDB {
    fn from(apiary: Apiary) -> Self {
        ApiaryDB {
            id: apiary.id,
            user_id: apiary.user_id,
            name: apiary.name,
            latitude: apiary.latitude,
            longitude: apiary.longitude,
            note: apiary.note,
            created_at: apiary.created_at,
        }
    }
}
