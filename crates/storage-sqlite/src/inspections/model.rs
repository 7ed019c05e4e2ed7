use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use apiario_core::inspections::Inspection;

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
#[diesel(table_name = crate::schema::inspections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct InspectionDB {
    pub id: String,
    pub user_id: Option<String>,
    pub hive_id: String,
    pub visited_at: String,
    pub queen_seen: bool,
    pub eggs_seen: bool,
    pub frames_bees: i32,
    pub stores_kg: f64,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<InspectionDB> for Inspection {
    fn from(row: InspectionDB) -> Self {
        Inspection {
            id: row.id,
            user_id: row.user_id,
            hive_id: row.hive_id,
            visited_at: row.visited_at,
            queen_seen: row.queen_seen,
            eggs_seen: row.eggs_seen,
            frames_bees: row.frames_bees,
            stores_kg: row.stores_kg,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

impl From<Inspection> for InspectionDB {
    fn from(inspection: Inspection) -> Self {
        InspectionDB {
            id: inspection.id,
            user_id: inspection.user_id,
            hive_id: inspection.hive_id,
            visited_at: inspection.visited_at,
            queen_seen: inspection.queen_seen,
            eggs_seen: inspection.eggs_seen,
            frames_bees: inspection.frames_bees,
            stores_kg: inspection.stores_kg,
            note: inspection.note,
            created_at: inspection.created_at,
        }
    }
}
