use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use apiario_core::hives::Hive;

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
#[diesel(table_name = crate::schema::hives)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct HiveDB {
    pub id: String,
    pub user_id: Option<String>,
    pub apiary_id: String,
    pub code: String,
    pub queen_installed_at: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<HiveDB> for Hive {
    fn from(row: HiveDB) -> Self {
        Hive {
            id: row.id,
            user_id: row.user_id,
            apiary_id: row.apiary_id,
            code: row.code,
            queen_installed_at: row.queen_installed_at,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

impl From<Hive> for HiveDB {
    fn from(hive: Hive) -> Self {
        HiveDB {
            id: hive.id,
            user_id: hive.user_id,
            apiary_id: hive.apiary_id,
            code: hive.code,
            queen_installed_at: hive.queen_installed_at,
            note: hive.note,
            created_at: hive.created_at,
        }
    }
}
