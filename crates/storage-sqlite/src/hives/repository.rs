use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use apiario_core::hives::{Hive, HiveRepositoryTrait};
use apiario_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{hives, inspections};

use super::model::HiveDB;

pub struct HiveRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl HiveRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        HiveRepository { pool, writer }
    }
}

#[async_trait]
impl HiveRepositoryTrait for HiveRepository {
    fn list_hives(&self) -> Result<Vec<Hive>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = hives::table
            .load::<HiveDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Hive::from).collect())
    }

    fn list_hives_for_apiary(&self, apiary_id: &str) -> Result<Vec<Hive>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = hives::table
            .filter(hives::apiary_id.eq(apiary_id))
            .load::<HiveDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Hive::from).collect())
    }

    async fn upsert_hive(&self, hive: Hive) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = HiveDB::from(hive);
                diesel::insert_into(hives::table)
                    .values(&row)
                    .on_conflict(hives::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete_hive_cascade(&self, hive_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                diesel::delete(inspections::table.filter(inspections::hive_id.eq(&hive_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let removed = diesel::delete(hives::table.find(&hive_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }
}
