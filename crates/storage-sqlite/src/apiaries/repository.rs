use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use apiario_core::apiaries::{Apiary, ApiaryRepositoryTrait};
use apiario_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{apiaries, hives, inspections};

use super::model::ApiaryDB;

pub struct ApiaryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ApiaryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ApiaryRepository { pool, writer }
    }
}

#[async_trait]
impl ApiaryRepositoryTrait for ApiaryRepository {
    fn list_apiaries(&self) -> Result<Vec<Apiary>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = apiaries::table
            .load::<ApiaryDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Apiary::from).collect())
    }

    async fn upsert_apiary(&self, apiary: Apiary) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = ApiaryDB::from(apiary);
                diesel::insert_into(apiaries::table)
                    .values(&row)
                    .on_conflict(apiaries::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete_apiary_cascade(&self, apiary_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let hive_ids = hives::table
                    .filter(hives::apiary_id.eq(&apiary_id))
                    .select(hives::id)
                    .load::<String>(conn)
                    .map_err(StorageError::from)?;

                diesel::delete(
                    inspections::table.filter(inspections::hive_id.eq_any(&hive_ids)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                diesel::delete(hives::table.filter(hives::apiary_id.eq(&apiary_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let removed = diesel::delete(apiaries::table.find(&apiary_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }
}
