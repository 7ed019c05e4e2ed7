use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use apiario_core::inspections::{Inspection, InspectionRepositoryTrait};
use apiario_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::inspections;

use super::model::InspectionDB;

pub struct InspectionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl InspectionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        InspectionRepository { pool, writer }
    }
}

#[async_trait]
impl InspectionRepositoryTrait for InspectionRepository {
    fn list_inspections(&self) -> Result<Vec<Inspection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = inspections::table
            .load::<InspectionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Inspection::from).collect())
    }

    fn list_inspections_for_hive(&self, hive_id: &str) -> Result<Vec<Inspection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = inspections::table
            .filter(inspections::hive_id.eq(hive_id))
            .load::<InspectionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Inspection::from).collect())
    }

    async fn upsert_inspection(&self, inspection: Inspection) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = InspectionDB::from(inspection);
                diesel::insert_into(inspections::table)
                    .values(&row)
                    .on_conflict(inspections::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete_inspection(&self, inspection_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let removed = diesel::delete(inspections::table.find(&inspection_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }
}
