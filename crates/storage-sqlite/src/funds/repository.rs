//! Repository implementation for the fund registry artifact.

use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use fundlens_core::errors::Result;
use fundlens_core::funds::{Fund, FundRepositoryTrait};

use super::model::FundDB;
use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::funds;

pub struct FundRepository {
    pool: Arc<DbPool>,
}

impl FundRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FundRepositoryTrait for FundRepository {
    fn load_all(&self) -> Result<Vec<Fund>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = funds::table
            .order(funds::fund_id.asc())
            .load::<FundDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Fund::from).collect())
    }

    async fn replace_all(&self, entries: Vec<Fund>) -> Result<usize> {
        let db_models: Vec<FundDB> = entries.into_iter().map(FundDB::from).collect();
        debug!("Replacing fund registry with {} entries", db_models.len());

        let mut conn = get_connection(&self.pool)?;
        let written = conn
            .immediate_transaction::<_, StorageError, _>(|conn| {
                diesel::delete(funds::table).execute(conn)?;
                let written = diesel::insert_into(funds::table)
                    .values(&db_models)
                    .execute(conn)?;
                Ok(written)
            })
            .map_err(fundlens_core::Error::from)?;
        Ok(written)
    }
}
