//! Repository implementation for the consolidated snapshot artifact.

use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use fundlens_core::errors::Result;
use fundlens_core::reconcile::{ConsolidatedRepositoryTrait, PositionRecord};

use super::model::PositionRecordDB;
use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::consolidated_positions;

// SQLite bind-variable limit; 8 columns per row.
const INSERT_CHUNK_ROWS: usize = 1000;

pub struct ConsolidatedRepository {
    pool: Arc<DbPool>,
}

impl ConsolidatedRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConsolidatedRepositoryTrait for ConsolidatedRepository {
    fn load_all(&self) -> Result<Vec<PositionRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = consolidated_positions::table
            .order((
                consolidated_positions::fund_id.asc(),
                consolidated_positions::date.asc(),
                consolidated_positions::asset_id.asc(),
            ))
            .load::<PositionRecordDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(PositionRecord::from).collect())
    }

    fn count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = consolidated_positions::table
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    async fn replace_all(&self, records: Vec<PositionRecord>) -> Result<usize> {
        let db_models: Vec<PositionRecordDB> =
            records.into_iter().map(PositionRecordDB::from).collect();
        debug!("Replacing snapshot artifact with {} rows", db_models.len());

        let mut conn = get_connection(&self.pool)?;
        let written = conn
            .immediate_transaction::<_, StorageError, _>(|conn| {
                diesel::delete(consolidated_positions::table).execute(conn)?;
                let mut written = 0;
                for chunk in db_models.chunks(INSERT_CHUNK_ROWS) {
                    written += diesel::insert_into(consolidated_positions::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(written)
            })
            .map_err(fundlens_core::Error::from)?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    use fundlens_core::ingest::SourceTag;

    fn test_pool(dir: &TempDir) -> Arc<DbPool> {
        let db_path = dir.path().join("test.db");
        crate::db::init(db_path.to_str().unwrap()).unwrap()
    }

    fn record(fund: &str, day: u32, asset: &str) -> PositionRecord {
        PositionRecord {
            fund_id: fund.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            asset_id: asset.to_string(),
            value: dec!(500000),
            total_net_assets: dec!(1000000),
            weight_pct: dec!(50),
            sector: "Energy".to_string(),
            source_tag: SourceTag::Xml,
        }
    }

    #[tokio::test]
    async fn replace_and_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let repository = ConsolidatedRepository::new(test_pool(&dir));

        let records = vec![
            record("22222222000122", 31, "X"),
            record("11111111000111", 31, "Y"),
            record("11111111000111", 31, "X"),
        ];
        let written = repository.replace_all(records).await.unwrap();
        assert_eq!(written, 3);

        let loaded = repository.load_all().unwrap();
        assert_eq!(loaded.len(), 3);
        // Ordered by (fund, date, asset).
        assert_eq!(loaded[0].fund_id, "11111111000111");
        assert_eq!(loaded[0].asset_id, "X");
        assert_eq!(loaded[1].asset_id, "Y");
        assert_eq!(loaded[2].fund_id, "22222222000122");

        assert_eq!(loaded[0].value, dec!(500000));
        assert_eq!(loaded[0].weight_pct, dec!(50));
        assert_eq!(loaded[0].source_tag, SourceTag::Xml);
        assert_eq!(
            loaded[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }

    #[tokio::test]
    async fn replace_all_discards_the_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let repository = ConsolidatedRepository::new(test_pool(&dir));

        repository
            .replace_all(vec![record("11111111000111", 31, "OLD")])
            .await
            .unwrap();
        repository
            .replace_all(vec![record("11111111000111", 31, "NEW")])
            .await
            .unwrap();

        let loaded = repository.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].asset_id, "NEW");
        assert_eq!(repository.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_snapshot_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let repository = ConsolidatedRepository::new(test_pool(&dir));

        assert!(repository.load_all().unwrap().is_empty());
        assert_eq!(repository.count().unwrap(), 0);
    }
}
