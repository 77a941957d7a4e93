//! Database model for consolidated position rows.
//!
//! Decimals and dates are stored as TEXT and converted at this boundary,
//! keeping the schema backend-portable.

use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use fundlens_core::ingest::SourceTag;
use fundlens_core::reconcile::PositionRecord;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::consolidated_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionRecordDB {
    pub fund_id: String,
    pub date: String,
    pub asset_id: String,
    pub value: String,
    pub total_net_assets: String,
    pub weight_pct: String,
    pub sector: String,
    pub source_tag: String,
}

impl From<PositionRecord> for PositionRecordDB {
    fn from(record: PositionRecord) -> Self {
        Self {
            fund_id: record.fund_id,
            date: record.date.format(DATE_FORMAT).to_string(),
            asset_id: record.asset_id,
            value: record.value.to_string(),
            total_net_assets: record.total_net_assets.to_string(),
            weight_pct: record.weight_pct.to_string(),
            sector: record.sector,
            source_tag: record.source_tag.as_str().to_string(),
        }
    }
}

impl From<PositionRecordDB> for PositionRecord {
    fn from(db: PositionRecordDB) -> Self {
        let date = NaiveDate::parse_from_str(&db.date, DATE_FORMAT).unwrap_or_else(|e| {
            log::error!("Failed to parse stored date '{}': {}", db.date, e);
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
        });
        let source_tag = SourceTag::from_str(&db.source_tag).unwrap_or_else(|e| {
            log::error!("Failed to parse stored source tag: {}", e);
            SourceTag::Regulator
        });
        Self {
            fund_id: db.fund_id,
            date,
            asset_id: db.asset_id,
            value: Decimal::from_str(&db.value).unwrap_or_default(),
            total_net_assets: Decimal::from_str(&db.total_net_assets).unwrap_or_default(),
            weight_pct: Decimal::from_str(&db.weight_pct).unwrap_or_default(),
            sector: db.sector,
            source_tag,
        }
    }
}
