//! Consolidated position records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::DECIMAL_PRECISION;
use crate::ingest::SourceTag;

/// One row of the consolidated table: a fund's position in one asset at
/// one disclosure date. `(fund_id, date, asset_id)` is unique after
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub fund_id: String,
    pub date: NaiveDate,
    pub asset_id: String,
    /// Monetary value in the source currency.
    pub value: Decimal,
    /// Fund-level net assets at `date`.
    pub total_net_assets: Decimal,
    /// value / total_net_assets x 100; zero when net assets are not positive.
    pub weight_pct: Decimal,
    pub sector: String,
    pub source_tag: SourceTag,
}

/// Computes a position weight. Non-positive net assets yield weight zero,
/// never an error.
pub fn weight_pct(value: Decimal, total_net_assets: Decimal) -> Decimal {
    if total_net_assets <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (value / total_net_assets * dec!(100)).round_dp(DECIMAL_PRECISION)
}
