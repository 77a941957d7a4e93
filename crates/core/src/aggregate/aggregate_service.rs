//! Pivot and snapshot operations over the consolidated table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use super::aggregate_model::{FundSnapshot, SnapshotEntry, WeightPivot};
use crate::reconcile::PositionRecord;

/// Which record field becomes the pivot column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotDimension {
    Asset,
    Sector,
}

impl PivotDimension {
    fn column_of(&self, record: &PositionRecord) -> String {
        match self {
            PivotDimension::Asset => record.asset_id.clone(),
            PivotDimension::Sector => record.sector.clone(),
        }
    }
}

/// Builds the date-indexed weight table for one fund.
///
/// Cells with no (date, column) data hold zero rather than being omitted;
/// at sector granularity several assets can fold into one column, so cell
/// values are sums.
pub fn pivot_weights(
    records: &[PositionRecord],
    fund_id: &str,
    dimension: PivotDimension,
) -> WeightPivot {
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut columns: BTreeSet<String> = BTreeSet::new();
    let mut cells: BTreeMap<(NaiveDate, String), Decimal> = BTreeMap::new();

    for record in records.iter().filter(|r| r.fund_id == fund_id) {
        let column = dimension.column_of(record);
        dates.insert(record.date);
        columns.insert(column.clone());
        *cells.entry((record.date, column)).or_insert(Decimal::ZERO) += record.weight_pct;
    }

    if dates.is_empty() {
        return WeightPivot::empty();
    }

    let dates: Vec<NaiveDate> = dates.into_iter().collect();
    let columns: Vec<String> = columns.into_iter().collect();
    let rows: Vec<Vec<Decimal>> = dates
        .iter()
        .map(|date| {
            columns
                .iter()
                .map(|column| {
                    cells
                        .get(&(*date, column.clone()))
                        .copied()
                        .unwrap_or(Decimal::ZERO)
                })
                .collect()
        })
        .collect();

    WeightPivot {
        dates,
        columns,
        rows,
    }
}

/// The fund's most recent disclosure, sorted descending by weight.
/// `None` when the fund has no rows at all.
pub fn latest_snapshot(records: &[PositionRecord], fund_id: &str) -> Option<FundSnapshot> {
    let latest = records
        .iter()
        .filter(|r| r.fund_id == fund_id)
        .map(|r| r.date)
        .max()?;

    let mut entries: Vec<SnapshotEntry> = records
        .iter()
        .filter(|r| r.fund_id == fund_id && r.date == latest)
        .map(|r| SnapshotEntry {
            asset_id: r.asset_id.clone(),
            sector: r.sector.clone(),
            value: r.value,
            weight_pct: r.weight_pct,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.weight_pct
            .cmp(&a.weight_pct)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });

    Some(FundSnapshot {
        fund_id: fund_id.to_string(),
        date: latest,
        entries,
    })
}
