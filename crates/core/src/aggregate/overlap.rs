//! Pairwise overlap metrics between funds.
//!
//! overlap(A, B) = Σ over assets held by both of min(weight_a, weight_b).
//! The minimum represents the maximum mass the two portfolios could share
//! if the common asset is construed as the same underlying exposure; the
//! score is symmetric and bounded by [0, 100] for valid percentage
//! weights. A fund compared to itself is defined as 0 ("not meaningful"),
//! not 100.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

use super::aggregate_model::{CommonHolding, OverlapPoint};
use super::aggregate_service::PivotDimension;
use crate::constants::TOP_HOLDINGS_COUNT;
use crate::reconcile::PositionRecord;

/// Overlap between two weight dictionaries.
pub fn overlap_weights(
    a: &HashMap<String, Decimal>,
    b: &HashMap<String, Decimal>,
) -> Decimal {
    a.iter()
        .filter_map(|(asset, weight_a)| b.get(asset).map(|weight_b| (*weight_a).min(*weight_b)))
        .sum()
}

/// One fund's weight dictionary at one date, at asset or sector
/// granularity.
pub fn weights_at(
    records: &[PositionRecord],
    fund_id: &str,
    date: NaiveDate,
    dimension: PivotDimension,
) -> HashMap<String, Decimal> {
    let mut weights: HashMap<String, Decimal> = HashMap::new();
    for record in records
        .iter()
        .filter(|r| r.fund_id == fund_id && r.date == date)
    {
        let key = match dimension {
            PivotDimension::Asset => record.asset_id.clone(),
            PivotDimension::Sector => record.sector.clone(),
        };
        *weights.entry(key).or_insert(Decimal::ZERO) += record.weight_pct;
    }
    weights
}

fn fund_dates(records: &[PositionRecord], fund_id: &str) -> BTreeSet<NaiveDate> {
    records
        .iter()
        .filter(|r| r.fund_id == fund_id)
        .map(|r| r.date)
        .collect()
}

/// Overlap at every date present in *both* funds' histories. Dates covered
/// by only one fund produce no point: the series is the intersection of the
/// two date sets, never an interpolation across gaps.
pub fn overlap_series(
    records: &[PositionRecord],
    fund_a: &str,
    fund_b: &str,
    dimension: PivotDimension,
) -> Vec<OverlapPoint> {
    let dates_a = fund_dates(records, fund_a);
    let dates_b = fund_dates(records, fund_b);

    dates_a
        .intersection(&dates_b)
        .map(|&date| OverlapPoint {
            date,
            overlap: overlap_weights(
                &weights_at(records, fund_a, date, dimension),
                &weights_at(records, fund_b, date, dimension),
            ),
        })
        .collect()
}

/// Overlap at the latest date both funds disclose; `None` when their
/// histories share no date.
pub fn latest_overlap(
    records: &[PositionRecord],
    fund_a: &str,
    fund_b: &str,
    dimension: PivotDimension,
) -> Option<Decimal> {
    let dates_a = fund_dates(records, fund_a);
    let dates_b = fund_dates(records, fund_b);
    let date = dates_a.intersection(&dates_b).max().copied()?;
    Some(overlap_weights(
        &weights_at(records, fund_a, date, dimension),
        &weights_at(records, fund_b, date, dimension),
    ))
}

/// Pairwise overlap matrix for the given funds, using each pair's latest
/// common date. The diagonal is 0 by convention, and pairs without a
/// common date are 0 as well.
pub fn overlap_matrix(
    records: &[PositionRecord],
    fund_ids: &[&str],
    dimension: PivotDimension,
) -> Vec<Vec<Decimal>> {
    let n = fund_ids.len();
    let mut matrix = vec![vec![Decimal::ZERO; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let value = latest_overlap(records, fund_ids[i], fund_ids[j], dimension)
                .unwrap_or(Decimal::ZERO);
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }
    matrix
}

/// Intersects every fund's current top holdings and reports each fund's
/// weight for the shared assets, ordered by total weight descending.
///
/// "Current" is each fund's own latest date; "top" is the
/// `TOP_HOLDINGS_COUNT` heaviest assets at that date.
pub fn common_top_holdings(
    records: &[PositionRecord],
    fund_ids: &[&str],
) -> Vec<CommonHolding> {
    if fund_ids.len() < 2 {
        return Vec::new();
    }

    let mut per_fund: Vec<HashMap<String, (Decimal, String)>> = Vec::with_capacity(fund_ids.len());
    for fund_id in fund_ids {
        let Some(latest) = fund_dates(records, fund_id).into_iter().next_back() else {
            return Vec::new();
        };
        let mut holdings: Vec<&PositionRecord> = records
            .iter()
            .filter(|r| r.fund_id == *fund_id && r.date == latest)
            .collect();
        holdings.sort_by(|a, b| {
            b.weight_pct
                .cmp(&a.weight_pct)
                .then_with(|| a.asset_id.cmp(&b.asset_id))
        });
        per_fund.push(
            holdings
                .into_iter()
                .take(TOP_HOLDINGS_COUNT)
                .map(|r| (r.asset_id.clone(), (r.weight_pct, r.sector.clone())))
                .collect(),
        );
    }

    let mut shared: Vec<CommonHolding> = per_fund[0]
        .iter()
        .filter(|(asset_id, _)| per_fund[1..].iter().all(|fund| fund.contains_key(*asset_id)))
        .map(|(asset_id, (_, sector))| CommonHolding {
            asset_id: asset_id.clone(),
            sector: sector.clone(),
            weights: per_fund
                .iter()
                .map(|fund| fund[asset_id].0)
                .collect(),
        })
        .collect();

    shared.sort_by(|a, b| {
        let total_a: Decimal = a.weights.iter().copied().sum();
        let total_b: Decimal = b.weights.iter().copied().sum();
        total_b
            .cmp(&total_a)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });
    shared
}
