use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::aggregate::aggregate_service::{latest_snapshot, pivot_weights, PivotDimension};
use crate::ingest::SourceTag;
use crate::reconcile::PositionRecord;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn record(fund: &str, d: &str, asset: &str, sector: &str, weight: Decimal) -> PositionRecord {
    PositionRecord {
        fund_id: fund.to_string(),
        date: date(d),
        asset_id: asset.to_string(),
        value: weight * dec!(10),
        total_net_assets: dec!(1000),
        weight_pct: weight,
        sector: sector.to_string(),
        source_tag: SourceTag::Regulator,
    }
}

const FUND: &str = "11111111000111";

#[test]
fn pivot_zero_fills_missing_combinations() {
    let records = vec![
        record(FUND, "2024-01-31", "X", "Energy", dec!(60)),
        record(FUND, "2024-01-31", "Y", "Financials", dec!(40)),
        record(FUND, "2024-02-29", "X", "Energy", dec!(100)),
    ];

    let pivot = pivot_weights(&records, FUND, PivotDimension::Asset);

    assert_eq!(pivot.dates, vec![date("2024-01-31"), date("2024-02-29")]);
    assert_eq!(pivot.columns, vec!["X", "Y"]);
    assert_eq!(pivot.rows[0], vec![dec!(60), dec!(40)]);
    // Y is absent in February: zero-filled, not omitted.
    assert_eq!(pivot.rows[1], vec![dec!(100), Decimal::ZERO]);

    for row in &pivot.rows {
        let sum: Decimal = row.iter().copied().sum();
        assert_eq!(sum, dec!(100));
    }
}

#[test]
fn sector_pivot_sums_assets_in_the_same_sector() {
    let records = vec![
        record(FUND, "2024-01-31", "X", "Energy", dec!(30)),
        record(FUND, "2024-01-31", "Y", "Energy", dec!(20)),
        record(FUND, "2024-01-31", "Z", "Financials", dec!(50)),
    ];

    let pivot = pivot_weights(&records, FUND, PivotDimension::Sector);

    assert_eq!(pivot.columns, vec!["Energy", "Financials"]);
    assert_eq!(pivot.rows[0], vec![dec!(50), dec!(50)]);
}

#[test]
fn pivot_for_unknown_fund_is_empty() {
    let records = vec![record(FUND, "2024-01-31", "X", "Energy", dec!(100))];
    assert!(pivot_weights(&records, "99999999000199", PivotDimension::Asset).is_empty());
}

#[test]
fn top_n_folds_the_tail_into_other_per_date() {
    // Twenty assets, weights descending by construction so the mean ranking
    // matches the naming: A01 heaviest .. A20 lightest.
    let mut records = Vec::new();
    for (idx, weight) in (1..=20).rev().enumerate() {
        let asset = format!("A{:02}", idx + 1);
        records.push(record(
            FUND,
            "2024-01-31",
            &asset,
            "Energy",
            Decimal::from(weight),
        ));
        records.push(record(
            FUND,
            "2024-02-29",
            &asset,
            "Energy",
            Decimal::from(weight * 2),
        ));
    }

    let pivot = pivot_weights(&records, FUND, PivotDimension::Asset);
    let collapsed = pivot.collapse_top_n(15);

    assert_eq!(collapsed.columns.len(), 16);
    assert_eq!(collapsed.columns[15], "Other");
    assert_eq!(
        collapsed.columns[..15],
        (1..=15).map(|i| format!("A{:02}", i)).collect::<Vec<_>>()[..]
    );

    // The Other bucket at each date equals the sum of ranks 16..=20 at that
    // date: 5+4+3+2+1 in January, doubled in February.
    assert_eq!(collapsed.rows[0][15], dec!(15));
    assert_eq!(collapsed.rows[1][15], dec!(30));

    // Collapsing never changes a date's total.
    for (row, collapsed_row) in pivot.rows.iter().zip(&collapsed.rows) {
        let before: Decimal = row.iter().copied().sum();
        let after: Decimal = collapsed_row.iter().copied().sum();
        assert_eq!(before, after);
    }
}

#[test]
fn top_n_with_few_columns_is_identity() {
    let records = vec![
        record(FUND, "2024-01-31", "X", "Energy", dec!(60)),
        record(FUND, "2024-01-31", "Y", "Financials", dec!(40)),
    ];
    let pivot = pivot_weights(&records, FUND, PivotDimension::Asset);

    assert_eq!(pivot.collapse_top_n(15), pivot);
}

#[test]
fn snapshot_restricts_to_latest_date_sorted_by_weight() {
    let records = vec![
        record(FUND, "2024-01-31", "OLD1", "Energy", dec!(100)),
        record(FUND, "2024-02-29", "X", "Energy", dec!(30)),
        record(FUND, "2024-02-29", "Y", "Financials", dec!(60)),
        record(FUND, "2024-02-29", "Z", "Energy", dec!(10)),
    ];

    let snapshot = latest_snapshot(&records, FUND).unwrap();

    assert_eq!(snapshot.date, date("2024-02-29"));
    let ids: Vec<&str> = snapshot.entries.iter().map(|e| e.asset_id.as_str()).collect();
    assert_eq!(ids, vec!["Y", "X", "Z"]);
    assert_eq!(snapshot.entries[0].weight_pct, dec!(60));
}

#[test]
fn snapshot_is_none_for_fund_without_rows() {
    assert!(latest_snapshot(&[], FUND).is_none());
}
