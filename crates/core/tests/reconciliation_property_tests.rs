//! Property-based integration tests for the reconciliation and overlap
//! engines.
//!
//! These tests verify that universal properties hold across all valid
//! inputs, using the `proptest` crate for random test case generation.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use fundlens_core::aggregate::overlap_weights;
use fundlens_core::funds::{Fund, FundRegistry};
use fundlens_core::ingest::{NormalizedFiling, SourceTag};
use fundlens_core::reconcile::{consolidate, ConsolidationInput};
use fundlens_core::sectors::SectorClassifier;

// =============================================================================
// Generators
// =============================================================================

fn arb_source() -> impl Strategy<Value = SourceTag> {
    prop_oneof![
        Just(SourceTag::Xml),
        Just(SourceTag::Regulator),
        Just(SourceTag::RegulatorOnDemand),
    ]
}

fn arb_fund_id() -> impl Strategy<Value = String> {
    "[1-9][0-9]{13}"
}

fn arb_asset_id() -> impl Strategy<Value = String> {
    "[A-Z]{4}[0-9]"
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2023i32..2025, 1u32..13).prop_map(|(year, month)| {
        NaiveDate::from_ymd_opt(year, month, 28).expect("day 28 exists in every month")
    })
}

/// A filing with up to eight positive positions. Net assets may be zero so
/// the zero-weight edge case is exercised.
fn arb_filing() -> impl Strategy<Value = NormalizedFiling> {
    (
        arb_fund_id(),
        arb_date(),
        0i64..10_000_000,
        proptest::collection::vec((arb_asset_id(), 1i64..1_000_000), 0..8),
        arb_source(),
    )
        .prop_map(|(fund_id, date, total, positions, source)| {
            let mut filing =
                NormalizedFiling::new(fund_id, date, Decimal::from(total), source);
            for (asset_id, value) in positions {
                filing.push_position(asset_id, Decimal::from(value));
            }
            filing
        })
}

fn arb_filings(max_count: usize) -> impl Strategy<Value = Vec<NormalizedFiling>> {
    proptest::collection::vec(arb_filing(), 0..=max_count)
}

/// A weight dictionary whose entries sum to at most 100 (at most eight
/// entries of at most 12 percent each).
fn arb_weight_dict() -> impl Strategy<Value = HashMap<String, Decimal>> {
    proptest::collection::vec((arb_asset_id(), 1u32..=12), 0..8).prop_map(|entries| {
        let mut dict: HashMap<String, Decimal> = HashMap::new();
        for (asset, raw) in entries {
            dict.entry(asset).or_insert(Decimal::from(raw));
        }
        dict
    })
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date")
}

fn run(input: ConsolidationInput, registry: &FundRegistry) -> Vec<fundlens_core::PositionRecord> {
    consolidate(input, registry, &SectorClassifier::empty(), today())
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// (fund_id, date, asset_id) is unique in the consolidated table, no
    /// matter how the sources conflict.
    #[test]
    fn prop_consolidated_keys_are_unique(
        custody in arb_filings(12),
        regulator in arb_filings(12),
    ) {
        let records = run(
            ConsolidationInput { custody, regulator, on_demand: vec![] },
            &FundRegistry::default(),
        );

        let mut seen = HashSet::new();
        for record in &records {
            prop_assert!(
                seen.insert((record.fund_id.clone(), record.date, record.asset_id.clone())),
                "duplicate key ({}, {}, {})",
                record.fund_id,
                record.date,
                record.asset_id
            );
        }
    }

    /// Weights are never negative, and zero net assets always yield weight
    /// zero rather than an error.
    #[test]
    fn prop_weights_are_never_negative(custody in arb_filings(12)) {
        let records = run(
            ConsolidationInput { custody, regulator: vec![], on_demand: vec![] },
            &FundRegistry::default(),
        );

        for record in &records {
            prop_assert!(record.weight_pct >= Decimal::ZERO);
            if record.total_net_assets <= Decimal::ZERO {
                prop_assert_eq!(record.weight_pct, Decimal::ZERO);
            }
        }
    }

    /// Consolidation is a pure function: the same inputs produce the same
    /// rows in the same order.
    #[test]
    fn prop_consolidation_is_deterministic(
        custody in arb_filings(10),
        regulator in arb_filings(10),
    ) {
        let input = ConsolidationInput { custody, regulator, on_demand: vec![] };
        let registry = FundRegistry::default();

        let first = run(input.clone(), &registry);
        let second = run(input, &registry);

        prop_assert_eq!(first, second);
    }

    /// Every row a feeder gains through substitution is a verbatim copy of
    /// a master row (same asset, value, net assets, and weight).
    #[test]
    fn prop_feeder_rows_mirror_master_rows(
        master_filings in arb_filings(8),
        feeder_id in arb_fund_id(),
        master_id in arb_fund_id(),
    ) {
        prop_assume!(feeder_id != master_id);

        // Pin every generated filing to the master fund.
        let regulator: Vec<NormalizedFiling> = master_filings
            .into_iter()
            .map(|mut f| { f.fund_id = master_id.clone(); f })
            .collect();

        let registry = FundRegistry::new(vec![
            Fund {
                fund_id: master_id.clone(),
                master_fund_id: None,
                name: "Master".to_string(),
                category: "Equities".to_string(),
                tier: "institutional".to_string(),
            },
            Fund {
                fund_id: feeder_id.clone(),
                master_fund_id: Some(master_id.clone()),
                name: "Feeder".to_string(),
                category: "Equities".to_string(),
                tier: "retail".to_string(),
            },
        ]);

        let records = run(
            ConsolidationInput { custody: vec![], regulator, on_demand: vec![] },
            &registry,
        );

        let master_rows: HashSet<_> = records
            .iter()
            .filter(|r| r.fund_id == master_id)
            .map(|r| (r.date, r.asset_id.clone(), r.value, r.total_net_assets, r.weight_pct))
            .collect();
        let feeder_rows: HashSet<_> = records
            .iter()
            .filter(|r| r.fund_id == feeder_id)
            .map(|r| (r.date, r.asset_id.clone(), r.value, r.total_net_assets, r.weight_pct))
            .collect();

        prop_assert_eq!(feeder_rows, master_rows);
    }

    /// Overlap is symmetric and bounded by [0, 100] for valid percentage
    /// weights.
    #[test]
    fn prop_overlap_symmetric_and_bounded(
        a in arb_weight_dict(),
        b in arb_weight_dict(),
    ) {
        let ab = overlap_weights(&a, &b);
        let ba = overlap_weights(&b, &a);

        prop_assert_eq!(ab, ba);
        prop_assert!(ab >= Decimal::ZERO);
        prop_assert!(ab <= Decimal::from(100));
    }

    /// Overlap never exceeds either fund's own captured mass.
    #[test]
    fn prop_overlap_bounded_by_each_side(
        a in arb_weight_dict(),
        b in arb_weight_dict(),
    ) {
        let overlap = overlap_weights(&a, &b);
        let total_a: Decimal = a.values().copied().sum();
        let total_b: Decimal = b.values().copied().sum();

        prop_assert!(overlap <= total_a.min(total_b));
    }
}
