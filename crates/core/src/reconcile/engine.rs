//! The reconciliation engine.
//!
//! A pure function pipeline from per-source filings plus the fund registry
//! to the final consolidated rows. `today` is a parameter, never read from
//! the clock, so a build over unchanged inputs is bit-identical.
//!
//! Order of operations:
//! 1. intra-source dedup (larger net assets wins),
//! 2. cross-source precedence (custody per fund, recency-gated),
//! 3. feeder/master substitution,
//! 4. final row-level dedup on (fund, date, asset).

use chrono::{Months, NaiveDate};
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::reconcile_model::{weight_pct, PositionRecord};
use crate::constants::{CUSTODY_PRECEDENCE_WINDOW_MONTHS, FUND_SHARE_PREFIX};
use crate::funds::FundRegistry;
use crate::ingest::{NormalizedFiling, SourceTag};
use crate::sectors::SectorClassifierTrait;

/// Per-source filing batches entering one consolidation run.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationInput {
    pub custody: Vec<NormalizedFiling>,
    pub regulator: Vec<NormalizedFiling>,
    pub on_demand: Vec<NormalizedFiling>,
}

/// Collapses duplicate (fund, date) filings within one source.
///
/// The filing with the larger `total_net_assets` survives. This is a
/// heuristic for "the more complete / finalized filing", not a correctness
/// guarantee: the sources carry no explicit completeness signal, so the
/// larger reported total is taken as the better one. Ties keep the first
/// filing encountered.
pub fn dedup_within_source(filings: Vec<NormalizedFiling>) -> Vec<NormalizedFiling> {
    let mut best: BTreeMap<(String, NaiveDate), NormalizedFiling> = BTreeMap::new();
    for filing in filings {
        let key = (filing.fund_id.clone(), filing.date);
        match best.get(&key) {
            Some(existing) if existing.total_net_assets >= filing.total_net_assets => {
                debug!(
                    "Dropping duplicate filing for {} at {} (net assets {} <= {})",
                    key.0, key.1, filing.total_net_assets, existing.total_net_assets
                );
            }
            _ => {
                best.insert(key, filing);
            }
        }
    }
    best.into_values().collect()
}

/// Merges custody and regulator filings with per-fund precedence.
///
/// Custody wins for a fund only while its latest filing is inside the
/// trailing precedence window of `today`; a stale custody feed forfeits the
/// fund entirely to the regulator source, including dates custody covered.
pub fn merge_sources(
    custody: Vec<NormalizedFiling>,
    regulator: Vec<NormalizedFiling>,
    today: NaiveDate,
) -> Vec<NormalizedFiling> {
    let cutoff = today
        .checked_sub_months(Months::new(CUSTODY_PRECEDENCE_WINDOW_MONTHS))
        .unwrap_or(today);

    let mut latest_custody: HashMap<String, NaiveDate> = HashMap::new();
    for filing in &custody {
        let entry = latest_custody
            .entry(filing.fund_id.clone())
            .or_insert(filing.date);
        if filing.date > *entry {
            *entry = filing.date;
        }
    }

    let fresh_funds: HashSet<String> = latest_custody
        .iter()
        .filter(|(_, latest)| **latest >= cutoff)
        .map(|(fund, _)| fund.clone())
        .collect();

    let mut covered: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut merged = Vec::new();
    for filing in custody {
        if !fresh_funds.contains(&filing.fund_id) {
            info!(
                "Custody feed stale for fund {} (latest {}); falling back to regulator data",
                filing.fund_id, latest_custody[&filing.fund_id]
            );
            continue;
        }
        covered.insert((filing.fund_id.clone(), filing.date));
        merged.push(filing);
    }

    for filing in regulator {
        let custody_wins = fresh_funds.contains(&filing.fund_id)
            && covered.contains(&(filing.fund_id.clone(), filing.date));
        if custody_wins {
            continue;
        }
        merged.push(filing);
    }

    merged.sort_by(|a, b| (&a.fund_id, a.date).cmp(&(&b.fund_id, b.date)));
    merged
}

/// Splits a full regulator batch into filings for registered funds and
/// on-demand filings for fund-of-fund references outside the registry.
///
/// References are collected from custody filings and the registered
/// regulator filings only; expansion is single-level by design, so a
/// fund-of-fund position inside an on-demand filing is not chased further.
pub fn partition_regulator_filings(
    filings: Vec<NormalizedFiling>,
    registry: &FundRegistry,
    custody: &[NormalizedFiling],
) -> (Vec<NormalizedFiling>, Vec<NormalizedFiling>) {
    let (primary, rest): (Vec<_>, Vec<_>) = filings
        .into_iter()
        .partition(|f| registry.contains(&f.fund_id));

    let mut referenced: BTreeSet<String> = BTreeSet::new();
    for filing in custody.iter().chain(primary.iter()) {
        for position in &filing.positions {
            if let Some(id) = position.asset_id.strip_prefix(FUND_SHARE_PREFIX) {
                referenced.insert(id.to_string());
            }
        }
    }

    let on_demand: Vec<NormalizedFiling> = rest
        .into_iter()
        .filter(|f| referenced.contains(&f.fund_id))
        .map(|mut f| {
            f.source = SourceTag::RegulatorOnDemand;
            f
        })
        .collect();

    (primary, on_demand)
}

/// A filing headed into the final dedup, with its provenance flag.
#[derive(Debug, Clone)]
struct CandidateFiling {
    filing: NormalizedFiling,
    master_derived: bool,
}

/// Duplicates every master fund's filing history under its feeders.
///
/// A feeder whose master has no data simply keeps whatever it had; that is
/// the documented degradation, not an error.
fn apply_feeder_substitution(
    merged: Vec<NormalizedFiling>,
    registry: &FundRegistry,
) -> Vec<CandidateFiling> {
    let mut by_fund: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, filing) in merged.iter().enumerate() {
        by_fund.entry(filing.fund_id.clone()).or_default().push(idx);
    }

    let mut substituted: Vec<CandidateFiling> = Vec::new();
    for (feeder_id, master_id) in registry.feeder_links() {
        let Some(indexes) = by_fund.get(&master_id) else {
            debug!(
                "Feeder {} references master {} with no data; feeder keeps no derived positions",
                feeder_id, master_id
            );
            continue;
        };
        for &idx in indexes {
            let mut copy = merged[idx].clone();
            copy.fund_id = feeder_id.clone();
            substituted.push(CandidateFiling {
                filing: copy,
                master_derived: true,
            });
        }
    }

    let mut candidates: Vec<CandidateFiling> = merged
        .into_iter()
        .map(|filing| CandidateFiling {
            filing,
            master_derived: false,
        })
        .collect();
    candidates.extend(substituted);
    candidates
}

/// Runs the full reconciliation pipeline and produces the consolidated
/// table, ordered by (fund, date, asset).
pub fn consolidate(
    input: ConsolidationInput,
    registry: &FundRegistry,
    classifier: &dyn SectorClassifierTrait,
    today: NaiveDate,
) -> Vec<PositionRecord> {
    let custody = dedup_within_source(input.custody);
    let regulator = dedup_within_source(input.regulator);
    let on_demand = dedup_within_source(input.on_demand);

    let mut regulator_all = regulator;
    regulator_all.extend(on_demand);

    let merged = merge_sources(custody, regulator_all, today);
    let candidates = apply_feeder_substitution(merged, registry);

    // Explode filings to rows and dedup on the (fund, date, asset) key.
    // The sort key makes the master-derived row sort last for equal keys,
    // and keep-last then resolves feeder-direct vs master-derived in the
    // master's favor.
    struct RowDraft {
        fund_id: String,
        date: NaiveDate,
        asset_id: String,
        value: Decimal,
        total_net_assets: Decimal,
        source_tag: SourceTag,
        master_derived: bool,
    }

    let mut drafts: Vec<RowDraft> = Vec::new();
    for candidate in candidates {
        let filing = candidate.filing;
        for position in filing.positions {
            drafts.push(RowDraft {
                fund_id: filing.fund_id.clone(),
                date: filing.date,
                asset_id: position.asset_id,
                value: position.value,
                total_net_assets: filing.total_net_assets,
                source_tag: filing.source,
                master_derived: candidate.master_derived,
            });
        }
    }

    drafts.sort_by(|a, b| {
        (&a.fund_id, a.date, a.master_derived, &a.asset_id)
            .cmp(&(&b.fund_id, b.date, b.master_derived, &b.asset_id))
    });

    let mut rows: BTreeMap<(String, NaiveDate, String), RowDraft> = BTreeMap::new();
    for draft in drafts {
        let key = (draft.fund_id.clone(), draft.date, draft.asset_id.clone());
        rows.insert(key, draft);
    }

    rows.into_values()
        .map(|draft| PositionRecord {
            weight_pct: weight_pct(draft.value, draft.total_net_assets),
            sector: classifier.classify(&draft.asset_id),
            fund_id: draft.fund_id,
            date: draft.date,
            asset_id: draft.asset_id,
            value: draft.value,
            total_net_assets: draft.total_net_assets,
            source_tag: draft.source_tag,
        })
        .collect()
}
