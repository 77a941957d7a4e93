//! Fund registry entries and fund-id normalization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::FUND_ID_DIGITS;

/// One fund registry entry.
///
/// A feeder fund carries the identifier of the master vehicle it invests
/// into; its reported positions are defined as the master's positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    /// Normalized 14-digit fund identifier.
    pub fund_id: String,
    /// Identifier of the master fund, when this fund is a feeder.
    pub master_fund_id: Option<String>,
    pub name: String,
    pub category: String,
    pub tier: String,
}

/// Normalizes a raw fund identifier to its canonical 14-digit form.
///
/// Punctuation and whitespace are stripped; shorter identifiers are
/// left-padded with zeros (registries drop leading zeros routinely).
/// Returns `None` when the input has no digits or more than 14 of them.
pub fn normalize_fund_id(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > FUND_ID_DIGITS {
        return None;
    }
    Some(format!("{:0>width$}", digits, width = FUND_ID_DIGITS))
}

/// In-memory view of the fund registry, indexed for reconciliation.
#[derive(Debug, Clone, Default)]
pub struct FundRegistry {
    by_id: HashMap<String, Fund>,
}

impl FundRegistry {
    pub fn new(funds: Vec<Fund>) -> Self {
        let by_id = funds.into_iter().map(|f| (f.fund_id.clone(), f)).collect();
        Self { by_id }
    }

    pub fn get(&self, fund_id: &str) -> Option<&Fund> {
        self.by_id.get(fund_id)
    }

    pub fn contains(&self, fund_id: &str) -> bool {
        self.by_id.contains_key(fund_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn funds(&self) -> impl Iterator<Item = &Fund> {
        self.by_id.values()
    }

    /// Returns (feeder_id, master_id) pairs, sorted by feeder id so the
    /// substitution pass visits feeders in a deterministic order.
    pub fn feeder_links(&self) -> Vec<(String, String)> {
        let mut links: Vec<(String, String)> = self
            .by_id
            .values()
            .filter_map(|f| {
                f.master_fund_id
                    .as_ref()
                    .map(|m| (f.fund_id.clone(), m.clone()))
            })
            .collect();
        links.sort();
        links
    }
}
