//! Sector classifier implementation.
//!
//! The equity lookup table itself is an external input (loaded from the
//! registry artifact or injected by tests); this module owns the fallback
//! patterns for non-equity asset-id encodings and the "Other" default.

use std::collections::HashMap;

use super::sectors_model::{
    SectorAssignment, SECTOR_CASH, SECTOR_DEPOSITS, SECTOR_DERIVATIVES, SECTOR_FUND_SHARES,
    SECTOR_PUBLIC_BONDS,
};
use crate::constants::{
    CASH_ASSET_ID, DEPOSIT_PREFIX, DERIVATIVE_PREFIX, FUND_SHARE_PREFIX, OTHER_LABEL,
    PUBLIC_BOND_PREFIX,
};

/// Maps a security identifier string to a sector label.
///
/// Every asset id maps to exactly one sector; unknown equity tickers map
/// to "Other".
pub trait SectorClassifierTrait: Send + Sync {
    fn classify(&self, asset_id: &str) -> String;
}

/// Table-backed classifier with pattern fallbacks for non-equity ids.
pub struct SectorClassifier {
    table: HashMap<String, String>,
}

impl SectorClassifier {
    pub fn new(assignments: Vec<SectorAssignment>) -> Self {
        let table = assignments
            .into_iter()
            .map(|a| (a.ticker.to_uppercase(), a.sector))
            .collect();
        Self { table }
    }

    /// A classifier with an empty lookup table; everything falls through
    /// to the pattern rules or "Other".
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl SectorClassifierTrait for SectorClassifier {
    fn classify(&self, asset_id: &str) -> String {
        let id = asset_id.trim();

        // Non-equity encodings carry a kind marker in the asset id; match
        // those before consulting the equity table.
        if id.starts_with(FUND_SHARE_PREFIX) {
            return SECTOR_FUND_SHARES.to_string();
        }
        if id.starts_with(PUBLIC_BOND_PREFIX) {
            return SECTOR_PUBLIC_BONDS.to_string();
        }
        if id.starts_with(DEPOSIT_PREFIX) {
            return SECTOR_DEPOSITS.to_string();
        }
        if id.starts_with(DERIVATIVE_PREFIX) {
            return SECTOR_DERIVATIVES.to_string();
        }
        if id.eq_ignore_ascii_case(CASH_ASSET_ID) {
            return SECTOR_CASH.to_string();
        }

        self.table
            .get(&id.to_uppercase())
            .cloned()
            .unwrap_or_else(|| OTHER_LABEL.to_string())
    }
}
