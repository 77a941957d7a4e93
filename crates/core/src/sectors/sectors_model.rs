//! Sector assignment entries.

use serde::{Deserialize, Serialize};

/// One ticker-to-sector assignment in the lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorAssignment {
    pub ticker: String,
    pub sector: String,
}

/// Sector labels for the non-equity fallback categories.
pub const SECTOR_FUND_SHARES: &str = "Funds";
pub const SECTOR_PUBLIC_BONDS: &str = "Public Bonds";
pub const SECTOR_DEPOSITS: &str = "Deposits";
pub const SECTOR_DERIVATIVES: &str = "Derivatives";
pub const SECTOR_CASH: &str = "Cash";
