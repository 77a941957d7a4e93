//! Normalized filing model shared by all source parsers.

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ingest_errors::IngestError;

/// Which pipeline produced a filing or consolidated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// Direct custody feed (XML documents and vendor statements).
    #[serde(rename = "XML")]
    Xml,
    /// Regulator monthly bulk data.
    #[serde(rename = "REGULATOR")]
    Regulator,
    /// Regulator data fetched on demand for funds outside the registry.
    #[serde(rename = "REGULATOR_ON_DEMAND")]
    RegulatorOnDemand,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Xml => "XML",
            SourceTag::Regulator => "REGULATOR",
            SourceTag::RegulatorOnDemand => "REGULATOR_ON_DEMAND",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XML" => Ok(SourceTag::Xml),
            "REGULATOR" => Ok(SourceTag::Regulator),
            "REGULATOR_ON_DEMAND" => Ok(SourceTag::RegulatorOnDemand),
            other => Err(IngestError::Malformed(format!(
                "unknown source tag '{}'",
                other
            ))),
        }
    }
}

/// One asset position inside a filing, before weights are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingPosition {
    pub asset_id: String,
    pub value: Decimal,
}

/// One dated disclosure of a fund's complete holdings from one source.
///
/// Parsers never compute `weight_pct`; weights are derived after
/// reconciliation fixes `total_net_assets` for the (fund, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFiling {
    pub fund_id: String,
    pub date: NaiveDate,
    pub total_net_assets: Decimal,
    pub positions: Vec<FilingPosition>,
    pub source: SourceTag,
}

impl NormalizedFiling {
    pub fn new(
        fund_id: String,
        date: NaiveDate,
        total_net_assets: Decimal,
        source: SourceTag,
    ) -> Self {
        Self {
            fund_id,
            date,
            total_net_assets,
            positions: Vec::new(),
            source,
        }
    }

    /// Adds a position, dropping non-positive values per the parser
    /// contract (a zeroed or negative line is reported noise, not a holding).
    pub fn push_position(&mut self, asset_id: String, value: Decimal) {
        if value <= Decimal::ZERO {
            debug!(
                "Dropping non-positive position {} = {} for fund {} at {}",
                asset_id, value, self.fund_id, self.date
            );
            return;
        }
        self.positions.push(FilingPosition { asset_id, value });
    }
}

/// Parses a monetary amount in any of the encodings the sources use:
/// `1234567.89`, `1.234.567,89`, `1,234,567.89` or `1234567,89`.
pub fn parse_amount(raw: &str) -> Result<Decimal, IngestError> {
    let cleaned: String = raw.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(IngestError::Malformed("empty amount".to_string()));
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    let normalized = match (has_dot, has_comma) {
        // Both present: the right-most separator is the decimal point.
        (true, true) => {
            let last_dot = cleaned.rfind('.').unwrap_or(0);
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            if last_dot > last_comma {
                cleaned.replace(',', "")
            } else {
                cleaned.replace('.', "").replace(',', ".")
            }
        }
        // Comma only: decimal comma.
        (false, true) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized)
        .map_err(|e| IngestError::Malformed(format!("unparseable amount '{}': {}", raw, e)))
}
