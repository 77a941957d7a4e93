//! Vendor statement parser.
//!
//! Consumes the text already extracted from a PDF statement (the binary
//! extraction itself is an external collaborator) and normalizes it into a
//! filing. Statements arrive over the same direct custody channel as the
//! XML feed, so they carry the same source tag.

use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use rust_decimal::Decimal;

use super::ingest_errors::IngestError;
use super::ingest_model::{parse_amount, NormalizedFiling, SourceTag};
use crate::funds::normalize_fund_id;

pub struct StatementTextParser {
    fund_re: Regex,
    date_re: Regex,
    total_re: Regex,
    holding_re: Regex,
}

impl Default for StatementTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementTextParser {
    pub fn new() -> Self {
        Self {
            fund_re: Regex::new(r"(?im)^\s*fund(?:\s+id)?\s*:\s*([0-9./ -]+?)\s*$")
                .expect("fund pattern"),
            date_re: Regex::new(r"(?im)^\s*(?:statement\s+)?date\s*:\s*(\d{4}-\d{2}-\d{2})\s*$")
                .expect("date pattern"),
            total_re: Regex::new(r"(?im)^\s*total\s+net\s+assets\s*:\s*(-?[\d.,]+)\s*$")
                .expect("total pattern"),
            holding_re: Regex::new(r"(?m)^\s*([A-Z][A-Z0-9:._-]*)\s+(-?[\d][\d.,]*)\s*$")
                .expect("holding pattern"),
        }
    }

    /// Normalizes one extracted statement, or `None` when it cannot be used.
    pub fn parse(&self, text: &str) -> Option<NormalizedFiling> {
        match self.try_parse(text) {
            Ok(filing) => Some(filing),
            Err(e) => {
                warn!("Skipping vendor statement: {}", e);
                None
            }
        }
    }

    pub fn try_parse(&self, text: &str) -> Result<NormalizedFiling, IngestError> {
        let fund_id = self
            .fund_re
            .captures(text)
            .and_then(|c| normalize_fund_id(&c[1]))
            .ok_or_else(|| IngestError::MissingField("fund id".to_string()))?;

        let date_raw = self
            .date_re
            .captures(text)
            .map(|c| c[1].to_string())
            .ok_or_else(|| IngestError::MissingField("statement date".to_string()))?;
        let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d")
            .map_err(|e| IngestError::Malformed(format!("bad statement date: {}", e)))?;

        let total_net_assets = match self.total_re.captures(text) {
            Some(c) => parse_amount(&c[1]).unwrap_or_else(|e| {
                warn!("Unparseable net assets in statement for {}: {}", fund_id, e);
                Decimal::ZERO
            }),
            None => Decimal::ZERO,
        };

        let mut filing = NormalizedFiling::new(fund_id, date, total_net_assets, SourceTag::Xml);
        for captures in self.holding_re.captures_iter(text) {
            let asset_id = captures[1].to_string();
            match parse_amount(&captures[2]) {
                Ok(value) => filing.push_position(asset_id, value),
                Err(e) => warn!(
                    "Skipping statement line for {} in {} {}: {}",
                    &captures[1], filing.fund_id, filing.date, e
                ),
            }
        }
        Ok(filing)
    }
}
