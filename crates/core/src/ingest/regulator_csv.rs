//! Regulator bulk CSV parser.
//!
//! The regulator publishes one monthly archive per period with one
//! semicolon-delimited table per asset kind plus a net-assets table.
//! Encodings are inconsistent across years (UTF-8 with or without BOM,
//! Windows-1252 for the older files), so everything is decoded through
//! [`decode_table_bytes`] before parsing.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::warn;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use super::ingest_errors::IngestError;
use super::ingest_model::{parse_amount, NormalizedFiling, SourceTag};
use crate::constants::{
    CASH_ASSET_ID, DEPOSIT_PREFIX, DERIVATIVE_PREFIX, FUND_SHARE_PREFIX, PUBLIC_BOND_PREFIX,
};
use crate::funds::normalize_fund_id;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The per-kind tables inside one monthly regulator archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegulatorTableKind {
    NetAssets,
    Equities,
    FundShares,
    PublicBonds,
    Deposits,
    Derivatives,
    Cash,
}

impl RegulatorTableKind {
    /// All position tables (everything except the net-assets table).
    pub const POSITION_KINDS: [RegulatorTableKind; 6] = [
        RegulatorTableKind::Equities,
        RegulatorTableKind::FundShares,
        RegulatorTableKind::PublicBonds,
        RegulatorTableKind::Deposits,
        RegulatorTableKind::Derivatives,
        RegulatorTableKind::Cash,
    ];

    /// Fragment of the file name identifying this table inside an archive.
    pub fn file_fragment(&self) -> &'static str {
        match self {
            RegulatorTableKind::NetAssets => "net_assets",
            RegulatorTableKind::Equities => "equities",
            RegulatorTableKind::FundShares => "fund_shares",
            RegulatorTableKind::PublicBonds => "public_bonds",
            RegulatorTableKind::Deposits => "deposits",
            RegulatorTableKind::Derivatives => "derivatives",
            RegulatorTableKind::Cash => "cash",
        }
    }

    fn prefix_asset_id(&self, code: &str) -> Option<String> {
        let code = code.trim();
        if code.is_empty() && *self != RegulatorTableKind::Cash {
            return None;
        }
        match self {
            RegulatorTableKind::Equities => Some(code.to_uppercase()),
            RegulatorTableKind::FundShares => {
                normalize_fund_id(code).map(|id| format!("{}{}", FUND_SHARE_PREFIX, id))
            }
            RegulatorTableKind::PublicBonds => Some(format!("{}{}", PUBLIC_BOND_PREFIX, code)),
            RegulatorTableKind::Deposits => Some(format!("{}{}", DEPOSIT_PREFIX, code)),
            RegulatorTableKind::Derivatives => Some(format!("{}{}", DERIVATIVE_PREFIX, code)),
            RegulatorTableKind::Cash => Some(CASH_ASSET_ID.to_string()),
            RegulatorTableKind::NetAssets => None,
        }
    }
}

/// One position row from a regulator table, already kind-prefixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegulatorPositionRow {
    pub fund_id: String,
    pub date: NaiveDate,
    pub asset_id: String,
    pub value: Decimal,
}

/// One row of the net-assets table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetAssetsRow {
    pub fund_id: String,
    pub date: NaiveDate,
    pub total_net_assets: Decimal,
}

/// Decodes raw table bytes: BOM-stripped UTF-8 first, Windows-1252 as the
/// fallback for the legacy files.
pub fn decode_table_bytes(content: &[u8]) -> String {
    let content = content
        .strip_prefix(&[0xEF, 0xBB, 0xBF][..])
        .unwrap_or(content);
    match std::str::from_utf8(content) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(content);
            decoded.into_owned()
        }
    }
}

#[derive(Default)]
pub struct RegulatorCsvParser;

impl RegulatorCsvParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses one position table. Rows that cannot be normalized are
    /// skipped with a warning; a table without the expected header is a
    /// malformed document.
    pub fn parse_positions(
        &self,
        kind: RegulatorTableKind,
        content: &[u8],
    ) -> Result<Vec<RegulatorPositionRow>, IngestError> {
        let text = decode_table_bytes(content);
        let mut reader = table_reader(&text);

        let header = header_index(&mut reader)?;
        let fund_col = header.require("FUND_ID")?;
        let date_col = header.require("REF_DATE")?;
        let value_col = header.require("MARKET_VALUE")?;
        // The cash table has no asset code column.
        let code_col = header.get("ASSET_CODE");

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping unreadable {} row {}: {}", kind.file_fragment(), idx + 1, e);
                    continue;
                }
            };
            let parsed = parse_position_record(kind, &record, fund_col, date_col, value_col, code_col);
            match parsed {
                Some(row) => rows.push(row),
                None => warn!(
                    "Skipping malformed {} row {}",
                    kind.file_fragment(),
                    idx + 1
                ),
            }
        }
        Ok(rows)
    }

    /// Parses the net-assets table.
    pub fn parse_net_assets(&self, content: &[u8]) -> Result<Vec<NetAssetsRow>, IngestError> {
        let text = decode_table_bytes(content);
        let mut reader = table_reader(&text);

        let header = header_index(&mut reader)?;
        let fund_col = header.require("FUND_ID")?;
        let date_col = header.require("REF_DATE")?;
        let total_col = header.require("TOTAL_NET_ASSETS")?;

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping unreadable net-assets row {}: {}", idx + 1, e);
                    continue;
                }
            };
            let parsed = (|| {
                let fund_id = normalize_fund_id(record.get(fund_col)?)?;
                let date =
                    NaiveDate::parse_from_str(record.get(date_col)?.trim(), DATE_FORMAT).ok()?;
                let total_net_assets = parse_amount(record.get(total_col)?).ok()?;
                Some(NetAssetsRow {
                    fund_id,
                    date,
                    total_net_assets,
                })
            })();
            match parsed {
                Some(row) => rows.push(row),
                None => warn!("Skipping malformed net-assets row {}", idx + 1),
            }
        }
        Ok(rows)
    }

    /// Groups position rows into one filing per (fund, date), attaching the
    /// net-asset value when the net-assets table has one. Funds missing from
    /// the net-assets table get a zero total (weights degrade to zero, which
    /// is the documented edge-case policy, not an error).
    pub fn build_filings(
        &self,
        positions: Vec<RegulatorPositionRow>,
        net_assets: &[NetAssetsRow],
        source: SourceTag,
    ) -> Vec<NormalizedFiling> {
        let totals: HashMap<(String, NaiveDate), Decimal> = net_assets
            .iter()
            .map(|row| ((row.fund_id.clone(), row.date), row.total_net_assets))
            .collect();

        // BTreeMap keeps filings in (fund, date) order so repeated builds
        // over the same inputs emit identical output.
        let mut filings: BTreeMap<(String, NaiveDate), NormalizedFiling> = BTreeMap::new();
        for row in positions {
            let key = (row.fund_id.clone(), row.date);
            let filing = filings.entry(key.clone()).or_insert_with(|| {
                let total = totals.get(&key).copied().unwrap_or(Decimal::ZERO);
                NormalizedFiling::new(row.fund_id.clone(), row.date, total, source)
            });
            filing.push_position(row.asset_id, row.value);
        }
        filings.into_values().collect()
    }
}

fn table_reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    fn get(&self, name: &str) -> Option<usize> {
        self.columns.get(&name.to_uppercase()).copied()
    }

    fn require(&self, name: &str) -> Result<usize, IngestError> {
        self.get(name)
            .ok_or_else(|| IngestError::MissingField(name.to_string()))
    }
}

fn header_index(reader: &mut csv::Reader<&[u8]>) -> Result<HeaderIndex, IngestError> {
    let headers = reader
        .headers()
        .map_err(|e| IngestError::Malformed(format!("unreadable header: {}", e)))?;
    let columns = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_uppercase(), i))
        .collect();
    Ok(HeaderIndex { columns })
}

fn parse_position_record(
    kind: RegulatorTableKind,
    record: &csv::StringRecord,
    fund_col: usize,
    date_col: usize,
    value_col: usize,
    code_col: Option<usize>,
) -> Option<RegulatorPositionRow> {
    let fund_id = normalize_fund_id(record.get(fund_col)?)?;
    let date = NaiveDate::parse_from_str(record.get(date_col)?.trim(), DATE_FORMAT).ok()?;
    let value = parse_amount(record.get(value_col)?).ok()?;
    let code = code_col.and_then(|col| record.get(col)).unwrap_or_default();
    let asset_id = kind.prefix_asset_id(code)?;
    Some(RegulatorPositionRow {
        fund_id,
        date,
        asset_id,
        value,
    })
}
