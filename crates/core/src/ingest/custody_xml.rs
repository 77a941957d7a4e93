//! Custody feed XML parser.
//!
//! The custody provider has shipped two document layouts over the years:
//! the original sectioned layout (`<custodyReport>`, one element per asset
//! kind) and the flat layout (`<report>`, typed `<position>` rows under a
//! single list). Both normalize to the same filing; asset kinds are
//! flattened into one position list with the kind encoded as an asset-id
//! prefix so sector classification can pattern-match the non-equity
//! categories.

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use super::ingest_errors::IngestError;
use super::ingest_model::{parse_amount, NormalizedFiling, SourceTag};
use crate::constants::{
    CASH_ASSET_ID, DEPOSIT_PREFIX, DERIVATIVE_PREFIX, FUND_SHARE_PREFIX, PUBLIC_BOND_PREFIX,
};
use crate::funds::normalize_fund_id;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Default)]
pub struct CustodyXmlParser;

impl CustodyXmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes one custody document, or `None` when it cannot be used.
    pub fn parse(&self, xml: &str) -> Option<NormalizedFiling> {
        match self.try_parse(xml) {
            Ok(filing) => Some(filing),
            Err(e) => {
                warn!("Skipping custody document: {}", e);
                None
            }
        }
    }

    pub fn try_parse(&self, xml: &str) -> Result<NormalizedFiling, IngestError> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    return match e.name().as_ref() {
                        b"custodyReport" => parse_sectioned(&mut reader),
                        b"report" => parse_flat(&mut reader),
                        other => Err(IngestError::UnsupportedLayout(
                            String::from_utf8_lossy(other).into_owned(),
                        )),
                    };
                }
                Ok(Event::Eof) => {
                    return Err(IngestError::Malformed("document has no root element".into()))
                }
                Ok(_) => continue,
                Err(e) => return Err(IngestError::Malformed(e.to_string())),
            }
        }
    }
}

/// Collected header fields plus raw per-section positions.
#[derive(Default)]
struct DocumentDraft {
    header: HashMap<String, String>,
    positions: Vec<(String, HashMap<String, String>)>,
}

impl DocumentDraft {
    fn into_filing(self, source: SourceTag) -> Result<NormalizedFiling, IngestError> {
        let fund_id = self
            .header
            .get("id")
            .or_else(|| self.header.get("fundId"))
            .and_then(|raw| normalize_fund_id(raw))
            .ok_or_else(|| IngestError::MissingField("fund id".to_string()))?;

        let date_raw = self
            .header
            .get("referenceDate")
            .ok_or_else(|| IngestError::MissingField("reference date".to_string()))?;
        let date = chrono::NaiveDate::parse_from_str(date_raw, DATE_FORMAT)
            .map_err(|e| IngestError::Malformed(format!("bad reference date: {}", e)))?;

        // A missing or unparseable net-asset value is not fatal: weights
        // degrade to zero downstream.
        let total_net_assets = match self.header.get("totalNetAssets") {
            Some(raw) => parse_amount(raw).unwrap_or_else(|e| {
                warn!("Unparseable net assets for fund {}: {}", fund_id, e);
                rust_decimal::Decimal::ZERO
            }),
            None => rust_decimal::Decimal::ZERO,
        };

        let mut filing = NormalizedFiling::new(fund_id, date, total_net_assets, source);
        for (section, fields) in self.positions {
            let Some((asset_id, value_raw)) = position_identity(&section, &fields) else {
                warn!(
                    "Skipping {} position without identity in filing {} {}",
                    section, filing.fund_id, filing.date
                );
                continue;
            };
            match parse_amount(&value_raw) {
                Ok(value) => filing.push_position(asset_id, value),
                Err(e) => warn!(
                    "Skipping {} position in filing {} {}: {}",
                    section, filing.fund_id, filing.date, e
                ),
            }
        }
        Ok(filing)
    }
}

/// Maps one raw position to its flattened asset id and raw value string.
fn position_identity(
    section: &str,
    fields: &HashMap<String, String>,
) -> Option<(String, String)> {
    let value = fields.get("value")?.clone();
    let asset_id = match section {
        "equities" => fields.get("ticker")?.trim().to_uppercase(),
        "fundShares" => {
            let id = normalize_fund_id(fields.get("fundId")?)?;
            format!("{}{}", FUND_SHARE_PREFIX, id)
        }
        "publicBonds" => format!("{}{}", PUBLIC_BOND_PREFIX, fields.get("code")?.trim()),
        "deposits" => format!("{}{}", DEPOSIT_PREFIX, fields.get("issuer")?.trim()),
        "derivatives" => format!("{}{}", DERIVATIVE_PREFIX, fields.get("contract")?.trim()),
        "cash" => CASH_ASSET_ID.to_string(),
        _ => return None,
    };
    Some((asset_id, value))
}

/// Old layout: `<custodyReport>` with one element per asset kind.
fn parse_sectioned(reader: &mut Reader<&[u8]>) -> Result<NormalizedFiling, IngestError> {
    let mut draft = DocumentDraft::default();
    let mut stack: Vec<String> = Vec::new();
    let mut current_fields: HashMap<String, String> = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                if name == "position" {
                    current_fields.clear();
                }
                stack.push(name);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| IngestError::Malformed(e.to_string()))?
                    .trim()
                    .to_string();
                if text.is_empty() {
                    continue;
                }
                match stack.as_slice() {
                    // <fund><id>..</id>..</fund> header leaves
                    [section, leaf] if section == "fund" => {
                        let key = if leaf == "netAssets" {
                            "totalNetAssets".to_string()
                        } else {
                            leaf.clone()
                        };
                        draft.header.insert(key, text);
                    }
                    // <cash><value>..</value></cash> is a single position
                    [section, leaf] if section == "cash" && leaf == "value" => {
                        let mut fields = HashMap::new();
                        fields.insert("value".to_string(), text);
                        draft.positions.push(("cash".to_string(), fields));
                    }
                    [_, marker, leaf] if marker == "position" => {
                        current_fields.insert(leaf.clone(), text);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "custodyReport" {
                    return draft.into_filing(SourceTag::Xml);
                }
                stack.pop();
                if name == "position" {
                    if let Some(section) = stack.last() {
                        draft
                            .positions
                            .push((section.clone(), std::mem::take(&mut current_fields)));
                    }
                }
            }
            Ok(Event::Eof) => {
                return Err(IngestError::Malformed("unterminated custody report".into()))
            }
            Ok(_) => continue,
            Err(e) => return Err(IngestError::Malformed(e.to_string())),
        }
    }
}

/// New layout: `<report>` with an attribute header and typed positions.
fn parse_flat(reader: &mut Reader<&[u8]>) -> Result<NormalizedFiling, IngestError> {
    let mut draft = DocumentDraft::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"header" => {
                    for key in ["fundId", "referenceDate", "totalNetAssets"] {
                        if let Some(value) = attribute(&e, key)? {
                            draft.header.insert(key.to_string(), value);
                        }
                    }
                }
                b"position" => {
                    let kind = attribute(&e, "kind")?.unwrap_or_default();
                    let Some(section) = flat_kind_section(&kind) else {
                        warn!("Skipping position with unknown kind {:?}", kind);
                        continue;
                    };
                    let mut fields = HashMap::new();
                    if let Some(value) = attribute(&e, "value")? {
                        fields.insert("value".to_string(), value);
                    }
                    if let Some(code) = attribute(&e, "code")? {
                        let key = match section {
                            "equities" => "ticker",
                            "fundShares" => "fundId",
                            "deposits" => "issuer",
                            "derivatives" => "contract",
                            _ => "code",
                        };
                        fields.insert(key.to_string(), code);
                    }
                    draft.positions.push((section.to_string(), fields));
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"report" => {
                return draft.into_filing(SourceTag::Xml);
            }
            Ok(Event::Eof) => return Err(IngestError::Malformed("unterminated report".into())),
            Ok(_) => continue,
            Err(e) => return Err(IngestError::Malformed(e.to_string())),
        }
    }
}

/// Maps the flat layout's `kind` attribute to the sectioned layout's
/// section names so both funnel through the same identity mapping.
fn flat_kind_section(kind: &str) -> Option<&'static str> {
    match kind {
        "EQUITY" => Some("equities"),
        "FUND" => Some("fundShares"),
        "GOVT_BOND" | "PUBLIC_BOND" => Some("publicBonds"),
        "DEPOSIT" => Some("deposits"),
        "DERIVATIVE" => Some("derivatives"),
        "CASH" => Some("cash"),
        _ => None,
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, IngestError> {
    let attr = e
        .try_get_attribute(key)
        .map_err(|err| IngestError::Malformed(err.to_string()))?;
    match attr {
        Some(a) => {
            let value = a
                .unescape_value()
                .map_err(|err| IngestError::Malformed(err.to_string()))?;
            Ok(Some(value.trim().to_string()))
        }
        None => Ok(None),
    }
}
