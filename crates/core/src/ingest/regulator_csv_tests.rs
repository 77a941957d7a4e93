use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::ingest::regulator_csv::{
    decode_table_bytes, RegulatorCsvParser, RegulatorTableKind,
};
use crate::ingest::SourceTag;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn parses_equities_table() {
    let table = b"FUND_ID;REF_DATE;ASSET_CODE;MARKET_VALUE\n\
        12.345.678/0001-90;2024-01-31;ABCD4;500000.00\n\
        12.345.678/0001-90;2024-01-31;EFGH3;250000,50\n";

    let rows = RegulatorCsvParser::new()
        .parse_positions(RegulatorTableKind::Equities, table)
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].fund_id, "12345678000190");
    assert_eq!(rows[0].date, date(2024, 1, 31));
    assert_eq!(rows[0].asset_id, "ABCD4");
    assert_eq!(rows[0].value, dec!(500000.00));
    assert_eq!(rows[1].value, dec!(250000.50));
}

#[test]
fn fund_share_codes_are_normalized_and_prefixed() {
    let table = b"FUND_ID;REF_DATE;ASSET_CODE;MARKET_VALUE\n\
        11111111000111;2024-01-31;98.765.432/0001-88;1000.00\n";

    let rows = RegulatorCsvParser::new()
        .parse_positions(RegulatorTableKind::FundShares, table)
        .unwrap();

    assert_eq!(rows[0].asset_id, "FUND:98765432000188");
}

#[test]
fn cash_table_needs_no_asset_code_column() {
    let table = b"FUND_ID;REF_DATE;MARKET_VALUE\n\
        11111111000111;2024-01-31;2500.00\n";

    let rows = RegulatorCsvParser::new()
        .parse_positions(RegulatorTableKind::Cash, table)
        .unwrap();

    assert_eq!(rows[0].asset_id, "CASH");
    assert_eq!(rows[0].value, dec!(2500.00));
}

#[test]
fn malformed_rows_are_skipped_not_fatal() {
    let table = b"FUND_ID;REF_DATE;ASSET_CODE;MARKET_VALUE\n\
        not-a-fund;2024-01-31;ABCD4;10\n\
        11111111000111;bad-date;ABCD4;10\n\
        11111111000111;2024-01-31;ABCD4;not-a-number\n\
        11111111000111;2024-01-31;ABCD4;10\n";

    let rows = RegulatorCsvParser::new()
        .parse_positions(RegulatorTableKind::Equities, table)
        .unwrap();

    assert_eq!(rows.len(), 1);
}

#[test]
fn missing_header_column_is_malformed() {
    let table = b"FUND_ID;ASSET_CODE;MARKET_VALUE\n11111111000111;ABCD4;10\n";
    let result =
        RegulatorCsvParser::new().parse_positions(RegulatorTableKind::Equities, table);
    assert!(result.is_err());
}

#[test]
fn decodes_windows_1252_bytes() {
    // "AÇÚCAR3" with 0xC7 / 0xDA single-byte encodings.
    let bytes = b"A\xC7\xDACAR3";
    assert_eq!(decode_table_bytes(bytes), "AÇÚCAR3");

    // BOM-prefixed UTF-8 passes through unchanged.
    let bom = b"\xEF\xBB\xBFABCD4";
    assert_eq!(decode_table_bytes(bom), "ABCD4");
}

#[test]
fn groups_rows_into_filings_with_net_assets() {
    let parser = RegulatorCsvParser::new();
    let positions = parser
        .parse_positions(
            RegulatorTableKind::Equities,
            b"FUND_ID;REF_DATE;ASSET_CODE;MARKET_VALUE\n\
              11111111000111;2024-01-31;ABCD4;600000\n\
              11111111000111;2024-01-31;EFGH3;400000\n\
              22222222000122;2024-01-31;ABCD4;100000\n",
        )
        .unwrap();
    let net_assets = parser
        .parse_net_assets(
            b"FUND_ID;REF_DATE;TOTAL_NET_ASSETS\n\
              11111111000111;2024-01-31;1000000\n",
        )
        .unwrap();

    let filings = parser.build_filings(positions, &net_assets, SourceTag::Regulator);

    assert_eq!(filings.len(), 2);
    assert_eq!(filings[0].fund_id, "11111111000111");
    assert_eq!(filings[0].total_net_assets, dec!(1000000));
    assert_eq!(filings[0].positions.len(), 2);
    // No net-assets row: total defaults to zero, not an error.
    assert_eq!(filings[1].fund_id, "22222222000122");
    assert_eq!(filings[1].total_net_assets, rust_decimal::Decimal::ZERO);
    assert_eq!(filings[1].source, SourceTag::Regulator);
}
