//! Transaction ingestion from CSV files and JSON calculation requests.
//!
//! Row-level problems never abort an import: bad rows are collected with
//! their line numbers so the caller can report them, and the remaining rows
//! still process.

use crate::tax::CostBasisMethod;
use crate::transaction::{RawTransaction, ValidationError};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("missing required columns: {0}")]
    MissingColumns(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Supported CSV column layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvFormat {
    /// date,type,amount,price,symbol,fee
    #[default]
    Generic,
    /// Coinbase transaction export
    Coinbase,
}

struct ColumnNames {
    date: &'static str,
    kind: &'static str,
    amount: &'static str,
    price: &'static str,
    symbol: &'static str,
    fee: &'static str,
}

impl CsvFormat {
    fn columns(self) -> ColumnNames {
        match self {
            CsvFormat::Generic => ColumnNames {
                date: "date",
                kind: "type",
                amount: "amount",
                price: "price",
                symbol: "symbol",
                fee: "fee",
            },
            CsvFormat::Coinbase => ColumnNames {
                date: "Timestamp",
                kind: "Transaction Type",
                amount: "Quantity Transacted",
                price: "Spot Price at Transaction",
                symbol: "Asset",
                fee: "Fees and/or Spread",
            },
        }
    }
}

/// A raw record paired with the input line it came from.
#[derive(Debug)]
pub struct RawRow {
    pub line: usize,
    pub raw: RawTransaction,
}

/// A row that failed to parse, with enough context to locate it.
#[derive(Debug)]
pub struct RowError {
    pub line: usize,
    pub error: ValidationError,
}

#[derive(Debug, Default)]
pub struct CsvImport {
    pub rows: Vec<RawRow>,
    pub errors: Vec<RowError>,
}

/// Read raw transaction rows from CSV.
///
/// Fails outright only when required columns are missing or the CSV itself
/// is malformed; cell-level parse failures land in [`CsvImport::errors`].
pub fn read_csv<R: Read>(reader: R, format: CsvFormat) -> Result<CsvImport, ImportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let cols = format.columns();

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let required = [cols.date, cols.kind, cols.amount, cols.price, cols.symbol];
    let missing: Vec<&str> = required
        .into_iter()
        .filter(|&name| position(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing.join(", ")));
    }

    let date_at = position(cols.date).unwrap_or_default();
    let kind_at = position(cols.kind).unwrap_or_default();
    let amount_at = position(cols.amount).unwrap_or_default();
    let price_at = position(cols.price).unwrap_or_default();
    let symbol_at = position(cols.symbol).unwrap_or_default();
    let fee_at = position(cols.fee);

    let mut import = CsvImport::default();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2; // 1-based, after the header row
        let record = result?;
        let cell = |at: usize| record.get(at).unwrap_or("").trim().to_string();

        let parsed = parse_decimal(&cell(amount_at), "amount").and_then(|amount| {
            let price = parse_decimal(&cell(price_at), "price")?;
            let fee = match fee_at.map(cell) {
                Some(s) if !s.is_empty() => Some(parse_decimal(&s, "fee")?),
                _ => None,
            };
            Ok(RawTransaction {
                date: cell(date_at),
                kind: cell(kind_at),
                amount,
                price,
                symbol: cell(symbol_at),
                fee,
            })
        });

        match parsed {
            Ok(raw) => import.rows.push(RawRow { line, raw }),
            Err(error) => import.errors.push(RowError { line, error }),
        }
    }
    Ok(import)
}

fn parse_decimal(s: &str, field: &'static str) -> Result<Decimal, ValidationError> {
    s.parse().map_err(|_| ValidationError::InvalidNumber {
        field,
        value: s.to_string(),
    })
}

/// JSON input document: optional method plus the transaction list.
/// This is the shape of a calculation request body.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CalculationInput {
    #[serde(default)]
    pub method: Option<CostBasisMethod>,
    pub transactions: Vec<RawTransaction>,
}

pub fn read_json<R: Read>(reader: R) -> anyhow::Result<CalculationInput> {
    let input: CalculationInput = serde_json::from_reader(reader)?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reads_generic_csv() {
        let data = "\
date,type,amount,price,symbol,fee
2023-01-15,buy,1.0,20000.00,BTC,10.00
2023-06-20,sell,0.4,25000.00,BTC,
";
        let import = read_csv(data.as_bytes(), CsvFormat::Generic).unwrap();
        assert!(import.errors.is_empty());
        assert_eq!(import.rows.len(), 2);
        assert_eq!(import.rows[0].raw.amount, dec!(1.0));
        assert_eq!(import.rows[0].raw.fee, Some(dec!(10.00)));
        assert_eq!(import.rows[1].raw.fee, None);
    }

    #[test]
    fn reads_coinbase_columns() {
        let data = "\
Timestamp,Transaction Type,Quantity Transacted,Spot Price at Transaction,Asset,Fees and/or Spread
2023-01-15T10:00:00Z,Buy,0.5,21000.00,BTC,1.50
";
        let import = read_csv(data.as_bytes(), CsvFormat::Coinbase).unwrap();
        assert!(import.errors.is_empty());
        assert_eq!(import.rows.len(), 1);
        let raw = &import.rows[0].raw;
        assert_eq!(raw.kind, "Buy");
        assert_eq!(raw.amount, dec!(0.5));
        assert_eq!(raw.symbol, "BTC");
        assert_eq!(raw.fee, Some(dec!(1.50)));
    }

    #[test]
    fn missing_columns_fail_fast() {
        let data = "date,type,amount\n2023-01-15,buy,1.0\n";
        let err = read_csv(data.as_bytes(), CsvFormat::Generic).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumns(cols) if cols == "price, symbol"));
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let data = "\
date,type,amount,price,symbol,fee
2023-01-15,buy,1.0,20000.00,BTC,10.00
2023-01-16,buy,one,20000.00,BTC,
2023-01-17,buy,1.0,20000.00,BTC,
";
        let import = read_csv(data.as_bytes(), CsvFormat::Generic).unwrap();
        assert_eq!(import.rows.len(), 2);
        assert_eq!(import.errors.len(), 1);
        assert_eq!(import.errors[0].line, 3);
        assert_eq!(
            import.errors[0].error,
            ValidationError::InvalidNumber {
                field: "amount",
                value: "one".to_string(),
            }
        );
    }

    #[test]
    fn reads_json_request_body() {
        let data = r#"{
            "method": "LIFO",
            "transactions": [
                {"date": "2023-01-15", "type": "buy", "amount": 1.0, "price": 20000, "symbol": "BTC", "fee": 10}
            ]
        }"#;
        let input = read_json(data.as_bytes()).unwrap();
        assert_eq!(input.method, Some(CostBasisMethod::Lifo));
        assert_eq!(input.transactions.len(), 1);
        assert_eq!(input.transactions[0].symbol, "BTC");
    }

    #[test]
    fn json_method_is_optional() {
        let data = r#"{"transactions": []}"#;
        let input = read_json(data.as_bytes()).unwrap();
        assert_eq!(input.method, None);
    }
}
