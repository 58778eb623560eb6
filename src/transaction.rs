use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unparseable date: '{0}'")]
    InvalidDate(String),
    #[error("unknown transaction type: '{0}' (expected 'buy' or 'sell')")]
    UnknownKind(String),
    #[error("invalid number for {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("quantity must be greater than zero, got {0}")]
    NonPositiveQuantity(Decimal),
    #[error("price must not be negative, got {0}")]
    NegativePrice(Decimal),
    #[error("fee must not be negative, got {0}")]
    NegativeFee(Decimal),
    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Unvalidated transaction record as it appears on the wire (CSV row or JSON
/// element). Field names match the generic CSV columns.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawTransaction {
    /// When the trade happened. RFC 3339, "YYYY-MM-DD HH:MM:SS",
    /// "YYYY-MM-DD" and "M/D/YYYY" are accepted.
    pub date: String,
    /// "buy" or "sell", case-insensitive
    #[serde(rename = "type")]
    pub kind: String,
    /// Units bought or sold
    #[schemars(with = "f64")]
    pub amount: Decimal,
    /// Price per unit in the account currency
    #[schemars(with = "f64")]
    pub price: Decimal,
    /// Asset symbol, e.g. BTC
    pub symbol: String,
    /// Exchange fee in the account currency, defaults to 0
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub fee: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Buy,
    Sell,
}

/// A validated ledger entry. Construction via [`Transaction::from_raw`] is the
/// only place input rules are enforced; everything downstream can assume a
/// positive quantity, non-negative money fields and an uppercased symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub timestamp: NaiveDateTime,
    pub kind: TxKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub symbol: String,
    pub fee: Decimal,
}

impl Transaction {
    pub fn from_raw(raw: &RawTransaction) -> Result<Self, ValidationError> {
        let timestamp = parse_datetime(&raw.date)?;
        let kind = match raw.kind.trim().to_ascii_lowercase().as_str() {
            "buy" => TxKind::Buy,
            "sell" => TxKind::Sell,
            other => return Err(ValidationError::UnknownKind(other.to_string())),
        };
        if raw.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(raw.amount));
        }
        if raw.price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice(raw.price));
        }
        let fee = raw.fee.unwrap_or(Decimal::ZERO);
        if fee < Decimal::ZERO {
            return Err(ValidationError::NegativeFee(fee));
        }
        let symbol = raw.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        Ok(Transaction {
            timestamp,
            kind,
            quantity: raw.amount,
            unit_price: raw.price,
            symbol,
            fee,
        })
    }

    pub fn gross_amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    /// Acquisition cost for a buy: the fee increases the cost basis.
    pub fn total_cost(&self) -> Decimal {
        self.gross_amount() + self.fee
    }

    /// Proceeds for a sell: the fee reduces what was actually received.
    pub fn net_proceeds(&self) -> Decimal {
        self.gross_amount() - self.fee
    }
}

/// Parse a datetime from the formats exchanges commonly export.
/// Offsets are normalized to UTC; date-only values are taken at midnight.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, ValidationError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(NaiveTime::MIN));
        }
    }
    Err(ValidationError::InvalidDate(s.to_string()))
}
