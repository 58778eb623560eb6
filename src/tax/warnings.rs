use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Data-quality diagnostics emitted during sale matching.
///
/// These are recoverable conditions, not errors: the calculation continues,
/// but the unmatched quantity is not represented in any realized gain, so
/// the totals are incomplete until the input is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// A sell referenced a symbol with no open lots at all.
    NoCostBasis {
        symbol: String,
        #[schemars(with = "f64")]
        quantity: Decimal,
    },
    /// Open lots ran out before the sold quantity was fully matched.
    InsufficientLots {
        symbol: String,
        #[schemars(with = "f64")]
        matched: Decimal,
        #[schemars(with = "f64")]
        unmatched: Decimal,
    },
}
