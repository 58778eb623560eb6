use super::calculator::CostBasisMethod;
use super::warnings::Warning;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Holding-period classification, split at 365 whole days held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Term {
    ShortTerm,
    LongTerm,
}

impl Term {
    pub fn from_days_held(days_held: i64) -> Self {
        if days_held >= 365 {
            Term::LongTerm
        } else {
            Term::ShortTerm
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Term::ShortTerm => "short-term",
            Term::LongTerm => "long-term",
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One disposal slice: the part of a sell matched against a single lot.
/// A sell that spans N lots produces N of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RealizedGain {
    pub symbol: String,
    #[schemars(with = "String")]
    pub date_acquired: NaiveDateTime,
    #[schemars(with = "String")]
    pub date_sold: NaiveDateTime,
    #[schemars(with = "f64")]
    pub quantity: Decimal,
    #[schemars(with = "f64")]
    pub cost_basis: Decimal,
    #[schemars(with = "f64")]
    pub proceeds: Decimal,
    #[schemars(with = "f64")]
    pub gain_loss: Decimal,
    pub term: Term,
    pub days_held: i64,
}

/// Aggregate view over all realized gains, recomputed on demand.
///
/// Totals are rounded to 2 decimal places for presentation; the per-record
/// values in `realized_gains` stay at full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub method: CostBasisMethod,
    pub total_transactions: usize,
    pub total_sales: usize,
    pub short_term_gain_loss: Decimal,
    pub long_term_gain_loss: Decimal,
    pub total_gain_loss: Decimal,
    pub realized_gains: Vec<RealizedGain>,
    pub warnings: Vec<Warning>,
}

impl Summary {
    pub fn build(
        method: CostBasisMethod,
        total_transactions: usize,
        realized_gains: &[RealizedGain],
        warnings: &[Warning],
    ) -> Self {
        let term_total = |term: Term| -> Decimal {
            realized_gains
                .iter()
                .filter(|g| g.term == term)
                .map(|g| g.gain_loss)
                .sum()
        };
        let short = term_total(Term::ShortTerm);
        let long = term_total(Term::LongTerm);

        Summary {
            method,
            total_transactions,
            total_sales: realized_gains.len(),
            short_term_gain_loss: short.round_dp(2),
            long_term_gain_loss: long.round_dp(2),
            total_gain_loss: (short + long).round_dp(2),
            realized_gains: realized_gains.to_vec(),
            warnings: warnings.to_vec(),
        }
    }
}
