use crate::transaction::Transaction;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

/// An open, possibly partially consumed acquisition.
///
/// `remaining_cost_basis` tracks whatever basis is still attributable to the
/// unsold units, so proportional splits on later sales never double-count
/// basis that earlier sales already consumed. `unit_cost` is informational
/// only and fixed at acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub acquired_at: NaiveDateTime,
    pub remaining_quantity: Decimal,
    pub remaining_cost_basis: Decimal,
    #[allow(dead_code)]
    pub unit_cost: Decimal,
}

impl Lot {
    pub fn open(buy: &Transaction) -> Self {
        let total_cost = buy.total_cost();
        Lot {
            acquired_at: buy.timestamp,
            remaining_quantity: buy.quantity,
            remaining_cost_basis: total_cost,
            unit_cost: total_cost / buy.quantity,
        }
    }
}

/// Per-symbol inventories of open lots, ordered by insertion.
///
/// Buys append at the tail; only sale matching consumes or removes lots,
/// from the head (FIFO) or the tail (LIFO).
#[derive(Debug, Default)]
pub struct LotBook {
    lots: HashMap<String, VecDeque<Lot>>,
}

impl LotBook {
    pub fn open_lot(&mut self, buy: &Transaction) {
        let lot = Lot::open(buy);
        log::debug!(
            "lot {} OPEN: qty={}, cost={}",
            buy.symbol,
            lot.remaining_quantity,
            lot.remaining_cost_basis
        );
        self.lots.entry(buy.symbol.clone()).or_default().push_back(lot);
    }

    pub fn lots_mut(&mut self, symbol: &str) -> Option<&mut VecDeque<Lot>> {
        self.lots.get_mut(symbol)
    }

    pub fn open_lots(&self, symbol: &str) -> impl Iterator<Item = &Lot> {
        self.lots.get(symbol).into_iter().flatten()
    }

    /// Total unsold quantity across the symbol's open lots.
    pub fn open_quantity(&self, symbol: &str) -> Decimal {
        self.open_lots(symbol).map(|l| l.remaining_quantity).sum()
    }
}
