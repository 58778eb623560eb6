use super::lots::{Lot, LotBook};
use super::summary::{RealizedGain, Summary, Term};
use super::warnings::Warning;
use crate::transaction::{RawTransaction, Transaction, TxKind, ValidationError};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Order in which open lots are consumed on disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CostBasisMethod {
    /// First-in-first-out: oldest lot first
    #[default]
    Fifo,
    /// Last-in-first-out: newest lot first
    Lifo,
}

impl CostBasisMethod {
    pub fn display(&self) -> &'static str {
        match self {
            CostBasisMethod::Fifo => "FIFO",
            CostBasisMethod::Lifo => "LIFO",
        }
    }
}

impl std::fmt::Display for CostBasisMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Cost-basis and capital-gains calculation engine.
///
/// One instance owns the full state of a single calculation run: the open
/// lot inventories, the realized gains produced so far and any data-quality
/// warnings. Construct a fresh instance per run; there is no shared state
/// between instances.
///
/// Transactions are processed strictly in the order they are added. Feeding
/// a sell before its chronologically earlier buy leaves the lots missing and
/// the sell degrades to a [`Warning`], so callers are responsible for
/// supplying chronological order.
#[derive(Debug, Default)]
pub struct Calculator {
    method: CostBasisMethod,
    transaction_count: usize,
    lots: LotBook,
    realized_gains: Vec<RealizedGain>,
    warnings: Vec<Warning>,
}

impl Calculator {
    pub fn new(method: CostBasisMethod) -> Self {
        Calculator {
            method,
            ..Default::default()
        }
    }

    /// Validate one raw record and apply it to the ledger.
    ///
    /// On a validation failure nothing is applied and the engine state is
    /// unchanged, so a batch caller can skip the bad record and continue.
    pub fn add_transaction(&mut self, raw: &RawTransaction) -> Result<(), ValidationError> {
        let tx = Transaction::from_raw(raw)?;
        self.apply(&tx);
        Ok(())
    }

    /// Apply an already validated transaction.
    pub fn apply(&mut self, tx: &Transaction) {
        self.transaction_count += 1;
        match tx.kind {
            TxKind::Buy => self.lots.open_lot(tx),
            TxKind::Sell => self.process_sale(tx),
        }
    }

    /// Deplete the symbol's open lots until the sold quantity is satisfied
    /// or the lots run out. Each consumed slice becomes one realized gain.
    fn process_sale(&mut self, sell: &Transaction) {
        if self.lots.open_quantity(&sell.symbol).is_zero() {
            log::warn!(
                "no cost basis found for {}: sell of {} has no matching lots",
                sell.symbol,
                sell.quantity
            );
            self.warnings.push(Warning::NoCostBasis {
                symbol: sell.symbol.clone(),
                quantity: sell.quantity,
            });
            return;
        }

        let net_proceeds = sell.net_proceeds();
        let mut remaining_to_sell = sell.quantity;

        while remaining_to_sell > Decimal::ZERO {
            let method = self.method;
            let Some(lots) = self.lots.lots_mut(&sell.symbol) else {
                break;
            };
            let Some(lot) = select_lot(lots, method) else {
                break;
            };

            let consumed = remaining_to_sell.min(lot.remaining_quantity);
            // Split whatever basis remains on the lot, not the original
            // basis, so compounding partial sales stay exact.
            let cost_slice = consumed / lot.remaining_quantity * lot.remaining_cost_basis;
            // Net proceeds are spread across every lot this sell touches,
            // which amortizes the sell fee in proportion to quantity.
            let proceeds_slice = consumed / sell.quantity * net_proceeds;
            let days_held = (sell.timestamp - lot.acquired_at).num_days();

            let record = RealizedGain {
                symbol: sell.symbol.clone(),
                date_acquired: lot.acquired_at,
                date_sold: sell.timestamp,
                quantity: consumed,
                cost_basis: cost_slice,
                proceeds: proceeds_slice,
                gain_loss: proceeds_slice - cost_slice,
                term: Term::from_days_held(days_held),
                days_held,
            };

            lot.remaining_quantity -= consumed;
            if lot.remaining_quantity <= Decimal::ZERO {
                remove_lot(lots, method);
            } else {
                lot.remaining_cost_basis -= cost_slice;
            }

            log::debug!(
                "sale {} MATCH: qty={}, cost={}, proceeds={}, days_held={}",
                sell.symbol,
                consumed,
                cost_slice,
                proceeds_slice,
                days_held
            );

            self.realized_gains.push(record);
            remaining_to_sell -= consumed;
        }

        if remaining_to_sell > Decimal::ZERO {
            log::warn!(
                "lots exhausted for {}: {} of {} sold unmatched",
                sell.symbol,
                remaining_to_sell,
                sell.quantity
            );
            self.warnings.push(Warning::InsufficientLots {
                symbol: sell.symbol.clone(),
                matched: sell.quantity - remaining_to_sell,
                unmatched: remaining_to_sell,
            });
        }
    }

    /// Fold the accumulated realized gains into a presentation summary.
    /// Pure with respect to engine state; callable any number of times.
    pub fn summary(&self) -> Summary {
        Summary::build(
            self.method,
            self.transaction_count,
            &self.realized_gains,
            &self.warnings,
        )
    }

    #[allow(dead_code)]
    pub fn realized_gains(&self) -> &[RealizedGain] {
        &self.realized_gains
    }

    #[allow(dead_code)]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[allow(dead_code)]
    pub fn open_lots(&self, symbol: &str) -> impl Iterator<Item = &Lot> {
        self.lots.open_lots(symbol)
    }

    #[allow(dead_code)]
    pub fn open_quantity(&self, symbol: &str) -> Decimal {
        self.lots.open_quantity(symbol)
    }
}

fn select_lot(
    lots: &mut std::collections::VecDeque<Lot>,
    method: CostBasisMethod,
) -> Option<&mut Lot> {
    match method {
        CostBasisMethod::Fifo => lots.front_mut(),
        CostBasisMethod::Lifo => lots.back_mut(),
    }
}

fn remove_lot(lots: &mut std::collections::VecDeque<Lot>, method: CostBasisMethod) {
    match method {
        CostBasisMethod::Fifo => lots.pop_front(),
        CostBasisMethod::Lifo => lots.pop_back(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use rust_decimal_macros::dec;

    fn ts(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    fn buy(date: &str, symbol: &str, qty: Decimal, price: Decimal, fee: Decimal) -> Transaction {
        Transaction {
            timestamp: ts(date),
            kind: TxKind::Buy,
            quantity: qty,
            unit_price: price,
            symbol: symbol.to_string(),
            fee,
        }
    }

    fn sell(date: &str, symbol: &str, qty: Decimal, price: Decimal, fee: Decimal) -> Transaction {
        Transaction {
            timestamp: ts(date),
            kind: TxKind::Sell,
            quantity: qty,
            unit_price: price,
            symbol: symbol.to_string(),
            fee,
        }
    }

    #[test]
    fn fifo_consumes_oldest_lot_first() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(1), dec!(100), dec!(0)));
        calc.apply(&buy("2023-02-01", "BTC", dec!(1), dec!(200), dec!(0)));
        calc.apply(&sell("2023-03-01", "BTC", dec!(1), dec!(300), dec!(0)));

        let gains = calc.realized_gains();
        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].date_acquired, ts("2023-01-01"));
        assert_eq!(gains[0].cost_basis, dec!(100));
    }

    #[test]
    fn lifo_consumes_newest_lot_first() {
        let mut calc = Calculator::new(CostBasisMethod::Lifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(1), dec!(100), dec!(0)));
        calc.apply(&buy("2023-02-01", "BTC", dec!(1), dec!(200), dec!(0)));
        calc.apply(&sell("2023-03-01", "BTC", dec!(1), dec!(300), dec!(0)));

        let gains = calc.realized_gains();
        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].date_acquired, ts("2023-02-01"));
        assert_eq!(gains[0].cost_basis, dec!(200));
    }

    #[test]
    fn partial_sale_splits_lot_basis() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-15", "BTC", dec!(1.0), dec!(20000), dec!(10)));
        calc.apply(&sell("2023-05-01", "BTC", dec!(0.4), dec!(25000), dec!(5)));

        let gains = calc.realized_gains();
        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].quantity, dec!(0.4));
        assert_eq!(gains[0].cost_basis, dec!(8004));
        assert_eq!(gains[0].proceeds, dec!(9995));
        assert_eq!(gains[0].gain_loss, dec!(1991));
        assert_eq!(gains[0].term, Term::ShortTerm);

        let lots: Vec<_> = calc.open_lots("BTC").collect();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].remaining_quantity, dec!(0.6));
        assert_eq!(lots[0].remaining_cost_basis, dec!(12006));
    }

    #[test]
    fn repeated_partial_sales_never_double_count_basis() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(1.0), dec!(1000), dec!(0)));
        calc.apply(&sell("2023-02-01", "BTC", dec!(0.5), dec!(2000), dec!(0)));
        calc.apply(&sell("2023-03-01", "BTC", dec!(0.25), dec!(2000), dec!(0)));
        calc.apply(&sell("2023-04-01", "BTC", dec!(0.25), dec!(2000), dec!(0)));

        let total_basis: Decimal = calc.realized_gains().iter().map(|g| g.cost_basis).sum();
        assert_eq!(total_basis, dec!(1000));
        assert!(calc.open_lots("BTC").next().is_none());
        assert!(calc.warnings().is_empty());
    }

    #[test]
    fn exact_consumption_removes_lot() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(1), dec!(100), dec!(0)));
        calc.apply(&sell("2023-02-01", "BTC", dec!(1), dec!(200), dec!(0)));

        assert!(calc.open_lots("BTC").next().is_none());
        assert_eq!(calc.open_quantity("BTC"), dec!(0));
    }

    #[test]
    fn term_boundary_on_sale_dates() {
        // 2023-01-01 + 365 days = 2024-01-01
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(2), dec!(100), dec!(0)));
        calc.apply(&sell("2023-12-31", "BTC", dec!(1), dec!(200), dec!(0)));
        calc.apply(&sell("2024-01-01", "BTC", dec!(1), dec!(200), dec!(0)));

        let gains = calc.realized_gains();
        assert_eq!(gains[0].days_held, 364);
        assert_eq!(gains[0].term, Term::ShortTerm);
        assert_eq!(gains[1].days_held, 365);
        assert_eq!(gains[1].term, Term::LongTerm);
    }

    #[test]
    fn sell_without_lots_warns_instead_of_failing() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&sell("2023-01-01", "DOGE", dec!(100), dec!(1), dec!(0)));

        assert!(calc.realized_gains().is_empty());
        assert_eq!(
            calc.warnings(),
            &[Warning::NoCostBasis {
                symbol: "DOGE".to_string(),
                quantity: dec!(100),
            }]
        );
    }

    #[test]
    fn exhausted_lots_warn_with_unmatched_quantity() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-01", "ETH", dec!(1), dec!(1000), dec!(0)));
        calc.apply(&sell("2023-06-01", "ETH", dec!(3), dec!(2000), dec!(0)));

        let gains = calc.realized_gains();
        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].quantity, dec!(1));
        assert_eq!(
            calc.warnings(),
            &[Warning::InsufficientLots {
                symbol: "ETH".to_string(),
                matched: dec!(1),
                unmatched: dec!(2),
            }]
        );
    }

    #[test]
    fn sale_spanning_lots_amortizes_fee_proportionally() {
        // The worked example: two buys, one sell consuming 1.0 + 0.2
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-15", "BTC", dec!(1.0), dec!(20000), dec!(10)));
        calc.apply(&buy("2023-06-20", "BTC", dec!(0.5), dec!(30000), dec!(5)));
        calc.apply(&sell("2024-01-10", "BTC", dec!(1.2), dec!(45000), dec!(20)));

        let gains = calc.realized_gains();
        assert_eq!(gains.len(), 2);

        assert_eq!(gains[0].quantity, dec!(1.0));
        assert_eq!(gains[0].cost_basis, dec!(20010));
        assert_eq!(gains[0].days_held, 360);
        assert_eq!(gains[0].term, Term::ShortTerm);

        assert_eq!(gains[1].quantity, dec!(0.2));
        assert_eq!(gains[1].cost_basis, dec!(6002));
        assert_eq!(gains[1].days_held, 204);
        assert_eq!(gains[1].term, Term::ShortTerm);

        // Net proceeds of 53980 split 1.0/1.2 and 0.2/1.2 across the lots
        let proceeds_sum = gains[0].proceeds + gains[1].proceeds;
        assert_eq!(proceeds_sum.round_dp(2), dec!(53980));

        let summary = calc.summary();
        assert_eq!(summary.short_term_gain_loss, dec!(27968));
        assert_eq!(summary.long_term_gain_loss, dec!(0));
        assert_eq!(summary.total_gain_loss, dec!(27968));
        assert_eq!(summary.total_sales, 2);
        assert_eq!(summary.total_transactions, 3);

        let lots: Vec<_> = calc.open_lots("BTC").collect();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].remaining_quantity, dec!(0.3));
        assert_eq!(lots[0].remaining_cost_basis, dec!(9003));
    }

    #[test]
    fn inventory_is_conserved() {
        let mut calc = Calculator::new(CostBasisMethod::Lifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(1.5), dec!(100), dec!(1)));
        calc.apply(&buy("2023-02-01", "BTC", dec!(2.25), dec!(150), dec!(0)));
        calc.apply(&sell("2023-03-01", "BTC", dec!(0.7), dec!(200), dec!(2)));
        calc.apply(&buy("2023-04-01", "BTC", dec!(0.05), dec!(300), dec!(0)));
        calc.apply(&sell("2023-05-01", "BTC", dec!(1.9), dec!(250), dec!(0)));

        let bought = dec!(1.5) + dec!(2.25) + dec!(0.05);
        let sold: Decimal = calc.realized_gains().iter().map(|g| g.quantity).sum();
        assert_eq!(calc.open_quantity("BTC") + sold, bought);
    }

    #[test]
    fn symbols_have_independent_inventories() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(1), dec!(20000), dec!(0)));
        calc.apply(&buy("2023-01-02", "ETH", dec!(10), dec!(1500), dec!(0)));
        calc.apply(&sell("2023-06-01", "ETH", dec!(4), dec!(2000), dec!(0)));

        assert_eq!(calc.open_quantity("BTC"), dec!(1));
        assert_eq!(calc.open_quantity("ETH"), dec!(6));
        let gains = calc.realized_gains();
        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].symbol, "ETH");
    }

    #[test]
    fn summary_is_idempotent() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.apply(&buy("2023-01-01", "BTC", dec!(1), dec!(100), dec!(0)));
        calc.apply(&sell("2023-06-01", "BTC", dec!(0.5), dec!(300), dec!(1)));

        assert_eq!(calc.summary(), calc.summary());
    }

    #[test]
    fn invalid_record_leaves_state_untouched() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        let bad = RawTransaction {
            date: "2023-01-01".to_string(),
            kind: "buy".to_string(),
            amount: dec!(-1),
            price: dec!(100),
            symbol: "BTC".to_string(),
            fee: None,
        };
        assert!(calc.add_transaction(&bad).is_err());
        let summary = calc.summary();
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(calc.open_quantity("BTC"), dec!(0));
    }
}
