//! Trade execution and fill simulation.
//!
//! Fills happen instantly and fully at the bar's close. The commission is a
//! rate applied to traded value: buys pay `price * (1 + rate)` per unit, sells
//! receive `price * (1 - rate)` per unit.

use chrono::NaiveDateTime;

use super::position::OpenPosition;

/// Commission and lot-size parameters for fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub lot_size: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.001,
            lot_size: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Side-specific amounts of a fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeKind {
    /// `cost` includes commission.
    Buy { cost: f64 },
    /// `proceeds` are net of commission.
    Sell { proceeds: f64, realized_pnl: f64 },
}

/// One executed trade. Created by the simulator and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeExecution {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub quantity: u64,
    pub commission: f64,
    pub kind: TradeKind,
}

impl TradeExecution {
    pub fn side(&self) -> TradeSide {
        match self.kind {
            TradeKind::Buy { .. } => TradeSide::Buy,
            TradeKind::Sell { .. } => TradeSide::Sell,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side() == TradeSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side() == TradeSide::Sell
    }

    pub fn cost(&self) -> Option<f64> {
        match self.kind {
            TradeKind::Buy { cost } => Some(cost),
            TradeKind::Sell { .. } => None,
        }
    }

    pub fn proceeds(&self) -> Option<f64> {
        match self.kind {
            TradeKind::Sell { proceeds, .. } => Some(proceeds),
            TradeKind::Buy { .. } => None,
        }
    }

    pub fn realized_pnl(&self) -> Option<f64> {
        match self.kind {
            TradeKind::Sell { realized_pnl, .. } => Some(realized_pnl),
            TradeKind::Buy { .. } => None,
        }
    }
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: u64,
        cost: f64,
        commission: f64,
    },
    InsufficientCapital,
}

/// Size a long entry.
///
/// Buys the largest whole number of lots whose commission-inclusive cost
/// fits in `cash`. Anything short of one full lot is not bought at all.
pub fn size_entry(cash: f64, price: f64, config: &ExecutionConfig) -> EntryResult {
    let unit_cost = price * (1.0 + config.commission_rate);
    if unit_cost.is_nan() || unit_cost <= 0.0 || cash <= 0.0 {
        return EntryResult::InsufficientCapital;
    }

    let affordable = (cash / unit_cost).floor() as u64;
    let mut quantity = (affordable / config.lot_size) * config.lot_size;

    // float rounding can put the exact-fit cost a hair above cash
    while quantity >= config.lot_size && entry_cost(quantity, price, config) > cash {
        quantity -= config.lot_size;
    }

    if quantity < config.lot_size {
        return EntryResult::InsufficientCapital;
    }

    let cost = entry_cost(quantity, price, config);
    EntryResult::Entered {
        quantity,
        cost,
        commission: cost - quantity as f64 * price,
    }
}

fn entry_cost(quantity: u64, price: f64, config: &ExecutionConfig) -> f64 {
    quantity as f64 * price * (1.0 + config.commission_rate)
}

/// Result of fully liquidating a long position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitFill {
    pub quantity: u64,
    pub proceeds: f64,
    pub commission: f64,
    pub realized_pnl: f64,
}

/// Liquidate `position` at `price`.
///
/// The realized pnl charges the entry commission against the cost basis and
/// the exit commission against the proceeds.
pub fn exit_long(position: &OpenPosition, price: f64, config: &ExecutionConfig) -> ExitFill {
    let quantity = position.quantity;
    let gross = quantity as f64 * price;
    let proceeds = gross * (1.0 - config.commission_rate);
    let cost_basis = quantity as f64 * position.entry_price * (1.0 + config.commission_rate);

    ExitFill {
        quantity,
        proceeds,
        commission: gross - proceeds,
        realized_pnl: proceeds - cost_basis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config(commission_rate: f64, lot_size: u64) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate,
            lot_size,
        }
    }

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn size_entry_whole_units() {
        match size_entry(100_000.0, 11.0, &config(0.0, 1)) {
            EntryResult::Entered {
                quantity,
                cost,
                commission,
            } => {
                assert_eq!(quantity, 9090);
                assert!((cost - 99_990.0).abs() < 1e-9);
                assert!(commission.abs() < 1e-9);
            }
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn size_entry_rounds_down_to_lot() {
        // 10000 / (10 * 1.01) = 990.09 -> 990 -> 900 in lots of 100
        match size_entry(10_000.0, 10.0, &config(0.01, 100)) {
            EntryResult::Entered {
                quantity,
                cost,
                commission,
            } => {
                assert_eq!(quantity, 900);
                assert!((cost - 9_090.0).abs() < 1e-9);
                assert!((commission - 90.0).abs() < 1e-9);
            }
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn size_entry_below_one_lot() {
        // 1000 / (20 * 1.01) = 49.5 < 100
        assert_eq!(
            size_entry(1_000.0, 20.0, &config(0.01, 100)),
            EntryResult::InsufficientCapital
        );
    }

    #[test]
    fn size_entry_exact_fit() {
        match size_entry(1_000.0, 10.0, &config(0.0, 100)) {
            EntryResult::Entered { quantity, cost, .. } => {
                assert_eq!(quantity, 100);
                assert!(cost <= 1_000.0);
            }
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn size_entry_no_cash() {
        assert_eq!(
            size_entry(0.0, 10.0, &config(0.0, 1)),
            EntryResult::InsufficientCapital
        );
    }

    #[test]
    fn exit_long_with_commission() {
        let pos = OpenPosition {
            quantity: 100,
            entry_price: 10.0,
        };
        let fill = exit_long(&pos, 12.0, &config(0.01, 100));

        assert_eq!(fill.quantity, 100);
        assert!((fill.proceeds - 1_188.0).abs() < 1e-9);
        assert!((fill.commission - 12.0).abs() < 1e-9);
        // 1188 - 100 * 10 * 1.01
        assert!((fill.realized_pnl - 178.0).abs() < 1e-9);
    }

    #[test]
    fn exit_long_round_trip_zero_commission() {
        let pos = OpenPosition {
            quantity: 50,
            entry_price: 20.0,
        };
        let fill = exit_long(&pos, 20.0, &config(0.0, 1));
        assert_eq!(fill.realized_pnl, 0.0);
        assert_eq!(fill.proceeds, 1_000.0);
    }

    #[test]
    fn trade_accessors() {
        let buy = TradeExecution {
            timestamp: at(2),
            price: 10.0,
            quantity: 100,
            commission: 1.0,
            kind: TradeKind::Buy { cost: 1_001.0 },
        };
        assert_eq!(buy.side(), TradeSide::Buy);
        assert!(buy.is_buy());
        assert_eq!(buy.cost(), Some(1_001.0));
        assert_eq!(buy.realized_pnl(), None);
        assert_eq!(buy.proceeds(), None);

        let sell = TradeExecution {
            timestamp: at(3),
            price: 11.0,
            quantity: 100,
            commission: 1.1,
            kind: TradeKind::Sell {
                proceeds: 1_098.9,
                realized_pnl: 97.9,
            },
        };
        assert!(sell.is_sell());
        assert_eq!(sell.realized_pnl(), Some(97.9));
        assert_eq!(sell.proceeds(), Some(1_098.9));
        assert_eq!(sell.cost(), None);
    }
}
