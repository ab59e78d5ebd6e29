//! Bar-by-bar portfolio simulation.
//!
//! Two states: flat (no position) and long (one open position). Bar 0 only
//! seeds the state with full cash; from bar 1 on, a Buy while flat enters with
//! the largest affordable whole number of lots and a Sell while long
//! liquidates the whole position. Every other signal/state pairing carries
//! cash and position forward unchanged.

use tracing::{debug, info};

use super::error::BarsimError;
use super::execution::{
    exit_long, size_entry, EntryResult, ExecutionConfig, TradeExecution, TradeKind,
};
use super::ohlcv::Bar;
use super::portfolio::PortfolioState;
use super::position::OpenPosition;
use super::signal::Signal;

pub const MIN_BARS: usize = 2;

/// Portfolio state series and trades produced by one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub states: Vec<PortfolioState>,
    pub trades: Vec<TradeExecution>,
}

/// Check simulation inputs without touching any state.
pub fn validate_inputs(
    bars: &[Bar],
    signals: &[Signal],
    initial_capital: f64,
    config: &ExecutionConfig,
) -> Result<(), BarsimError> {
    if bars.len() != signals.len() {
        return Err(BarsimError::LengthMismatch {
            bars: bars.len(),
            signals: signals.len(),
        });
    }
    if bars.len() < MIN_BARS {
        return Err(BarsimError::InsufficientBars {
            bars: bars.len(),
            minimum: MIN_BARS,
        });
    }
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(BarsimError::NonPositiveCapital {
            capital: initial_capital,
        });
    }
    if !config.commission_rate.is_finite()
        || config.commission_rate < 0.0
        || config.commission_rate >= 1.0
    {
        return Err(BarsimError::InvalidCommission {
            rate: config.commission_rate,
        });
    }
    if config.lot_size == 0 {
        return Err(BarsimError::InvalidLotSize {
            lot_size: config.lot_size,
        });
    }
    if let Some(index) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(BarsimError::NonAscendingTimestamps { index: index + 1 });
    }
    if let Some((index, bar)) = bars
        .iter()
        .enumerate()
        .find(|(_, b)| !b.close.is_finite() || b.close <= 0.0)
    {
        return Err(BarsimError::InvalidPrice {
            index,
            close: bar.close,
        });
    }
    Ok(())
}

/// Walk `bars` and `signals` together and build the portfolio trajectory.
///
/// Fails before any state is built if the inputs are malformed; no partial
/// output is ever returned.
pub fn simulate(
    bars: &[Bar],
    signals: &[Signal],
    initial_capital: f64,
    config: &ExecutionConfig,
) -> Result<SimulationOutput, BarsimError> {
    validate_inputs(bars, signals, initial_capital, config)?;

    let mut states = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();
    let mut cash = initial_capital;
    let mut open: Option<OpenPosition> = None;

    states.push(PortfolioState::mark(
        bars[0].timestamp,
        0,
        cash,
        bars[0].close,
        None,
    ));

    for (bar, &signal) in bars.iter().zip(signals).skip(1) {
        let price = bar.close;

        match (signal, open) {
            (Signal::Buy, None) => match size_entry(cash, price, config) {
                EntryResult::Entered {
                    quantity,
                    cost,
                    commission,
                } => {
                    cash -= cost;
                    open = Some(OpenPosition {
                        quantity,
                        entry_price: price,
                    });
                    info!(
                        time = %bar.timestamp,
                        quantity,
                        lots = quantity / config.lot_size,
                        price,
                        cost,
                        commission,
                        "BUY"
                    );
                    trades.push(TradeExecution {
                        timestamp: bar.timestamp,
                        price,
                        quantity,
                        commission,
                        kind: TradeKind::Buy { cost },
                    });
                }
                EntryResult::InsufficientCapital => {
                    debug!(time = %bar.timestamp, cash, price, "buy signal skipped: below one lot");
                }
            },
            (Signal::Sell, Some(position)) => {
                let fill = exit_long(&position, price, config);
                cash += fill.proceeds;
                open = None;
                info!(
                    time = %bar.timestamp,
                    quantity = fill.quantity,
                    lots = position.lots(config.lot_size),
                    price,
                    proceeds = fill.proceeds,
                    commission = fill.commission,
                    pnl = fill.realized_pnl,
                    "SELL"
                );
                trades.push(TradeExecution {
                    timestamp: bar.timestamp,
                    price,
                    quantity: fill.quantity,
                    commission: fill.commission,
                    kind: TradeKind::Sell {
                        proceeds: fill.proceeds,
                        realized_pnl: fill.realized_pnl,
                    },
                });
            }
            _ => {}
        }

        let previous_total = states.last().map(|s: &PortfolioState| s.total);
        let position = open.map_or(0, |p| p.quantity);
        states.push(PortfolioState::mark(
            bar.timestamp,
            position,
            cash,
            price,
            previous_total,
        ));
    }

    if let (Some(position), Some(last)) = (open, bars.last()) {
        debug!(
            quantity = position.quantity,
            entry_price = position.entry_price,
            floating_pnl = position.unrealized_pnl(last.close),
            "position still open at end of run"
        );
    }

    Ok(SimulationOutput { states, trades })
}
