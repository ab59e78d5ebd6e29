//! Buy-and-hold reference trajectory.

use super::error::BarsimError;
use super::execution::{size_entry, EntryResult, ExecutionConfig};
use super::ohlcv::Bar;
use super::portfolio::PortfolioState;
use super::signal::Signal;
use super::simulator::validate_inputs;

/// Buy as many whole lots as `initial_capital` affords at the first close and
/// hold them to the last bar. When not even one lot is affordable the
/// benchmark stays in cash for the whole series.
pub fn buy_and_hold(
    bars: &[Bar],
    initial_capital: f64,
    config: &ExecutionConfig,
) -> Result<Vec<PortfolioState>, BarsimError> {
    let holds = vec![Signal::Hold; bars.len()];
    validate_inputs(bars, &holds, initial_capital, config)?;

    let (position, cash) = match size_entry(initial_capital, bars[0].close, config) {
        EntryResult::Entered { quantity, cost, .. } => (quantity, initial_capital - cost),
        EntryResult::InsufficientCapital => (0, initial_capital),
    };

    let mut states: Vec<PortfolioState> = Vec::with_capacity(bars.len());
    for bar in bars {
        let previous_total = states.last().map(|s| s.total);
        states.push(PortfolioState::mark(
            bar.timestamp,
            position,
            cash,
            bar.close,
            previous_total,
        ));
    }
    Ok(states)
}
