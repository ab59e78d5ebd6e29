//! Performance metrics over a simulation output.
//!
//! Every calculator is a pure function of the state series and trade list.
//! Metrics that are undefined for their input (zero variance, no trades) come
//! back as `None` rather than NaN.

pub mod position;
pub mod returns;
pub mod risk;
pub mod stats;
pub mod trades;

pub use position::PositionMetrics;
pub use returns::{MonthlyReturn, ReturnMetrics};
pub use risk::RiskMetrics;
pub use trades::{round_trips, RoundTrip, TradeMetrics};

use super::portfolio::PortfolioState;
use super::simulator::SimulationOutput;

/// Bars per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// All four metric records for one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub returns: ReturnMetrics,
    pub risk: RiskMetrics,
    pub trades: TradeMetrics,
    pub positions: PositionMetrics,
}

impl Metrics {
    pub fn compute(
        output: &SimulationOutput,
        benchmark: Option<&[PortfolioState]>,
        initial_capital: f64,
        risk_free_rate: f64,
    ) -> Self {
        Metrics {
            returns: ReturnMetrics::compute(
                &output.states,
                &output.trades,
                initial_capital,
                risk_free_rate,
            ),
            risk: RiskMetrics::compute(&output.states, benchmark, risk_free_rate),
            trades: TradeMetrics::compute(&output.trades),
            positions: PositionMetrics::compute(&output.states),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::ExecutionConfig;
    use crate::domain::ohlcv::Bar;
    use crate::domain::signal::Signal::{Buy, Hold, Sell};
    use crate::domain::simulator::simulate;
    use chrono::{Duration, NaiveDate};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::from_close(start + Duration::days(i as i64), c))
            .collect()
    }

    #[test]
    fn compute_over_a_round_trip() {
        let bars = bars(&[10.0, 10.0, 11.0, 12.0, 12.0]);
        let config = ExecutionConfig {
            commission_rate: 0.0,
            lot_size: 1,
        };
        let out = simulate(&bars, &[Hold, Buy, Hold, Sell, Hold], 1_000.0, &config).unwrap();
        let m = Metrics::compute(&out, None, 1_000.0, 0.02);

        assert!((m.returns.total_return - 0.2).abs() < 1e-12);
        assert!((m.returns.realized_pnl - 200.0).abs() < 1e-9);
        assert_eq!(m.returns.floating_pnl, 0.0);
        assert_eq!(m.trades.total_trades, 1);
        assert_eq!(m.trades.winning_trades, 1);
        assert_eq!(m.trades.avg_position_duration, Some(Duration::days(2)));
        assert_eq!(m.positions.max_position_size, 100);
        assert_eq!(m.positions.current_position, 0);
        assert_eq!(m.risk.max_drawdown, 0.0);
        assert_eq!(m.risk.beta, None);
    }
}
