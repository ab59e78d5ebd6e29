//! Per-bar portfolio state.

use chrono::NaiveDateTime;

/// Portfolio snapshot at the close of one bar.
///
/// `holdings = position * close` and `total = cash + holdings` hold for every
/// state built through [`PortfolioState::mark`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub timestamp: NaiveDateTime,
    pub position: u64,
    pub cash: f64,
    pub close: f64,
    pub holdings: f64,
    pub total: f64,
    /// total[t] / total[t-1] - 1; zero for the first bar.
    pub period_return: f64,
}

impl PortfolioState {
    /// Mark `position` and `cash` to market at `close`.
    pub fn mark(
        timestamp: NaiveDateTime,
        position: u64,
        cash: f64,
        close: f64,
        previous_total: Option<f64>,
    ) -> Self {
        let holdings = position as f64 * close;
        let total = cash + holdings;
        let period_return = match previous_total {
            Some(prev) if prev != 0.0 => total / prev - 1.0,
            _ => 0.0,
        };
        PortfolioState {
            timestamp,
            position,
            cash,
            close,
            holdings,
            total,
            period_return,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0
    }
}

/// Period returns of a state series, first element zero.
pub fn returns(states: &[PortfolioState]) -> Vec<f64> {
    states.iter().map(|s| s.period_return).collect()
}

/// Total portfolio value of a state series.
pub fn totals(states: &[PortfolioState]) -> Vec<f64> {
    states.iter().map(|s| s.total).collect()
}
