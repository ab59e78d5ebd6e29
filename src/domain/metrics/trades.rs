//! Trade statistics over realized (sell-side) trades.

use chrono::Duration;

use super::stats::mean;
use crate::domain::execution::TradeExecution;

/// A buy paired with the sell that closed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundTrip {
    pub entry: TradeExecution,
    pub exit: TradeExecution,
}

impl RoundTrip {
    pub fn holding_period(&self) -> Duration {
        self.exit.timestamp - self.entry.timestamp
    }

    pub fn pnl(&self) -> f64 {
        self.exit.realized_pnl().unwrap_or(0.0)
    }

    /// Realized pnl relative to the commission-inclusive entry cost.
    pub fn trade_return(&self) -> Option<f64> {
        let cost = self.entry.cost()?;
        (cost > 0.0).then(|| self.pnl() / cost)
    }
}

/// Pair each sell with the most recent unmatched buy.
pub fn round_trips(trades: &[TradeExecution]) -> Vec<RoundTrip> {
    let mut pending: Option<TradeExecution> = None;
    let mut trips = Vec::new();
    for trade in trades {
        if trade.is_buy() {
            pending = Some(*trade);
        } else if let Some(entry) = pending.take() {
            trips.push(RoundTrip {
                entry,
                exit: *trade,
            });
        }
    }
    trips
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub avg_win: Option<f64>,
    pub avg_loss: Option<f64>,
    pub largest_win: Option<f64>,
    pub largest_loss: Option<f64>,
    pub avg_trade_pnl: Option<f64>,
    pub avg_trade_return: Option<f64>,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub avg_position_duration: Option<Duration>,
}

impl TradeMetrics {
    pub fn compute(trades: &[TradeExecution]) -> Self {
        let pnls: Vec<f64> = trades.iter().filter_map(|t| t.realized_pnl()).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().map(|l| l.abs()).sum();

        let trips = round_trips(trades);
        let trade_returns: Vec<f64> = trips.iter().filter_map(RoundTrip::trade_return).collect();

        TradeMetrics {
            total_trades: pnls.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: win_rate(wins.len(), pnls.len()),
            gross_profit,
            gross_loss,
            profit_factor: profit_factor(gross_profit, gross_loss, pnls.len()),
            avg_win: mean(&wins),
            avg_loss: mean(&losses),
            largest_win: wins.iter().copied().reduce(f64::max),
            largest_loss: losses.iter().copied().reduce(f64::min),
            avg_trade_pnl: mean(&pnls),
            avg_trade_return: mean(&trade_returns),
            max_consecutive_wins: max_consecutive(&pnls, |p| p > 0.0),
            max_consecutive_losses: max_consecutive(&pnls, |p| p < 0.0),
            avg_position_duration: avg_position_duration(&trips),
        }
    }
}

pub fn win_rate(winning: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        winning as f64 / total as f64
    }
}

/// gross_profit / gross_loss, infinite when nothing was lost and something
/// was won, zero with no trades.
pub fn profit_factor(gross_profit: f64, gross_loss: f64, total_trades: usize) -> f64 {
    if total_trades == 0 {
        0.0
    } else if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Longest run of consecutive pnls matching `pred`, in chronological order.
pub fn max_consecutive(pnls: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for &pnl in pnls {
        if pred(pnl) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

pub fn avg_position_duration(trips: &[RoundTrip]) -> Option<Duration> {
    if trips.is_empty() {
        return None;
    }
    let total_ms: i64 = trips
        .iter()
        .map(|t| t.holding_period().num_milliseconds())
        .sum();
    Some(Duration::milliseconds(total_ms / trips.len() as i64))
}
