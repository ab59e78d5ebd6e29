//! Return metrics: growth, risk-adjusted return, monthly breakdown, pnl.

use chrono::{Datelike, Months, NaiveDate};

use super::stats::{mean, nonzero_std};
use super::TRADING_DAYS_PER_YEAR;
use crate::domain::execution::TradeExecution;
use crate::domain::portfolio::{returns, PortfolioState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyReturn {
    /// Last calendar day of the month.
    pub month_end: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMetrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: Option<f64>,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub realized_pnl: f64,
    pub floating_pnl: f64,
    pub total_pnl: f64,
}

impl ReturnMetrics {
    pub fn compute(
        states: &[PortfolioState],
        trades: &[TradeExecution],
        initial_capital: f64,
        risk_free_rate: f64,
    ) -> Self {
        let final_total = states.last().map_or(initial_capital, |s| s.total);
        let total = total_return(final_total, initial_capital);
        let realized = realized_pnl(trades);
        let floating = floating_pnl(states, trades);

        ReturnMetrics {
            total_return: total,
            annual_return: annual_return(total, states.len()),
            sharpe_ratio: sharpe_ratio(&returns(states), risk_free_rate),
            monthly_returns: monthly_returns(states),
            realized_pnl: realized,
            floating_pnl: floating,
            total_pnl: realized + floating,
        }
    }
}

pub fn total_return(final_total: f64, initial_capital: f64) -> f64 {
    if initial_capital > 0.0 {
        (final_total - initial_capital) / initial_capital
    } else {
        0.0
    }
}

/// Annualize assuming every bar is one trading day.
pub fn annual_return(total_return: f64, bars: usize) -> f64 {
    if bars == 0 {
        return 0.0;
    }
    (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / bars as f64) - 1.0
}

pub fn excess_returns(returns: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let per_bar = risk_free_rate / TRADING_DAYS_PER_YEAR;
    returns.iter().map(|r| r - per_bar).collect()
}

/// sqrt(252) * mean(excess) / std(excess); `None` when std is zero.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    let excess = excess_returns(returns, risk_free_rate);
    let sd = nonzero_std(&excess)?;
    Some(TRADING_DAYS_PER_YEAR.sqrt() * mean(&excess)? / sd)
}

/// Compounded return of each calendar month that has at least one bar.
pub fn monthly_returns(states: &[PortfolioState]) -> Vec<MonthlyReturn> {
    let mut out: Vec<(i32, u32, f64)> = Vec::new();

    for state in states {
        let (year, month) = (state.timestamp.year(), state.timestamp.month());
        match out.last_mut() {
            Some((y, m, growth)) if *y == year && *m == month => {
                *growth *= 1.0 + state.period_return;
            }
            _ => out.push((year, month, 1.0 + state.period_return)),
        }
    }

    out.into_iter()
        .filter_map(|(year, month, growth)| {
            month_end(year, month).map(|month_end| MonthlyReturn {
                month_end,
                value: growth - 1.0,
            })
        })
        .collect()
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

pub fn realized_pnl(trades: &[TradeExecution]) -> f64 {
    trades.iter().filter_map(|t| t.realized_pnl()).sum()
}

/// (last_close - entry_price) * position for a position still open at the
/// last bar, zero when flat.
pub fn floating_pnl(states: &[PortfolioState], trades: &[TradeExecution]) -> f64 {
    let Some(last) = states.last() else {
        return 0.0;
    };
    if last.is_flat() {
        return 0.0;
    }
    match trades.iter().rev().find(|t| t.is_buy()) {
        Some(entry) => (last.close - entry.price) * last.position as f64,
        None => 0.0,
    }
}
