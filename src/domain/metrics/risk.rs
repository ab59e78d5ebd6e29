//! Risk metrics over the portfolio state series.

use super::returns::excess_returns;
use super::stats::{
    mean, nonzero_std, percentile, running_max, sample_covariance, sample_std, sample_variance,
    ZERO_VARIANCE_EPS,
};
use super::TRADING_DAYS_PER_YEAR;
use crate::domain::portfolio::{returns, totals, PortfolioState};

/// Historical VaR confidence: the 5th percentile of period returns.
pub const VAR_QUANTILE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskMetrics {
    pub volatility: f64,
    /// Most negative (total - peak) / peak; zero when total never dips.
    pub max_drawdown: f64,
    /// Longest run of bars spent below the running peak.
    pub max_drawdown_duration: usize,
    pub value_at_risk: Option<f64>,
    pub beta: Option<f64>,
    pub sortino_ratio: Option<f64>,
}

impl RiskMetrics {
    pub fn compute(
        states: &[PortfolioState],
        benchmark: Option<&[PortfolioState]>,
        risk_free_rate: f64,
    ) -> Self {
        let period_returns = returns(states);
        let equity = totals(states);
        let benchmark_returns = benchmark.map(returns);

        RiskMetrics {
            volatility: volatility(&period_returns),
            max_drawdown: max_drawdown(&equity),
            max_drawdown_duration: drawdown_duration(&equity),
            value_at_risk: value_at_risk(&period_returns),
            beta: beta(&period_returns, benchmark_returns.as_deref()),
            sortino_ratio: sortino_ratio(&period_returns, risk_free_rate),
        }
    }
}

pub fn volatility(returns: &[f64]) -> f64 {
    sample_std(returns).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR.sqrt()
}

pub fn max_drawdown(equity: &[f64]) -> f64 {
    equity
        .iter()
        .zip(running_max(equity))
        .filter(|(_, peak)| *peak > 0.0)
        .map(|(total, peak)| (total - peak) / peak)
        .fold(0.0, f64::min)
}

pub fn drawdown_duration(equity: &[f64]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for (total, peak) in equity.iter().zip(running_max(equity)) {
        if *total < peak {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

pub fn value_at_risk(returns: &[f64]) -> Option<f64> {
    percentile(returns, VAR_QUANTILE)
}

/// cov(returns, benchmark) / var(benchmark); `None` without an aligned,
/// non-constant benchmark.
pub fn beta(returns: &[f64], benchmark_returns: Option<&[f64]>) -> Option<f64> {
    let bench = benchmark_returns?;
    if bench.len() != returns.len() {
        return None;
    }
    let variance = sample_variance(bench)?;
    if variance.sqrt() <= ZERO_VARIANCE_EPS {
        return None;
    }
    Some(sample_covariance(returns, bench)? / variance)
}

/// Like Sharpe, but divides by the deviation of negative excess returns only.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    let excess = excess_returns(returns, risk_free_rate);
    let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_sd = nonzero_std(&downside)?;
    Some(TRADING_DAYS_PER_YEAR.sqrt() * mean(&excess)? / downside_sd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn states_from_totals(values: &[f64]) -> Vec<PortfolioState> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut states: Vec<PortfolioState> = Vec::new();
        for (i, &total) in values.iter().enumerate() {
            let prev = states.last().map(|s| s.total);
            states.push(PortfolioState::mark(
                start + chrono::Duration::days(i as i64),
                0,
                total,
                1.0,
                prev,
            ));
        }
        states
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[100.0, 101.0, 105.0, 105.0, 110.0]), 0.0);
    }

    #[test]
    fn max_drawdown_from_peak() {
        let equity = [100.0, 110.0, 90.0, 95.0, 80.0, 100.0];
        assert_abs_diff_eq!(max_drawdown(&equity), (80.0 - 110.0) / 110.0, epsilon = 1e-12);
    }

    #[test]
    fn drawdown_duration_longest_run() {
        let equity = [100.0, 110.0, 100.0, 90.0, 85.0, 95.0, 120.0, 119.0];
        assert_eq!(drawdown_duration(&equity), 4);
        assert_eq!(drawdown_duration(&[1.0, 2.0, 3.0]), 0);
    }

    #[test]
    fn volatility_annualizes_sample_std() {
        let r = [0.0, 0.01, -0.01, 0.02];
        assert_abs_diff_eq!(
            volatility(&r),
            sample_std(&r).unwrap() * 252.0_f64.sqrt(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn value_at_risk_is_fifth_percentile() {
        let r: Vec<f64> = (0..21).map(|i| (i as f64 - 10.0) / 100.0).collect();
        // pos = 0.05 * 20 = 1 -> second smallest
        assert_abs_diff_eq!(value_at_risk(&r).unwrap(), -0.09, epsilon = 1e-12);
    }

    #[test]
    fn beta_of_identical_series_is_one() {
        let r = [0.0, 0.01, -0.02, 0.015, 0.005];
        assert_abs_diff_eq!(beta(&r, Some(&r[..])).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn beta_scales_with_exposure() {
        let bench = [0.0, 0.01, -0.02, 0.015, 0.005];
        let r: Vec<f64> = bench.iter().map(|b| b * 0.5).collect();
        assert_abs_diff_eq!(beta(&r, Some(&bench[..])).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn beta_undefined_cases() {
        let r = [0.0, 0.01, -0.02];
        assert_eq!(beta(&r, None), None);
        assert_eq!(beta(&r, Some(&[0.0, 0.0, 0.0][..])), None);
        assert_eq!(beta(&r, Some(&[0.0, 0.01][..])), None);
    }

    #[test]
    fn sortino_undefined_without_losses() {
        assert_eq!(sortino_ratio(&[0.0, 0.01, 0.02, 0.03], 0.0), None);
    }

    #[test]
    fn sortino_uses_downside_deviation() {
        let r = [0.0, 0.02, -0.01, 0.03, -0.03];
        let downside = [-0.01, -0.03];
        let expected =
            252.0_f64.sqrt() * mean(&r).unwrap() / sample_std(&downside).unwrap();
        assert_abs_diff_eq!(sortino_ratio(&r, 0.0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn compute_uses_benchmark_when_given() {
        let states = states_from_totals(&[100.0, 102.0, 99.0, 104.0]);
        let with = RiskMetrics::compute(&states, Some(states.as_slice()), 0.02);
        let without = RiskMetrics::compute(&states, None, 0.02);

        assert_abs_diff_eq!(with.beta.unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(without.beta, None);
        assert_eq!(with.max_drawdown_duration, 1);
        assert!(with.max_drawdown < 0.0);
    }
}
