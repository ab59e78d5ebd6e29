//! Backtest runner and result assembly.
//!
//! A run is: signals from the producer, simulation, buy-and-hold benchmark,
//! metrics, then an immutable [`BacktestResult`]. Symbols are independent, so
//! [`run_multi_symbol`] fans them out over the rayon pool.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use super::benchmark::buy_and_hold;
use super::error::BarsimError;
use super::execution::{ExecutionConfig, TradeExecution};
use super::metrics::{Metrics, PositionMetrics, ReturnMetrics, RiskMetrics, TradeMetrics};
use super::ohlcv::Bar;
use super::portfolio::PortfolioState;
use super::signal::SignalProducer;
use super::simulator::{simulate, SimulationOutput};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub lot_size: u64,
    pub risk_free_rate: f64,
}

impl BacktestConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: self.commission_rate,
            lot_size: self.lot_size,
        }
    }
}

/// Everything one symbol's run produced. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy_name: String,
    pub initial_capital: f64,
    pub final_total: f64,
    pub states: Vec<PortfolioState>,
    pub trades: Vec<TradeExecution>,
    pub return_metrics: ReturnMetrics,
    pub risk_metrics: RiskMetrics,
    pub trade_metrics: TradeMetrics,
    pub position_metrics: PositionMetrics,
    pub benchmark: Vec<PortfolioState>,
}

impl BacktestResult {
    pub fn assemble(
        symbol: &str,
        strategy_name: &str,
        initial_capital: f64,
        output: SimulationOutput,
        metrics: Metrics,
        benchmark: Vec<PortfolioState>,
    ) -> Self {
        let final_total = output.states.last().map_or(initial_capital, |s| s.total);
        BacktestResult {
            symbol: symbol.to_string(),
            strategy_name: strategy_name.to_string(),
            initial_capital,
            final_total,
            states: output.states,
            trades: output.trades,
            return_metrics: metrics.returns,
            risk_metrics: metrics.risk,
            trade_metrics: metrics.trades,
            position_metrics: metrics.positions,
            benchmark,
        }
    }

    /// Benchmark total return over the same bars.
    pub fn benchmark_return(&self) -> Option<f64> {
        let last = self.benchmark.last()?;
        Some((last.total - self.initial_capital) / self.initial_capital)
    }
}

pub fn run_backtest(
    symbol: &str,
    bars: &[Bar],
    producer: &dyn SignalProducer,
    config: &BacktestConfig,
) -> Result<BacktestResult, BarsimError> {
    let execution = config.execution();
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        info!(
            symbol,
            strategy = producer.name(),
            bars = bars.len(),
            from = %first.timestamp,
            to = %last.timestamp,
            capital = config.initial_capital,
            commission = config.commission_rate,
            lot_size = config.lot_size,
            "starting backtest"
        );
    }

    if bars.len() <= producer.warmup_bars() {
        warn!(
            symbol,
            bars = bars.len(),
            warmup = producer.warmup_bars(),
            "fewer bars than the strategy warmup; signals rest on partial windows"
        );
    }

    let signals = producer.generate_signals(bars);
    let output = simulate(bars, &signals, config.initial_capital, &execution)?;
    let benchmark = buy_and_hold(bars, config.initial_capital, &execution)?;
    let metrics = Metrics::compute(
        &output,
        Some(benchmark.as_slice()),
        config.initial_capital,
        config.risk_free_rate,
    );

    let result = BacktestResult::assemble(
        symbol,
        producer.name(),
        config.initial_capital,
        output,
        metrics,
        benchmark,
    );
    log_summary(&result);
    Ok(result)
}

fn log_summary(result: &BacktestResult) {
    let r = &result.return_metrics;
    info!(
        symbol = %result.symbol,
        total_return = r.total_return,
        annual_return = r.annual_return,
        sharpe = ?r.sharpe_ratio,
        max_drawdown = result.risk_metrics.max_drawdown,
        win_rate = result.trade_metrics.win_rate,
        trades = result.trade_metrics.total_trades,
        realized_pnl = r.realized_pnl,
        floating_pnl = r.floating_pnl,
        total_pnl = r.total_pnl,
        "backtest complete"
    );
}

/// Bars for one symbol, as handed to [`run_multi_symbol`].
#[derive(Debug, Clone)]
pub struct SymbolBars {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: BarsimError,
}

/// Cross-symbol summary computed from the numeric metric records.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMetrics {
    pub symbol_count: usize,
    pub mean_total_return: f64,
    /// Mean over symbols whose Sharpe is defined.
    pub mean_sharpe: Option<f64>,
    /// Most negative max drawdown across symbols.
    pub worst_max_drawdown: f64,
}

impl AggregateMetrics {
    pub fn compute(results: &[BacktestResult]) -> Self {
        let n = results.len();
        let mean_total_return = if n == 0 {
            0.0
        } else {
            results
                .iter()
                .map(|r| r.return_metrics.total_return)
                .sum::<f64>()
                / n as f64
        };

        let sharpes: Vec<f64> = results
            .iter()
            .filter_map(|r| r.return_metrics.sharpe_ratio)
            .collect();
        let mean_sharpe =
            (!sharpes.is_empty()).then(|| sharpes.iter().sum::<f64>() / sharpes.len() as f64);

        AggregateMetrics {
            symbol_count: n,
            mean_total_return,
            mean_sharpe,
            worst_max_drawdown: results
                .iter()
                .map(|r| r.risk_metrics.max_drawdown)
                .fold(0.0, f64::min),
        }
    }
}

#[derive(Debug)]
pub struct StrategyReport {
    pub strategy_name: String,
    pub initial_capital: f64,
    pub commission_rate: f64,
    /// In input order.
    pub results: Vec<BacktestResult>,
    pub failures: Vec<SymbolFailure>,
    pub aggregate: AggregateMetrics,
}

/// Run one backtest per symbol in parallel. A failing symbol is recorded in
/// `failures` and does not stop the others.
pub fn run_multi_symbol(
    inputs: &[SymbolBars],
    producer: &dyn SignalProducer,
    config: &BacktestConfig,
) -> StrategyReport {
    let outcomes: Vec<Result<BacktestResult, SymbolFailure>> = inputs
        .par_iter()
        .map(|input| {
            run_backtest(&input.symbol, &input.bars, producer, config).map_err(|error| {
                warn!(symbol = %input.symbol, %error, "backtest failed");
                SymbolFailure {
                    symbol: input.symbol.clone(),
                    error,
                }
            })
        })
        .collect();

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(failure) => failures.push(failure),
        }
    }

    let aggregate = AggregateMetrics::compute(&results);
    StrategyReport {
        strategy_name: producer.name().to_string(),
        initial_capital: config.initial_capital,
        commission_rate: config.commission_rate,
        results,
        failures,
        aggregate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::ScriptedSignals;
    use crate::domain::signal::Signal::{Buy, Hold, Sell};
    use chrono::Duration;

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            initial_capital: 100_000.0,
            commission_rate: 0.0,
            lot_size: 1,
            risk_free_rate: 0.02,
        }
    }

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
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
    fn execution_config_from_backtest_config() {
        let c = BacktestConfig {
            commission_rate: 0.003,
            lot_size: 100,
            ..sample_config()
        };
        let e = c.execution();
        assert!((e.commission_rate - 0.003).abs() < f64::EPSILON);
        assert_eq!(e.lot_size, 100);
    }

    #[test]
    fn run_backtest_assembles_result() {
        let producer = ScriptedSignals::new(vec![Hold, Buy, Hold, Sell]);
        let result =
            run_backtest("AAA", &bars(&[10.0, 11.0, 9.0, 12.0]), &producer, &sample_config())
                .unwrap();

        assert_eq!(result.symbol, "AAA");
        assert_eq!(result.strategy_name, "scripted");
        assert_eq!(result.states.len(), 4);
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.benchmark.len(), 4);
        assert_eq!(result.trade_metrics.total_trades, 1);
        assert!((result.final_total - result.states[3].total).abs() < f64::EPSILON);
        // 9090 * (12 - 11) on top of the capital
        assert!((result.final_total - 109_090.0).abs() < 1e-6);
        assert!(result.risk_metrics.beta.is_some());
        // benchmark: 10000 shares at 10, last close 12
        assert!((result.benchmark_return().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn run_backtest_propagates_validation_error() {
        let producer = ScriptedSignals::new(vec![Hold, Buy]);
        let err = run_backtest("AAA", &bars(&[10.0, 11.0, 12.0]), &producer, &sample_config())
            .unwrap_err();
        assert!(matches!(err, BarsimError::LengthMismatch { .. }));
    }

    #[test]
    fn multi_symbol_keeps_input_order_and_isolates_failures() {
        let producer = ScriptedSignals::new(vec![Hold, Buy, Sell]);
        let inputs = vec![
            SymbolBars {
                symbol: "UP".into(),
                bars: bars(&[10.0, 10.0, 12.0]),
            },
            SymbolBars {
                symbol: "SHORT".into(),
                bars: bars(&[10.0]),
            },
            SymbolBars {
                symbol: "DOWN".into(),
                bars: bars(&[10.0, 10.0, 8.0]),
            },
        ];
        let report = run_multi_symbol(&inputs, &producer, &sample_config());

        assert_eq!(report.strategy_name, "scripted");
        let symbols: Vec<&str> = report.results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["UP", "DOWN"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "SHORT");

        assert_eq!(report.aggregate.symbol_count, 2);
        assert!(report.aggregate.mean_total_return.abs() < 1e-9);
        assert!((report.aggregate.worst_max_drawdown - (-0.2)).abs() < 1e-9);
    }

    #[test]
    fn aggregate_of_nothing() {
        let agg = AggregateMetrics::compute(&[]);
        assert_eq!(agg.symbol_count, 0);
        assert_eq!(agg.mean_total_return, 0.0);
        assert_eq!(agg.mean_sharpe, None);
        assert_eq!(agg.worst_max_drawdown, 0.0);
    }
}
