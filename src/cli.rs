//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_multi_symbol, BacktestConfig, StrategyReport, SymbolBars};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_strategy_config, validate_symbols,
    DEFAULT_COMMISSION, DEFAULT_INITIAL_CAPITAL, DEFAULT_LONG_WINDOW, DEFAULT_LOT_SIZE,
    DEFAULT_RISK_FREE_RATE, DEFAULT_SHORT_WINDOW, DEFAULT_STRATEGY, STRATEGY_NAMES,
};
use crate::domain::error::BarsimError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::signal::SignalProducer;
use crate::domain::strategy::{MacdCross, MovingAverageCross};
use crate::logging::init_logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "barsim", about = "Portfolio simulation and backtest metrics")]
pub struct Cli {
    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over one or more symbols
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured symbols (repeatable)
        #[arg(short, long)]
        symbol: Vec<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    Symbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("warning: logging not initialised: {e}");
    }
    match cli.command {
        Command::Backtest { config, symbol } => run_backtest(&config, &symbol),
        Command::Validate { config } => run_validate(&config),
        Command::Symbols { config } => run_symbols(&config),
    }
}

fn fail(err: &BarsimError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn run_backtest(config_path: &PathBuf, symbol_override: &[String]) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }

    // Stage 3: Strategy and backtest parameters
    let producer = match build_strategy(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    eprintln!("Strategy: {}", producer.name());

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    // Stage 4: Symbols
    let symbols = match resolve_symbols(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    // Stage 5: Data, simulation, summary
    let data_port = CsvAdapter::new(data_path(&adapter));
    match run_backtest_pipeline(&data_port, producer.as_ref(), &bt_config, &symbols) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn data_path(adapter: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        adapter
            .get_string("data", "path")
            .unwrap_or_else(|| "data".to_string()),
    )
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BarsimError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    let lot_size = adapter.get_int("backtest", "lot_size", DEFAULT_LOT_SIZE);
    let lot_size = u64::try_from(lot_size).map_err(|_| BarsimError::ConfigInvalid {
        section: "backtest".into(),
        key: "lot_size".into(),
        reason: format!("lot_size must be at least 1, got {}", lot_size),
    })?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        commission_rate: adapter.get_double("backtest", "commission", DEFAULT_COMMISSION),
        lot_size,
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
    })
}

fn window(adapter: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, BarsimError> {
    let value = adapter.get_int("strategy", key, default);
    usize::try_from(value).map_err(|_| BarsimError::ConfigInvalid {
        section: "strategy".into(),
        key: key.into(),
        reason: format!("{} must be non-negative, got {}", key, value),
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Box<dyn SignalProducer>, BarsimError> {
    let name = adapter
        .get_string("strategy", "name")
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());

    match name.trim() {
        "ma_cross" => Ok(Box::new(MovingAverageCross::new(
            window(adapter, "short_window", DEFAULT_SHORT_WINDOW)?,
            window(adapter, "long_window", DEFAULT_LONG_WINDOW)?,
        )?)),
        "macd" => Ok(Box::new(MacdCross::new(
            window(adapter, "fast_period", DEFAULT_FAST as i64)?,
            window(adapter, "slow_period", DEFAULT_SLOW as i64)?,
            window(adapter, "signal_period", DEFAULT_SIGNAL as i64)?,
        )?)),
        other => Err(BarsimError::ConfigInvalid {
            section: "strategy".into(),
            key: "name".into(),
            reason: format!(
                "unknown strategy '{}', expected one of {}",
                other,
                STRATEGY_NAMES.join(", ")
            ),
        }),
    }
}

/// Command-line symbols win over the configured list.
pub fn resolve_symbols(
    overrides: &[String],
    adapter: &dyn ConfigPort,
) -> Result<Vec<String>, BarsimError> {
    let from_cli: Vec<String> = overrides
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !from_cli.is_empty() {
        return Ok(from_cli);
    }
    validate_symbols(adapter)?;
    Ok(adapter.get_list("backtest", "symbols"))
}

/// Fetch bars for every symbol and run them in parallel. Symbols whose bars
/// cannot be read are skipped; the run fails only when nothing succeeds.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    producer: &dyn SignalProducer,
    bt_config: &BacktestConfig,
    symbols: &[String],
) -> Result<StrategyReport, BarsimError> {
    let mut inputs: Vec<SymbolBars> = Vec::with_capacity(symbols.len());
    let mut last_error: Option<BarsimError> = None;

    for symbol in symbols {
        match data_port.fetch_bars(symbol, bt_config.start_date, bt_config.end_date) {
            Ok(bars) if bars.is_empty() => {
                warn!(symbol = %symbol, "skipping symbol: no bars in range");
                last_error = Some(BarsimError::NoData {
                    symbol: symbol.clone(),
                });
            }
            Ok(bars) => inputs.push(SymbolBars {
                symbol: symbol.clone(),
                bars,
            }),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol: bars unavailable");
                last_error = Some(e);
            }
        }
    }

    if inputs.is_empty() {
        return Err(last_error.unwrap_or_else(|| BarsimError::NoData {
            symbol: symbols.join(","),
        }));
    }

    eprintln!(
        "Running backtest: {} symbols, {} to {}",
        inputs.len(),
        bt_config.start_date,
        bt_config.end_date,
    );
    let mut report = run_multi_symbol(&inputs, producer, bt_config);

    if report.results.is_empty() && !report.failures.is_empty() {
        let failure = report.failures.swap_remove(0);
        return Err(failure.error);
    }
    Ok(report)
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn print_report(report: &StrategyReport) {
    for result in &report.results {
        let r = &result.return_metrics;
        let risk = &result.risk_metrics;
        let t = &result.trade_metrics;

        eprintln!("\n=== {} ({}) ===", result.symbol, result.strategy_name);
        eprintln!("Final Value:      {:.2}", result.final_total);
        eprintln!("Total Return:     {}", pct(r.total_return));
        eprintln!("Annualized:       {}", pct(r.annual_return));
        eprintln!(
            "Benchmark:        {}",
            result
                .benchmark_return()
                .map_or_else(|| "n/a".to_string(), pct)
        );
        eprintln!("Sharpe Ratio:     {}", ratio(r.sharpe_ratio));
        eprintln!("Sortino Ratio:    {}", ratio(risk.sortino_ratio));
        eprintln!("Volatility:       {}", pct(risk.volatility));
        eprintln!("Max Drawdown:     {}", pct(risk.max_drawdown));
        eprintln!("Drawdown Bars:    {}", risk.max_drawdown_duration);
        eprintln!("Beta:             {}", ratio(risk.beta));
        eprintln!("Total Trades:     {}", t.total_trades);
        eprintln!("Win Rate:         {}", pct(t.win_rate));
        eprintln!("Profit Factor:    {:.2}", t.profit_factor);
        eprintln!(
            "PnL:              realized {:.2}, floating {:.2}, total {:.2}",
            r.realized_pnl, r.floating_pnl, r.total_pnl
        );
        eprintln!(
            "Position:         avg {:.1}, max {}, current {}",
            result.position_metrics.avg_position_size,
            result.position_metrics.max_position_size,
            result.position_metrics.current_position
        );
    }

    for failure in &report.failures {
        eprintln!("\nwarning: {} failed: {}", failure.symbol, failure.error);
    }

    let agg = &report.aggregate;
    eprintln!("\n=== Aggregate ({} symbols) ===", agg.symbol_count);
    eprintln!("Mean Return:      {}", pct(agg.mean_total_return));
    eprintln!("Mean Sharpe:      {}", ratio(agg.mean_sharpe));
    eprintln!("Worst Drawdown:   {}", pct(agg.worst_max_drawdown));
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checks = validate_backtest_config(&adapter)
        .and_then(|_| validate_symbols(&adapter))
        .and_then(|_| validate_strategy_config(&adapter))
        .and_then(|_| build_strategy(&adapter).map(|_| ()));

    match checks {
        Ok(()) => {
            eprintln!("Configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_symbols(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let data_port = CsvAdapter::new(data_path(&adapter));
    match data_port.list_symbols() {
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            eprintln!("{} symbols", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
