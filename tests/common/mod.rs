#![allow(dead_code)]

use barsim::domain::backtest::BacktestConfig;
use barsim::domain::error::BarsimError;
pub use barsim::domain::ohlcv::Bar;
pub use barsim::domain::signal::Signal;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

use barsim::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, BarsimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BarsimError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).ok_or_else(|| BarsimError::NoData {
            symbol: symbol.to_string(),
        })?;
        Ok(bars
            .iter()
            .filter(|b| {
                let d = b.timestamp.date();
                d >= start_date && d <= end_date
            })
            .cloned()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, BarsimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(offset: i64) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + Duration::days(offset)
}

/// Daily bars from 2024-01-01 with the given closes.
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::from_close(day(i as i64), c))
        .collect()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital: 100_000.0,
        commission_rate: 0.0,
        lot_size: 1,
        risk_free_rate: 0.02,
    }
}

/// Closes that rise, fall, then rise again; enough bars for short MA windows
/// to cross a few times.
pub fn wave_closes(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 100.0 + 10.0 * ((i as f64) / 6.0).sin() + i as f64 * 0.1)
        .collect()
}
