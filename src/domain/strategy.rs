//! Signal-generating strategies.

use crate::domain::error::BarsimError;
use crate::domain::indicator::{calculate_macd, calculate_sma};
use crate::domain::ohlcv::{closes, Bar};
use crate::domain::signal::{Signal, SignalProducer};

/// Buy while the short SMA is above the long SMA, sell while it is below.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageCross {
    short_window: usize,
    long_window: usize,
}

impl MovingAverageCross {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, BarsimError> {
        if short_window == 0 || long_window == 0 {
            return Err(invalid("short_window", "windows must be positive"));
        }
        if short_window >= long_window {
            return Err(invalid(
                "short_window",
                &format!(
                    "short window ({}) must be less than long window ({})",
                    short_window, long_window
                ),
            ));
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }
}

impl SignalProducer for MovingAverageCross {
    fn generate_signals(&self, bars: &[Bar]) -> Vec<Signal> {
        let closes = closes(bars);
        let short = calculate_sma(&closes, self.short_window);
        let long = calculate_sma(&closes, self.long_window);
        compare(&short, &long)
    }

    fn name(&self) -> &str {
        "MovingAverageCross"
    }

    fn warmup_bars(&self) -> usize {
        self.long_window - 1
    }
}

/// Buy while the MACD line is above its signal line, sell while it is below.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdCross {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl MacdCross {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, BarsimError> {
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(invalid("fast_period", "periods must be positive"));
        }
        if fast >= slow {
            return Err(invalid(
                "fast_period",
                &format!(
                    "fast period ({}) must be less than slow period ({})",
                    fast, slow
                ),
            ));
        }
        Ok(Self { fast, slow, signal })
    }
}

impl SignalProducer for MacdCross {
    fn generate_signals(&self, bars: &[Bar]) -> Vec<Signal> {
        let macd = calculate_macd(&closes(bars), self.fast, self.slow, self.signal);
        compare(&macd.line, &macd.signal)
    }

    fn name(&self) -> &str {
        "MacdCross"
    }

    fn warmup_bars(&self) -> usize {
        self.slow - 1 + self.signal - 1
    }
}

fn compare(upper: &[f64], lower: &[f64]) -> Vec<Signal> {
    upper
        .iter()
        .zip(lower)
        .map(|(u, l)| {
            if u > l {
                Signal::Buy
            } else if u < l {
                Signal::Sell
            } else {
                Signal::Hold
            }
        })
        .collect()
}

fn invalid(key: &str, reason: &str) -> BarsimError {
    BarsimError::ConfigInvalid {
        section: "strategy".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
