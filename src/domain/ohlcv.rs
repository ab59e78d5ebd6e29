//! OHLCV bar representation.

use chrono::NaiveDateTime;

/// One historical price bar. Only `close` drives the simulation; the other
/// fields are carried through for adapters and signal producers.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// Bar whose OHLC are all `close`. Used for close-only series.
    pub fn from_close(timestamp: NaiveDateTime, close: f64) -> Self {
        Bar {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Closing prices of a bar slice, in order.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
