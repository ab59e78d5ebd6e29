//! Technical indicators over closing-price series.
//!
//! Every function returns one value per input close, so the output can be
//! indexed with the same position as the bar it was computed from:
//! - `sma`: rolling mean, partial windows allowed at the start
//! - `ema`: exponential moving average seeded at the first close
//! - `macd`: line and signal built from two EMAs

pub mod ema;
pub mod macd;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use sma::calculate_sma;
