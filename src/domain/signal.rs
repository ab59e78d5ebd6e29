//! Discrete trading signals and the producer contract.

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

/// Produces one signal per bar, aligned index-for-index with the input.
///
/// Implementations are shared across parallel per-symbol runs, so they must be
/// stateless with respect to `generate_signals`.
pub trait SignalProducer: Send + Sync {
    fn generate_signals(&self, bars: &[Bar]) -> Vec<Signal>;

    fn name(&self) -> &str {
        "custom"
    }

    /// Number of leading bars the producer needs before its signals settle.
    fn warmup_bars(&self) -> usize {
        0
    }
}

/// Replays a fixed signal sequence regardless of the bars given.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSignals {
    signals: Vec<Signal>,
}

impl ScriptedSignals {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self { signals }
    }
}

impl SignalProducer for ScriptedSignals {
    fn generate_signals(&self, _bars: &[Bar]) -> Vec<Signal> {
        self.signals.clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
