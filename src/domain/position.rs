//! Open long position tracking.

/// The single long position the simulator may hold for a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub quantity: u64,
    pub entry_price: f64,
}

impl OpenPosition {
    /// Mark-to-market pnl, ignoring commissions on either side.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity as f64
    }

    pub fn lots(&self, lot_size: u64) -> u64 {
        self.quantity / lot_size
    }
}
