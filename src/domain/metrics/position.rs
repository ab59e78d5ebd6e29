//! Exposure over the state series.

use crate::domain::portfolio::PortfolioState;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionMetrics {
    /// Mean position over every bar, flat bars included.
    pub avg_position_size: f64,
    pub max_position_size: u64,
    pub current_position: u64,
}

impl PositionMetrics {
    pub fn compute(states: &[PortfolioState]) -> Self {
        let avg_position_size = if states.is_empty() {
            0.0
        } else {
            states.iter().map(|s| s.position as f64).sum::<f64>() / states.len() as f64
        };

        PositionMetrics {
            avg_position_size,
            max_position_size: states.iter().map(|s| s.position).max().unwrap_or(0),
            current_position: states.last().map_or(0, |s| s.position),
        }
    }
}
