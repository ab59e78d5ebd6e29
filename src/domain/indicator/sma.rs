//! Simple Moving Average.
//!
//! SMA[i] = mean(C[max(0, i-n+1)..=i]); the first n-1 values average over the
//! closes available so far instead of being left undefined.
//!
//! A window of identical closes yields that close exactly, so two averages
//! over a flat stretch compare equal regardless of running-sum drift.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(closes.len());
    let mut sum = 0.0;
    // consecutive closes equal to the current one, current included
    let mut run = 0usize;

    for (i, &close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }
        run = if i > 0 && closes[i - 1] == close { run + 1 } else { 1 };

        let window = (i + 1).min(period);
        if run >= window {
            values.push(close);
        } else {
            values.push(sum / window as f64);
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_partial_windows() {
        let values = calculate_sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert!((values[0] - 10.0).abs() < f64::EPSILON);
        assert!((values[1] - 15.0).abs() < f64::EPSILON);
        assert!((values[2] - 20.0).abs() < f64::EPSILON);
        assert!((values[3] - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_period_1_is_identity() {
        let closes = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(calculate_sma(&closes, 1), closes.to_vec());
    }

    #[test]
    fn sma_period_longer_than_series() {
        let values = calculate_sma(&[2.0, 4.0], 10);
        assert!((values[1] - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_flat_window_is_exact() {
        let mut closes: Vec<f64> = (0..120).map(|i| 1.0 + i as f64 * 0.05).collect();
        closes.extend(std::iter::repeat_n(7.3, 80));

        let short = calculate_sma(&closes, 3);
        let long = calculate_sma(&closes, 7);
        for i in 126..closes.len() {
            assert_eq!(short[i], 7.3, "short SMA drifted at {}", i);
            assert_eq!(long[i], 7.3, "long SMA drifted at {}", i);
        }
    }

    #[test]
    fn sma_constant_series_is_exact() {
        let values = calculate_sma(&[0.1; 50], 7);
        assert!(values.iter().all(|&v| v == 0.1));
    }

    #[test]
    fn sma_empty_and_zero_period() {
        assert!(calculate_sma(&[], 5).is_empty());
        assert!(calculate_sma(&[1.0, 2.0], 0).is_empty());
    }
}
