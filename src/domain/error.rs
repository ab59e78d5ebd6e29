//! Domain error types.

/// Top-level error type for barsim.
#[derive(Debug, thiserror::Error)]
pub enum BarsimError {
    #[error("bar and signal sequences differ in length: {bars} bars, {signals} signals")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("insufficient bars: have {bars}, need {minimum}")]
    InsufficientBars { bars: usize, minimum: usize },

    #[error("initial capital must be positive, got {capital}")]
    NonPositiveCapital { capital: f64 },

    #[error("commission rate must be in [0, 1), got {rate}")]
    InvalidCommission { rate: f64 },

    #[error("lot size must be at least 1, got {lot_size}")]
    InvalidLotSize { lot_size: u64 },

    #[error("timestamps must be strictly ascending (violated at bar {index})")]
    NonAscendingTimestamps { index: usize },

    #[error("close price at bar {index} must be finite and positive, got {close}")]
    InvalidPrice { index: usize, close: f64 },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BarsimError> for std::process::ExitCode {
    fn from(err: &BarsimError) -> Self {
        let code: u8 = match err {
            BarsimError::Io(_) => 1,
            BarsimError::ConfigParse { .. }
            | BarsimError::ConfigMissing { .. }
            | BarsimError::ConfigInvalid { .. } => 2,
            BarsimError::DataSource { .. } => 3,
            BarsimError::NoData { .. } => 5,
            _ => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_transparently() {
        let err: BarsimError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, BarsimError::Io(_)));
        assert_eq!(err.to_string(), "denied");
    }

    #[test]
    fn display_includes_values() {
        let err = BarsimError::LengthMismatch { bars: 5, signals: 4 };
        assert_eq!(
            err.to_string(),
            "bar and signal sequences differ in length: 5 bars, 4 signals"
        );

        let err = BarsimError::ConfigInvalid {
            section: "backtest".into(),
            key: "lot_size".into(),
            reason: "lot_size must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [backtest] lot_size: lot_size must be at least 1"
        );
    }
}
