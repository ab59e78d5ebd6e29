//! Bar source port.

use crate::domain::error::BarsimError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` dated within `[start_date, end_date]`, ascending.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, BarsimError>;

    fn list_symbols(&self) -> Result<Vec<String>, BarsimError>;
}
