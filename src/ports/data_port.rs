//! Data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::StratlabError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Candles for `symbol` sorted ascending by date, limited to the inclusive range.
    fn fetch_candles(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, StratlabError>;
}
