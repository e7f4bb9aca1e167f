//! Daily OHLCV candle with attached indicator values.

use crate::domain::error::StratlabError;
use crate::domain::indicator::{IndicatorKey, PriceField};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlated_rate: Option<f64>,
    /// Computed values keyed by indicator; a missing key means undefined at this bar.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub indicators: BTreeMap<IndicatorKey, f64>,
}

impl Candle {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            date,
            open,
            high,
            low,
            close,
            volume,
            correlated_rate: None,
            indicators: BTreeMap::new(),
        }
    }

    pub fn with_correlated_rate(mut self, rate: f64) -> Self {
        self.correlated_rate = Some(rate);
        self
    }

    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }

    pub fn indicator(&self, key: &IndicatorKey) -> Option<f64> {
        self.indicators.get(key).copied()
    }
}

/// Checks that dates are strictly increasing (sorted, no duplicates).
pub fn validate_series(candles: &[Candle]) -> Result<(), StratlabError> {
    for pair in candles.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(StratlabError::UnsortedCandles { date: pair[1].date });
        }
    }
    Ok(())
}
