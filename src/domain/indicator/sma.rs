//! Simple Moving Average.
//!
//! SMA(n)[i] = mean of the n source values ending at i, kept as a running window sum.
//! Warmup: first (n-1) bars are undefined.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorKey, IndicatorKind, IndicatorSeries, PriceField};

pub fn calculate_sma(candles: &[Candle], period: usize, source: PriceField) -> IndicatorSeries {
    let key = IndicatorKey::new(IndicatorKind::Sma, Some(period), source);
    if period == 0 || period > candles.len() {
        return IndicatorSeries::undefined(key, candles.len());
    }

    let mut values = Vec::with_capacity(candles.len());
    let mut window_sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        window_sum += candle.field(source);
        if i >= period {
            window_sum -= candles[i - period].field(source);
        }

        if i + 1 >= period {
            values.push(Some(window_sum / period as f64));
        } else {
            values.push(None);
        }
    }

    IndicatorSeries { key, values }
}
