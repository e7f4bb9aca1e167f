//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (n price changes are needed for the first average).

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorKey, IndicatorKind, IndicatorSeries, PriceField};

pub fn calculate_rsi(candles: &[Candle], period: usize, source: PriceField) -> IndicatorSeries {
    let key = IndicatorKey::new(IndicatorKind::Rsi, Some(period), source);
    if period == 0 || period > candles.len() {
        return IndicatorSeries::undefined(key, candles.len());
    }

    let mut values = vec![None; candles.len()];
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..candles.len() {
        let change = candles[i].field(source) - candles[i - 1].field(source);
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period {
            avg_gain += gain;
            avg_loss += loss;
        } else if i == period {
            avg_gain = (avg_gain + gain) / period as f64;
            avg_loss = (avg_loss + loss) / period as f64;
            values[i] = Some(rsi_value(avg_gain, avg_loss));
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
            values[i] = Some(rsi_value(avg_gain, avg_loss));
        }
    }

    IndicatorSeries { key, values }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
}
