//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n values at index n-1,
//! then EMA[i] = P[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorKey, IndicatorKind, IndicatorSeries, PriceField};

pub fn calculate_ema(candles: &[Candle], period: usize, source: PriceField) -> IndicatorSeries {
    let key = IndicatorKey::new(IndicatorKind::Ema, Some(period), source);
    if period == 0 || period > candles.len() {
        return IndicatorSeries::undefined(key, candles.len());
    }

    let mut values = Vec::with_capacity(candles.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        let price = candle.field(source);
        if i < period - 1 {
            sum += price;
            values.push(None);
        } else if i == period - 1 {
            sum += price;
            ema = sum / period as f64;
            values.push(Some(ema));
        } else {
            ema = price * k + ema * (1.0 - k);
            values.push(Some(ema));
        }
    }

    IndicatorSeries { key, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_candles(prices: &[f64]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new(
                    start + chrono::Duration::days(i as i64),
                    close,
                    close,
                    close,
                    close,
                    1000.0,
                )
            })
            .collect()
    }

    fn value(series: &IndicatorSeries, i: usize) -> f64 {
        series.values[i].expect("defined")
    }

    #[test]
    fn ema_warmup() {
        let candles = make_candles(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&candles, 3, PriceField::Close);

        assert!(series.values[0].is_none());
        assert!(series.values[1].is_none());
        assert!(series.values[2].is_some());
        assert!(series.values[3].is_some());
        assert!(series.values[4].is_some());
    }

    #[test]
    fn ema_period_1() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 1, PriceField::Close);

        assert!((value(&series, 0) - 10.0).abs() < f64::EPSILON);
        assert!((value(&series, 1) - 20.0).abs() < f64::EPSILON);
        assert!((value(&series, 2) - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_seed_is_sma() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 3, PriceField::Close);

        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((value(&series, 2) - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let candles = make_candles(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&candles, 3, PriceField::Close);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((value(&series, 3) - ema_3).abs() < f64::EPSILON);
        assert!((value(&series, 4) - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let candles = make_candles(&[100.0; 5]);
        let series = calculate_ema(&candles, 3, PriceField::Close);

        for i in 2..5 {
            assert!((value(&series, i) - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_converges_to_constant_after_level_shift() {
        let mut prices = vec![50.0; 10];
        prices.extend(std::iter::repeat(100.0).take(200));
        let candles = make_candles(&prices);
        let series = calculate_ema(&candles, 10, PriceField::Close);

        let last = value(&series, prices.len() - 1);
        assert!((last - 100.0).abs() < 1e-6);
    }

    #[test]
    fn ema_key() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 5, PriceField::Close);

        assert_eq!(series.key, IndicatorKey::computed(IndicatorKind::Ema, 5));
        assert_eq!(series.values, vec![None, None, None]);
    }

    #[test]
    fn ema_empty() {
        let series = calculate_ema(&[], 3, PriceField::Close);
        assert!(series.values.is_empty());
    }

    #[test]
    fn ema_period_0() {
        let candles = make_candles(&[10.0, 20.0]);
        let series = calculate_ema(&candles, 0, PriceField::Close);
        assert_eq!(series.values, vec![None, None]);
    }

    #[test]
    fn ema_smoothing_factor() {
        let period = 10;
        let k = 2.0 / (period as f64 + 1.0);
        assert!((k - 2.0 / 11.0).abs() < f64::EPSILON);
    }
}
