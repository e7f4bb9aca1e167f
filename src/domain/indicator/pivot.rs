//! Central pivot range (CPR) over fixed-size bar blocks.
//!
//! Candles are split into consecutive blocks of `block` bars (not calendar weeks). Every bar in
//! block b uses block b-1's high (max), low (min) and close (last):
//!
//! - pivot = (H + L + C) / 3
//! - bottom central (BC) = (H + L) / 2
//! - top central (TC) = 2 * pivot - BC
//!
//! The first block has no predecessor, so all three levels fall back to the bar's own close.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorKey, IndicatorKind, IndicatorSeries};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotLevels {
    pub pivot: f64,
    pub top: f64,
    pub bottom: f64,
}

impl PivotLevels {
    pub fn from_hlc(high: f64, low: f64, close: f64) -> Self {
        let pivot = (high + low + close) / 3.0;
        let bottom = (high + low) / 2.0;
        PivotLevels {
            pivot,
            top: 2.0 * pivot - bottom,
            bottom,
        }
    }

    fn flat(price: f64) -> Self {
        PivotLevels {
            pivot: price,
            top: price,
            bottom: price,
        }
    }

    pub fn get(&self, kind: IndicatorKind) -> Option<f64> {
        match kind {
            IndicatorKind::Pivot => Some(self.pivot),
            IndicatorKind::TopCentral => Some(self.top),
            IndicatorKind::BottomCentral => Some(self.bottom),
            _ => None,
        }
    }
}

/// Per-bar pivot levels; empty when `block` is zero.
pub fn calculate_levels(candles: &[Candle], block: usize) -> Vec<PivotLevels> {
    if block == 0 {
        return Vec::new();
    }

    let mut levels = Vec::with_capacity(candles.len());
    let mut previous: Option<PivotLevels> = None;

    for chunk in candles.chunks(block) {
        for candle in chunk {
            levels.push(previous.unwrap_or_else(|| PivotLevels::flat(candle.close)));
        }

        let high = chunk.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let low = chunk.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        // chunks() never yields an empty slice
        let close = chunk[chunk.len() - 1].close;
        previous = Some(PivotLevels::from_hlc(high, low, close));
    }

    levels
}

/// Series for one pivot level. `key.period` overrides the default block length.
pub fn calculate_pivot(candles: &[Candle], key: IndicatorKey, default_block: usize) -> IndicatorSeries {
    let block = key.period.unwrap_or(default_block);
    if block == 0 || !key.kind.is_pivot_level() {
        return IndicatorSeries::undefined(key, candles.len());
    }

    let values = calculate_levels(candles, block)
        .iter()
        .map(|levels| levels.get(key.kind))
        .collect();

    IndicatorSeries { key, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_candle(day: u32, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            high,
            low,
            close,
            1000.0,
        )
    }

    fn sample() -> Vec<Candle> {
        vec![
            make_candle(1, 105.0, 95.0, 100.0),
            make_candle(2, 110.0, 98.0, 108.0),
            make_candle(3, 112.0, 104.0, 106.0),
            make_candle(4, 109.0, 101.0, 103.0),
            make_candle(5, 107.0, 99.0, 104.0),
        ]
    }

    #[test]
    fn first_block_falls_back_to_close() {
        let levels = calculate_levels(&sample(), 2);

        assert_eq!(levels[0], PivotLevels::flat(100.0));
        assert_eq!(levels[1], PivotLevels::flat(108.0));
    }

    #[test]
    fn later_blocks_use_previous_block() {
        let levels = calculate_levels(&sample(), 2);

        // block 0: H=110, L=95, C=108
        let expected = PivotLevels::from_hlc(110.0, 95.0, 108.0);
        assert_eq!(levels[2], expected);
        assert_eq!(levels[3], expected);

        // block 1: H=112, L=101, C=103
        let expected = PivotLevels::from_hlc(112.0, 101.0, 103.0);
        assert_eq!(levels[4], expected);
    }

    #[test]
    fn level_formulas() {
        let levels = PivotLevels::from_hlc(110.0, 90.0, 100.0);
        assert!((levels.pivot - 100.0).abs() < 1e-9);
        assert!((levels.bottom - 100.0).abs() < 1e-9);
        assert!((levels.top - 100.0).abs() < 1e-9);

        let levels = PivotLevels::from_hlc(120.0, 90.0, 114.0);
        assert!((levels.pivot - 108.0).abs() < 1e-9);
        assert!((levels.bottom - 105.0).abs() < 1e-9);
        assert!((levels.top - 111.0).abs() < 1e-9);
    }

    #[test]
    fn top_and_bottom_symmetric_about_pivot() {
        for l in calculate_levels(&sample(), 2) {
            assert!(((l.top - l.pivot) - (l.pivot - l.bottom)).abs() < 1e-9);
        }
    }

    #[test]
    fn pivot_series_uses_default_block() {
        let key = IndicatorKey::plain(IndicatorKind::Pivot);
        let series = calculate_pivot(&sample(), key, 2);

        assert_eq!(series.values.len(), 5);
        assert_eq!(series.values[0], Some(100.0));
        let expected = (110.0 + 95.0 + 108.0) / 3.0;
        assert!((series.values[2].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn pivot_series_period_overrides_block() {
        let key = IndicatorKey::computed(IndicatorKind::BottomCentral, 3);
        let series = calculate_pivot(&sample(), key, 2);

        // block 0 (bars 0..3): H=112, L=95
        assert_eq!(series.values[2], Some(106.0));
        assert!((series.values[3].unwrap() - (112.0 + 95.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_block_is_undefined() {
        let key = IndicatorKey::computed(IndicatorKind::Pivot, 0);
        let series = calculate_pivot(&sample(), key, 5);
        assert!(series.values.iter().all(Option::is_none));
    }
}
