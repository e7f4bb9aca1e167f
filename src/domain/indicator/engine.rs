//! Candle augmentation: computes requested indicators and attaches them per bar.

use crate::domain::candle::Candle;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::pivot::calculate_pivot;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{
    DEFAULT_PIVOT_BLOCK, IndicatorKey, IndicatorKind, IndicatorSeries,
};
use std::collections::BTreeSet;

/// Computes one indicator series over the candles.
///
/// Returns `None` for kinds that are read directly off the candle or carried per bar.
pub fn compute_series(
    candles: &[Candle],
    key: IndicatorKey,
    pivot_block: usize,
) -> Option<IndicatorSeries> {
    let series = match key.kind {
        IndicatorKind::Sma | IndicatorKind::Ema | IndicatorKind::Rsi => {
            let Some(period) = key.period else {
                tracing::warn!(indicator = %key, "no period given; indicator undefined");
                return Some(IndicatorSeries::undefined(key, candles.len()));
            };
            if period == 0 || period > candles.len() {
                tracing::warn!(
                    indicator = %key,
                    bars = candles.len(),
                    "period out of range; indicator undefined"
                );
            }
            match key.kind {
                IndicatorKind::Sma => calculate_sma(candles, period, key.source),
                IndicatorKind::Ema => calculate_ema(candles, period, key.source),
                _ => calculate_rsi(candles, period, key.source),
            }
        }
        IndicatorKind::Pivot | IndicatorKind::TopCentral | IndicatorKind::BottomCentral => {
            calculate_pivot(candles, key, pivot_block)
        }
        _ => return None,
    };
    Some(series)
}

/// Returns a new series where every candle carries the requested indicators.
///
/// Candles must be sorted by date with no duplicates. Previous-bar high/low/close and the
/// correlated rate (when present) are attached to every bar regardless of `configs`.
pub fn augment_with_indicators(candles: &[Candle], configs: &[IndicatorKey]) -> Vec<Candle> {
    augment_with(candles, configs, DEFAULT_PIVOT_BLOCK)
}

/// As [`augment_with_indicators`], with an explicit default pivot block length.
pub fn augment_with(candles: &[Candle], configs: &[IndicatorKey], pivot_block: usize) -> Vec<Candle> {
    debug_assert!(
        candles.windows(2).all(|w| w[0].date < w[1].date),
        "candles must be strictly increasing by date"
    );

    let mut augmented: Vec<Candle> = candles.to_vec();
    attach_carried_fields(&mut augmented, candles);

    let unique: BTreeSet<IndicatorKey> = configs.iter().copied().collect();
    for key in unique {
        let Some(series) = compute_series(candles, key, pivot_block) else {
            continue;
        };
        for (candle, value) in augmented.iter_mut().zip(series.values) {
            if let Some(v) = value {
                candle.indicators.insert(series.key, v);
            }
        }
    }

    augmented
}

fn attach_carried_fields(augmented: &mut [Candle], source: &[Candle]) {
    let prev_high = IndicatorKey::plain(IndicatorKind::PrevHigh);
    let prev_low = IndicatorKey::plain(IndicatorKind::PrevLow);
    let prev_close = IndicatorKey::plain(IndicatorKind::PrevClose);
    let rate = IndicatorKey::plain(IndicatorKind::CorrelatedRate);

    for (i, candle) in augmented.iter_mut().enumerate() {
        // the first bar has no predecessor and falls back to itself
        let prev = if i == 0 { &source[0] } else { &source[i - 1] };
        candle.indicators.insert(prev_high, prev.high);
        candle.indicators.insert(prev_low, prev.low);
        candle.indicators.insert(prev_close, prev.close);
        if let Some(r) = candle.correlated_rate {
            candle.indicators.insert(rate, r);
        }
    }
}
