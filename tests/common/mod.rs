#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use stratlab::domain::candle::Candle;
use stratlab::domain::error::StratlabError;
use stratlab::domain::indicator::IndicatorKind;
use stratlab::domain::rule::{
    Comparator, Condition, IndicatorReference, LogicGroup, LogicNode, Operand,
};
use stratlab::domain::strategy::Strategy;
use stratlab::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, StratlabError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratlabError::Data {
                reason: reason.clone(),
            });
        }
        let candles: Vec<Candle> = self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|c| start_date.is_none_or(|s| c.date >= s))
            .filter(|c| end_date.is_none_or(|e| c.date <= e))
            .collect();
        if candles.is_empty() {
            return Err(StratlabError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(candles)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One candle per day from 2024-01-01 with open == close and a one-unit high/low range.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Candle::new(
                start + chrono::Duration::days(i as i64),
                c,
                c + 0.5,
                c - 0.5,
                c,
                1_000.0,
            )
        })
        .collect()
}

/// Zero-volatility series: every field equals `price`.
pub fn flat_candles(count: usize, price: f64) -> Vec<Candle> {
    let start = date(2024, 1, 1);
    (0..count)
        .map(|i| {
            Candle::new(
                start + chrono::Duration::days(i as i64),
                price,
                price,
                price,
                price,
                1_000.0,
            )
        })
        .collect()
}

/// 20 bars where RSI(2) drops to 27.3 at bar 5 with the close above EMA(6), then
/// climbs past 70 for the first time while long at bar 15.
pub const OSCILLATOR_CLOSES: [f64; 20] = [
    100.0, 100.0, 130.0, 130.0, 130.0, 120.0, 121.0, 120.0, 121.0, 120.0, 121.0, 120.0,
    121.0, 120.0, 121.0, 132.0, 133.0, 134.0, 135.0, 136.0,
];

pub fn close() -> IndicatorReference {
    IndicatorReference::price(IndicatorKind::Close)
}

pub fn rsi(period: usize) -> IndicatorReference {
    IndicatorReference::with_period(IndicatorKind::Rsi, period)
}

pub fn ema(period: usize) -> IndicatorReference {
    IndicatorReference::with_period(IndicatorKind::Ema, period)
}

pub fn sma(period: usize) -> IndicatorReference {
    IndicatorReference::with_period(IndicatorKind::Sma, period)
}

pub fn cond(id: &str, left: IndicatorReference, comparator: Comparator, right: Operand) -> LogicNode {
    Condition {
        id: id.to_string(),
        left,
        comparator,
        right,
    }
    .into()
}

pub fn value(v: f64) -> Operand {
    Operand::Value(v)
}

pub fn indicator(r: IndicatorReference) -> Operand {
    Operand::Indicator(r)
}

pub fn make_strategy(entry: LogicGroup, exit: LogicGroup) -> Strategy {
    Strategy {
        id: "test".into(),
        name: "Test".into(),
        symbol: "TEST".into(),
        entry,
        exit,
        stop_loss_pct: 0.0,
        take_profit_pct: 0.0,
    }
}

/// Entry: RSI(2) < 30 AND CLOSE > EMA(6). Exit: RSI(2) > 70.
pub fn oscillator_strategy(stop_loss_pct: f64) -> Strategy {
    let mut strategy = make_strategy(
        LogicGroup::and(
            "entry",
            vec![
                cond("oversold", rsi(2), Comparator::LessThan, value(30.0)),
                cond("uptrend", close(), Comparator::GreaterThan, indicator(ema(6))),
            ],
        ),
        LogicGroup::or(
            "exit",
            vec![cond("overbought", rsi(2), Comparator::GreaterThan, value(70.0))],
        ),
    );
    strategy.id = "rsi-pullback".into();
    strategy.stop_loss_pct = stop_loss_pct;
    strategy
}

/// Close crossing above/below a fixed SMA; trades whenever price moves.
pub fn crossover_strategy() -> Strategy {
    make_strategy(
        LogicGroup::and(
            "entry",
            vec![cond("up", close(), Comparator::CrossesAbove, indicator(sma(5)))],
        ),
        LogicGroup::or(
            "exit",
            vec![cond("down", close(), Comparator::CrossesBelow, indicator(sma(5)))],
        ),
    )
}

/// Deterministic pseudo-random walk.
pub fn walk_closes(count: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut price = 100.0;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let step = ((state >> 33) % 2001) as f64 / 1000.0 - 1.0;
            price = (price + step * 2.0).max(1.0);
            price
        })
        .collect()
}
