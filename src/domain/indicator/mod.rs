//! Technical indicator identities and series.
//!
//! - `IndicatorKind`: what an indicator reference points at (price field, computed indicator,
//!   pivot level, carried-forward field)
//! - `IndicatorKey`: kind + period + source, the deterministic key under which values are
//!   attached to a candle
//! - `IndicatorSeries`: one value per bar, `None` while warming up
//!
//! The calculators live in the submodules; [`engine`] ties them together.

pub mod ema;
pub mod engine;
pub mod pivot;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PIVOT_BLOCK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub fn name(self) -> &'static str {
        match self {
            PriceField::Open => "OPEN",
            PriceField::High => "HIGH",
            PriceField::Low => "LOW",
            PriceField::Close => "CLOSE",
            PriceField::Volume => "VOLUME",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "OPEN" => Some(PriceField::Open),
            "HIGH" => Some(PriceField::High),
            "LOW" => Some(PriceField::Low),
            "CLOSE" => Some(PriceField::Close),
            "VOLUME" => Some(PriceField::Volume),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorKind {
    Open,
    High,
    Low,
    Close,
    Volume,
    /// Price field selected by the reference's `source`.
    Price,
    Sma,
    Ema,
    Rsi,
    Pivot,
    #[serde(rename = "TC")]
    TopCentral,
    #[serde(rename = "BC")]
    BottomCentral,
    PrevHigh,
    PrevLow,
    PrevClose,
    CorrelatedRate,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 16] = [
        IndicatorKind::Open,
        IndicatorKind::High,
        IndicatorKind::Low,
        IndicatorKind::Close,
        IndicatorKind::Volume,
        IndicatorKind::Price,
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Rsi,
        IndicatorKind::Pivot,
        IndicatorKind::TopCentral,
        IndicatorKind::BottomCentral,
        IndicatorKind::PrevHigh,
        IndicatorKind::PrevLow,
        IndicatorKind::PrevClose,
        IndicatorKind::CorrelatedRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndicatorKind::Open => "OPEN",
            IndicatorKind::High => "HIGH",
            IndicatorKind::Low => "LOW",
            IndicatorKind::Close => "CLOSE",
            IndicatorKind::Volume => "VOLUME",
            IndicatorKind::Price => "PRICE",
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Pivot => "PIVOT",
            IndicatorKind::TopCentral => "TC",
            IndicatorKind::BottomCentral => "BC",
            IndicatorKind::PrevHigh => "PREV_HIGH",
            IndicatorKind::PrevLow => "PREV_LOW",
            IndicatorKind::PrevClose => "PREV_CLOSE",
            IndicatorKind::CorrelatedRate => "CORRELATED_RATE",
        }
    }

    /// Read straight off the candle, never precomputed.
    pub fn is_price_field(self) -> bool {
        matches!(
            self,
            IndicatorKind::Open
                | IndicatorKind::High
                | IndicatorKind::Low
                | IndicatorKind::Close
                | IndicatorKind::Volume
                | IndicatorKind::Price
        )
    }

    /// Needs a lookback period to be defined at all.
    pub fn requires_period(self) -> bool {
        matches!(
            self,
            IndicatorKind::Sma | IndicatorKind::Ema | IndicatorKind::Rsi
        )
    }

    pub fn is_pivot_level(self) -> bool {
        matches!(
            self,
            IndicatorKind::Pivot | IndicatorKind::TopCentral | IndicatorKind::BottomCentral
        )
    }

    /// Attached to every bar regardless of what a strategy asks for.
    pub fn is_carried(self) -> bool {
        matches!(
            self,
            IndicatorKind::PrevHigh
                | IndicatorKind::PrevLow
                | IndicatorKind::PrevClose
                | IndicatorKind::CorrelatedRate
        )
    }
}

/// Identity of a stored indicator value.
///
/// Displays as `KIND_PERIOD` with a `_SOURCE` suffix for non-close inputs:
/// `SMA_20`, `EMA_10_HIGH`, `PIVOT_5`, `PIVOT`, `PREV_CLOSE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct IndicatorKey {
    pub kind: IndicatorKind,
    pub period: Option<usize>,
    pub source: PriceField,
}

impl IndicatorKey {
    pub fn new(kind: IndicatorKind, period: Option<usize>, source: PriceField) -> Self {
        // period and source only distinguish values for kinds that use them
        let period = if kind.requires_period() || kind.is_pivot_level() {
            period
        } else {
            None
        };
        let source = if kind.requires_period() || kind == IndicatorKind::Price {
            source
        } else {
            PriceField::Close
        };
        IndicatorKey {
            kind,
            period,
            source,
        }
    }

    pub fn computed(kind: IndicatorKind, period: usize) -> Self {
        Self::new(kind, Some(period), PriceField::Close)
    }

    pub fn plain(kind: IndicatorKind) -> Self {
        Self::new(kind, None, PriceField::Close)
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.name())?;
        if let Some(period) = self.period {
            write!(f, "_{}", period)?;
        }
        if self.source != PriceField::Close {
            write!(f, "_{}", self.source.name())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator key '{0}'")]
pub struct ParseKeyError(pub String);

impl FromStr for IndicatorKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        // longest names first so a shorter name never shadows a longer one
        let mut kinds = IndicatorKind::ALL;
        kinds.sort_by_key(|k| std::cmp::Reverse(k.name().len()));

        for kind in kinds {
            let Some(rest) = upper.strip_prefix(kind.name()) else {
                continue;
            };
            if rest.is_empty() {
                return Ok(IndicatorKey::plain(kind));
            }
            let Some(rest) = rest.strip_prefix('_') else {
                continue;
            };
            let mut parts = rest.split('_');
            let mut period = None;
            let mut source = PriceField::Close;
            if let Some(first) = parts.next() {
                match first.parse::<usize>() {
                    Ok(p) => period = Some(p),
                    Err(_) => match PriceField::from_name(first) {
                        Some(field) => source = field,
                        None => continue,
                    },
                }
            }
            if let Some(second) = parts.next() {
                match PriceField::from_name(second) {
                    Some(field) => source = field,
                    None => continue,
                }
            }
            if parts.next().is_some() {
                continue;
            }
            return Ok(IndicatorKey::new(kind, period, source));
        }
        Err(ParseKeyError(s.to_string()))
    }
}

impl From<IndicatorKey> for String {
    fn from(key: IndicatorKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for IndicatorKey {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One value per bar; `None` during warm-up or when the indicator is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub key: IndicatorKey,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn undefined(key: IndicatorKey, len: usize) -> Self {
        IndicatorSeries {
            key,
            values: vec![None; len],
        }
    }
}
