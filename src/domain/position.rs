//! Trade records and their risk levels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative slack when comparing a bar extreme to a stop/target level.
const LEVEL_TOLERANCE: f64 = 1e-9;

fn at_or_below(price: f64, level: f64) -> bool {
    price <= level + level.abs() * LEVEL_TOLERANCE
}

fn at_or_above(price: f64, level: f64) -> bool {
    price >= level - level.abs() * LEVEL_TOLERANCE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop-loss",
            ExitReason::TakeProfit => "take-profit",
            ExitReason::Signal => "signal",
            ExitReason::EndOfData => "end-of-data",
        };
        f.write_str(s)
    }
}

/// One round trip. Created open, closed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: f64,
    pub position_type: PositionType,
    pub status: TradeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub exit_date: Option<NaiveDate>,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub exit_reason: Option<ExitReason>,
    /// Realized profit, set on close.
    #[serde(default)]
    pub profit: Option<f64>,
    /// Realized profit as a percentage of the entry price.
    #[serde(default)]
    pub profit_pct: Option<f64>,
}

impl Trade {
    /// Opens a long trade. Percentages of zero (or below) leave the level unset.
    pub fn open_long(
        date: NaiveDate,
        price: f64,
        quantity: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Self {
        let stop_price = (stop_loss_pct > 0.0).then(|| price * (1.0 - stop_loss_pct / 100.0));
        let target_price = (take_profit_pct > 0.0).then(|| price * (1.0 + take_profit_pct / 100.0));
        Trade {
            entry_date: date,
            entry_price: price,
            quantity,
            position_type: PositionType::Long,
            status: TradeStatus::Open,
            stop_price,
            target_price,
            exit_date: None,
            exit_price: None,
            exit_reason: None,
            profit: None,
            profit_pct: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    fn direction(&self) -> f64 {
        match self.position_type {
            PositionType::Long => 1.0,
            PositionType::Short => -1.0,
        }
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.direction() * self.quantity * (price - self.entry_price)
    }

    /// Whether the bar's adverse extreme reached the stop.
    pub fn stop_hit(&self, low: f64, high: f64) -> bool {
        match (self.stop_price, self.position_type) {
            (Some(stop), PositionType::Long) => at_or_below(low, stop),
            (Some(stop), PositionType::Short) => at_or_above(high, stop),
            (None, _) => false,
        }
    }

    /// Whether the bar's favourable extreme reached the target.
    pub fn target_hit(&self, low: f64, high: f64) -> bool {
        match (self.target_price, self.position_type) {
            (Some(target), PositionType::Long) => at_or_above(high, target),
            (Some(target), PositionType::Short) => at_or_below(low, target),
            (None, _) => false,
        }
    }

    /// Closes the trade and returns the realized profit. Closing twice is a no-op returning 0.
    pub fn close(&mut self, date: NaiveDate, price: f64, reason: ExitReason) -> f64 {
        if !self.is_open() {
            return 0.0;
        }
        let profit = self.unrealized_pnl(price);
        self.status = TradeStatus::Closed;
        self.exit_date = Some(date);
        self.exit_price = Some(price);
        self.exit_reason = Some(reason);
        self.profit = Some(profit);
        self.profit_pct = Some(if self.entry_price != 0.0 {
            profit / (self.quantity * self.entry_price) * 100.0
        } else {
            0.0
        });
        profit
    }

    pub fn is_win(&self) -> bool {
        self.profit.is_some_and(|p| p > 0.0)
    }

    /// Calendar days from entry to exit; `None` while open.
    pub fn holding_days(&self) -> Option<i64> {
        self.exit_date.map(|exit| (exit - self.entry_date).num_days())
    }
}
