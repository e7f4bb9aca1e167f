//! Running equity, the open trade and the closed-trade log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::{ExitReason, Trade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Single-instrument book: at most one open trade.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub initial_equity: f64,
    /// Realized equity; moves only when a trade closes.
    pub equity: f64,
    pub open_trade: Option<Trade>,
    pub closed_trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_equity: f64) -> Self {
        Portfolio {
            initial_equity,
            equity: initial_equity,
            open_trade: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.open_trade.is_none()
    }

    /// Opens `trade` unless one is already open; returns whether it was taken.
    pub fn open(&mut self, trade: Trade) -> bool {
        if self.open_trade.is_some() {
            return false;
        }
        self.open_trade = Some(trade);
        true
    }

    /// Closes the open trade, books its profit and returns it.
    pub fn close(&mut self, date: NaiveDate, price: f64, reason: ExitReason) -> Option<&Trade> {
        let mut trade = self.open_trade.take()?;
        self.equity += trade.close(date, price, reason);
        self.closed_trades.push(trade);
        self.closed_trades.last()
    }

    pub fn record_equity(&mut self, date: NaiveDate) {
        self.equity_curve.push(EquityPoint {
            date,
            equity: self.equity,
        });
    }
}
