//! Fill simulation for entries and exits.
//!
//! Entries fill at the bar's close. An open trade exits on the first of, in order:
//!
//! 1. stop-loss: bar low at or below the stop, filled at the stop price
//! 2. take-profit: bar high at or above the target, filled at the target price
//! 3. exit signal: filled at the bar's close
//!
//! When one bar spans both levels the stop wins.

use super::candle::Candle;
use super::portfolio::Portfolio;
use super::position::{ExitReason, Trade};

/// Risk and sizing inputs for an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionParams {
    pub quantity: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        ExecutionParams {
            quantity: 1.0,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
        }
    }
}

/// Opens a long trade at the candle's close. Returns `false` if already in a position.
pub fn enter_long(portfolio: &mut Portfolio, candle: &Candle, params: &ExecutionParams) -> bool {
    let trade = Trade::open_long(
        candle.date,
        candle.close,
        params.quantity,
        params.stop_loss_pct,
        params.take_profit_pct,
    );
    portfolio.open(trade)
}

/// Decides whether `trade` exits on `candle`, and at what price.
pub fn check_exit(trade: &Trade, candle: &Candle, exit_signal: bool) -> Option<(ExitReason, f64)> {
    if trade.stop_hit(candle.low, candle.high) {
        if let Some(stop) = trade.stop_price {
            return Some((ExitReason::StopLoss, stop));
        }
    }
    if trade.target_hit(candle.low, candle.high) {
        if let Some(target) = trade.target_price {
            return Some((ExitReason::TakeProfit, target));
        }
    }
    exit_signal.then_some((ExitReason::Signal, candle.close))
}

/// Applies [`check_exit`] to the portfolio's open trade; returns the reason if it closed.
pub fn process_exit(portfolio: &mut Portfolio, candle: &Candle, exit_signal: bool) -> Option<ExitReason> {
    let (reason, price) = check_exit(portfolio.open_trade.as_ref()?, candle, exit_signal)?;
    portfolio.close(candle.date, price, reason);
    Some(reason)
}

/// Closes whatever is still open at the candle's close.
pub fn force_close(portfolio: &mut Portfolio, candle: &Candle) -> bool {
    portfolio
        .close(candle.date, candle.close, ExitReason::EndOfData)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, low: f64, high: f64, close: f64) -> Candle {
        Candle::new(
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            close,
            high,
            low,
            close,
            1000.0,
        )
    }

    fn params(stop: f64, target: f64) -> ExecutionParams {
        ExecutionParams {
            quantity: 1.0,
            stop_loss_pct: stop,
            take_profit_pct: target,
        }
    }

    fn opened(stop: f64, target: f64) -> Portfolio {
        let mut p = Portfolio::new(10_000.0);
        assert!(enter_long(&mut p, &bar(1, 99.0, 101.0, 100.0), &params(stop, target)));
        p
    }

    #[test]
    fn entry_fills_at_close() {
        let p = opened(0.0, 0.0);
        let trade = p.open_trade.as_ref().unwrap();
        assert_eq!(trade.entry_price, 100.0);
        assert_eq!(trade.quantity, 1.0);
    }

    #[test]
    fn no_pyramiding() {
        let mut p = opened(0.0, 0.0);
        assert!(!enter_long(&mut p, &bar(2, 99.0, 101.0, 120.0), &ExecutionParams::default()));
        assert_eq!(p.open_trade.as_ref().unwrap().entry_price, 100.0);
    }

    #[test]
    fn stop_fills_at_stop_price_not_close() {
        let mut p = opened(3.0, 0.0);
        // dips through 97 intrabar, recovers to close at 99
        let reason = process_exit(&mut p, &bar(2, 96.0, 100.0, 99.0), false);

        assert_eq!(reason, Some(ExitReason::StopLoss));
        let trade = &p.closed_trades[0];
        assert!((trade.exit_price.unwrap() - 97.0).abs() < 1e-9);
        assert!((p.equity - 9_997.0).abs() < 1e-9);
    }

    #[test]
    fn target_fills_at_target_price() {
        let mut p = opened(0.0, 6.0);
        let reason = process_exit(&mut p, &bar(2, 100.0, 107.0, 101.0), false);

        assert_eq!(reason, Some(ExitReason::TakeProfit));
        assert!((p.closed_trades[0].exit_price.unwrap() - 106.0).abs() < 1e-9);
    }

    #[test]
    fn stop_wins_when_bar_spans_both_levels() {
        let mut p = opened(3.0, 6.0);
        let reason = process_exit(&mut p, &bar(2, 90.0, 110.0, 105.0), true);
        assert_eq!(reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn risk_levels_take_precedence_over_signal() {
        let mut p = opened(0.0, 6.0);
        let reason = process_exit(&mut p, &bar(2, 100.0, 107.0, 101.0), true);
        assert_eq!(reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn signal_exits_at_close() {
        let mut p = opened(3.0, 6.0);
        let reason = process_exit(&mut p, &bar(2, 99.0, 103.0, 102.0), true);

        assert_eq!(reason, Some(ExitReason::Signal));
        assert_eq!(p.closed_trades[0].exit_price, Some(102.0));
    }

    #[test]
    fn nothing_triggers() {
        let mut p = opened(3.0, 6.0);
        assert_eq!(process_exit(&mut p, &bar(2, 98.0, 104.0, 101.0), false), None);
        assert!(!p.is_flat());
    }

    #[test]
    fn process_exit_when_flat() {
        let mut p = Portfolio::new(100.0);
        assert_eq!(process_exit(&mut p, &bar(2, 1.0, 1.0, 1.0), true), None);
    }

    #[test]
    fn force_close_at_close() {
        let mut p = opened(0.0, 0.0);
        assert!(force_close(&mut p, &bar(9, 100.0, 112.0, 110.0)));
        let trade = &p.closed_trades[0];
        assert_eq!(trade.exit_reason, Some(ExitReason::EndOfData));
        assert_eq!(trade.exit_price, Some(110.0));
        assert!(!force_close(&mut p, &bar(10, 1.0, 1.0, 1.0)));
    }
}
