//! Backtest engine and event loop.
//!
//! One pass over the augmented candles. Per bar:
//!
//! 1. In a position (opened on an earlier bar): check stop, target, then exit signal
//! 2. Otherwise flat: open a long at the close if the entry tree holds
//! 3. On the last bar: force-close anything still open
//! 4. Record one equity point
//!
//! A bar that closes a trade does not also open one.

use super::candle::Candle;
use super::execution::{enter_long, force_close, process_exit, ExecutionParams};
use super::indicator::engine::augment_with;
use super::indicator::DEFAULT_PIVOT_BLOCK;
use super::metrics::{Metrics, TRADING_DAYS_PER_YEAR};
use super::portfolio::{EquityPoint, Portfolio};
use super::position::Trade;
use super::rule_eval::evaluate_group;
use super::strategy::Strategy;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_equity: f64,
    /// Units bought per trade.
    pub quantity: f64,
    /// Bars per year for Sharpe scaling.
    pub annualization_factor: f64,
    /// Default pivot block length when a reference gives none.
    pub pivot_block: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_equity: 10_000.0,
            quantity: 1.0,
            annualization_factor: TRADING_DAYS_PER_YEAR,
            pivot_block: DEFAULT_PIVOT_BLOCK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy_id: String,
    pub symbol: String,
    pub bars: usize,
    pub initial_equity: f64,
    pub final_equity: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
}

/// Runs `strategy` over raw candles with the default configuration.
pub fn run_backtest(strategy: &Strategy, candles: &[Candle]) -> BacktestResult {
    run_backtest_with(strategy, candles, &BacktestConfig::default())
}

/// Computes every indicator the strategy references, then simulates.
pub fn run_backtest_with(
    strategy: &Strategy,
    candles: &[Candle],
    config: &BacktestConfig,
) -> BacktestResult {
    let configs = strategy.indicator_configs();
    tracing::info!(
        strategy = %strategy.id,
        bars = candles.len(),
        indicators = configs.len(),
        "running backtest"
    );

    let augmented = augment_with(candles, &configs, config.pivot_block);
    let portfolio = simulate(strategy, &augmented, config);
    let metrics = Metrics::compute(&portfolio, config.annualization_factor);

    tracing::info!(
        strategy = %strategy.id,
        trades = metrics.total_trades,
        final_equity = portfolio.equity,
        total_return = metrics.total_return,
        "backtest complete"
    );

    BacktestResult {
        strategy_id: strategy.id.clone(),
        symbol: strategy.symbol.clone(),
        bars: augmented.len(),
        initial_equity: portfolio.initial_equity,
        final_equity: portfolio.equity,
        trades: portfolio.closed_trades,
        equity_curve: portfolio.equity_curve,
        metrics,
    }
}

/// Walks already-augmented candles and returns the final book.
pub fn simulate(strategy: &Strategy, candles: &[Candle], config: &BacktestConfig) -> Portfolio {
    let mut portfolio = Portfolio::new(config.initial_equity);
    let params = ExecutionParams {
        quantity: config.quantity,
        stop_loss_pct: strategy.stop_loss_pct,
        take_profit_pct: strategy.take_profit_pct,
    };
    let last = candles.len().saturating_sub(1);

    for (i, candle) in candles.iter().enumerate() {
        let previous = i.checked_sub(1).map(|p| &candles[p]);

        if portfolio.is_flat() {
            if evaluate_group(&strategy.entry, candle, previous)
                && enter_long(&mut portfolio, candle, &params)
            {
                tracing::debug!(date = %candle.date, price = candle.close, "entered long");
            }
        } else {
            let exit_signal = evaluate_group(&strategy.exit, candle, previous);
            if let Some(reason) = process_exit(&mut portfolio, candle, exit_signal) {
                if let Some(trade) = portfolio.closed_trades.last() {
                    tracing::debug!(
                        date = %candle.date,
                        %reason,
                        price = trade.exit_price,
                        profit = trade.profit,
                        "exited long"
                    );
                }
            }
        }

        if i == last && force_close(&mut portfolio, candle) {
            tracing::debug!(date = %candle.date, price = candle.close, "closed at end of data");
        }

        portfolio.record_equity(candle.date);
    }

    portfolio
}
