//! Summary statistics over a finished run.
//!
//! Ratios are fractions (`0.25` = 25%). Sharpe uses per-bar equity changes and the population
//! standard deviation, scaled by `sqrt(annualization_factor)`.

use super::portfolio::{EquityPoint, Portfolio};
use serde::{Serialize, Serializer};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// JSON has no infinity; serde_json would otherwise write `null`.
fn serialize_ratio<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    /// Gross wins / gross losses; infinite with wins and no losses, which JSON
    /// carries as the string `"inf"`.
    #[serde(serialize_with = "serialize_ratio")]
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Calendar days.
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, annualization_factor: f64) -> Self {
        let initial = portfolio.initial_equity;
        let total_return = if initial != 0.0 {
            (portfolio.equity - initial) / initial
        } else {
            0.0
        };

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut gross_wins = 0.0_f64;
        let mut gross_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_days = 0i64;

        let closed = &portfolio.closed_trades;
        for trade in closed {
            let profit = trade.profit.unwrap_or(0.0);
            if profit > 0.0 {
                trades_won += 1;
                gross_wins += profit;
                largest_win = largest_win.max(profit);
            } else if profit < 0.0 {
                trades_lost += 1;
                gross_losses += profit.abs();
                largest_loss = largest_loss.max(profit.abs());
            }
            total_days += trade.holding_days().unwrap_or(0);
        }

        let total_trades = closed.len();
        let win_rate = ratio(trades_won as f64, total_trades as f64);

        let profit_factor = if gross_losses > 0.0 {
            gross_wins / gross_losses
        } else if gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Metrics {
            total_return,
            win_rate,
            max_drawdown: max_drawdown(&portfolio.equity_curve),
            sharpe_ratio: sharpe_ratio(&portfolio.equity_curve, annualization_factor),
            total_trades,
            trades_won,
            trades_lost,
            profit_factor,
            avg_win: ratio(gross_wins, trades_won as f64),
            avg_loss: ratio(gross_losses, trades_lost as f64),
            largest_win,
            largest_loss,
            avg_trade_duration: ratio(total_days as f64, total_trades as f64),
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// Largest peak-to-trough decline as a fraction of the peak.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

/// Annualized Sharpe of per-bar equity changes; 0 with fewer than two points or no variance.
pub fn sharpe_ratio(equity_curve: &[EquityPoint], annualization_factor: f64) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev != 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * annualization_factor.sqrt()
    } else {
        0.0
    }
}
