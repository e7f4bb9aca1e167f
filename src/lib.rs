//! stratlab: rule-based strategy backtesting.
//!
//! Hexagonal architecture: the engine in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].
//!
//! The two engine entry points are
//! [`augment_with_indicators`](domain::indicator::engine::augment_with_indicators) and
//! [`run_backtest`](domain::backtest::run_backtest).

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
