//! Strategy definition: entry/exit trees plus risk settings.
//!
//! Percentages are whole-number percent (`3.0` means 3%); `0` disables the exit.

use crate::domain::error::StratlabError;
use crate::domain::indicator::{IndicatorKey, IndicatorKind};
use crate::domain::rule::{
    extract_indicators, Comparator, Condition, IndicatorReference, LogicGroup, NodeRef, Operand,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub symbol: String,
    pub entry: LogicGroup,
    pub exit: LogicGroup,
    #[serde(default)]
    pub stop_loss_pct: f64,
    #[serde(default)]
    pub take_profit_pct: f64,
}

impl Strategy {
    /// Rejects trees the evaluator could never make sense of.
    ///
    /// Checks node ids are non-empty and unique across both trees, every computed reference
    /// has a usable period, constants are finite and the risk percentages are finite and
    /// non-negative.
    pub fn validate(&self) -> Result<(), StratlabError> {
        if self.symbol.trim().is_empty() {
            return Err(StratlabError::invalid("symbol must not be empty"));
        }
        check_pct("stop_loss_pct", self.stop_loss_pct)?;
        check_pct("take_profit_pct", self.take_profit_pct)?;

        let mut seen = HashSet::new();
        let mut result = Ok(());
        for tree in [&self.entry, &self.exit] {
            tree.walk(&mut |node| {
                if result.is_err() {
                    return;
                }
                result = check_node(node, &mut seen);
            });
        }
        result
    }

    /// Every indicator either tree reads, deduplicated and in key order.
    pub fn indicator_configs(&self) -> Vec<IndicatorKey> {
        let mut keys: BTreeSet<IndicatorKey> = extract_indicators(&self.entry);
        keys.extend(extract_indicators(&self.exit));
        keys.into_iter().collect()
    }

    /// Longest lookback among referenced indicators; bars before it cannot trigger entries.
    pub fn warmup_bars(&self) -> usize {
        self.indicator_configs()
            .iter()
            .filter(|k| k.kind.requires_period())
            .filter_map(|k| k.period)
            .max()
            .unwrap_or(0)
    }

    pub fn stop_loss(&self) -> Option<f64> {
        (self.stop_loss_pct > 0.0).then_some(self.stop_loss_pct)
    }

    pub fn take_profit(&self) -> Option<f64> {
        (self.take_profit_pct > 0.0).then_some(self.take_profit_pct)
    }
}

fn check_pct(field: &str, value: f64) -> Result<(), StratlabError> {
    if !value.is_finite() || value < 0.0 {
        return Err(StratlabError::invalid(format!(
            "{field} must be a finite, non-negative percentage (got {value})"
        )));
    }
    Ok(())
}

fn check_node<'a>(node: NodeRef<'a>, seen: &mut HashSet<&'a str>) -> Result<(), StratlabError> {
    let id = match node {
        NodeRef::Condition(c) => c.id.as_str(),
        NodeRef::Group(g) => g.id.as_str(),
    };
    if id.trim().is_empty() {
        return Err(StratlabError::invalid("node id must not be empty"));
    }
    if !seen.insert(id) {
        return Err(StratlabError::DuplicateNodeId(id.to_string()));
    }

    if let NodeRef::Condition(condition) = node {
        check_reference(id, &condition.left)?;
        match &condition.right {
            Operand::Indicator(r) => check_reference(id, r)?,
            Operand::Value(v) if !v.is_finite() => {
                return Err(StratlabError::invalid_node(id, "constant must be finite"));
            }
            Operand::Value(_) => {}
        }
    }
    Ok(())
}

fn check_reference(id: &str, reference: &IndicatorReference) -> Result<(), StratlabError> {
    let kind = reference.kind;
    if kind.requires_period() {
        match reference.period {
            None => {
                return Err(StratlabError::invalid_node(
                    id,
                    format!("{} requires a period", kind.name()),
                ));
            }
            Some(0) => {
                return Err(StratlabError::invalid_node(
                    id,
                    format!("{} period must be at least 1", kind.name()),
                ));
            }
            Some(_) => {}
        }
    }
    if kind.is_pivot_level() && reference.period == Some(0) {
        return Err(StratlabError::invalid_node(id, "pivot block must be at least 1"));
    }
    Ok(())
}

/// Mean-reversion starter strategy.
///
/// Enters when RSI(14) < 30 while close is above EMA(50); exits when RSI(14) > 70.
/// 3% stop, 6% target.
pub fn sample_strategy(symbol: &str) -> Strategy {
    let rsi = IndicatorReference::with_period(IndicatorKind::Rsi, 14);
    Strategy {
        id: format!("{}-rsi-reversion", symbol.to_lowercase()),
        name: "RSI reversion above EMA 50".into(),
        symbol: symbol.to_string(),
        entry: LogicGroup::and(
            "entry",
            vec![
                Condition {
                    id: "rsi-oversold".into(),
                    left: rsi,
                    comparator: Comparator::LessThan,
                    right: Operand::Value(30.0),
                }
                .into(),
                Condition {
                    id: "close-above-ema".into(),
                    left: IndicatorReference::price(IndicatorKind::Close),
                    comparator: Comparator::GreaterThan,
                    right: Operand::Indicator(IndicatorReference::with_period(
                        IndicatorKind::Ema,
                        50,
                    )),
                }
                .into(),
            ],
        ),
        exit: LogicGroup::or(
            "exit",
            vec![
                Condition {
                    id: "rsi-overbought".into(),
                    left: rsi,
                    comparator: Comparator::GreaterThan,
                    right: Operand::Value(70.0),
                }
                .into(),
            ],
        ),
        stop_loss_pct: 3.0,
        take_profit_pct: 6.0,
    }
}
