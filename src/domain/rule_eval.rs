//! Condition and logic-tree evaluation against augmented candles.
//!
//! # Evaluation Semantics
//!
//! - A reference that is undefined at the bar (warm-up, missing key, non-finite) makes its
//!   condition false
//! - `EQUALS` compares within 1e-9
//! - `CROSSES_ABOVE`/`CROSSES_BELOW` need the previous bar; false on the first bar
//! - `AND` short-circuits on the first `false`; an empty `AND` is true
//! - `OR` short-circuits on the first `true`; an empty `OR` is false

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorKind, PriceField};
use crate::domain::rule::{BoolOp, Comparator, Condition, IndicatorReference, LogicGroup, LogicNode, Operand};

const EPSILON: f64 = 1e-9;

/// Value of a reference at one bar, or `None` when undefined there.
pub fn resolve_reference(reference: &IndicatorReference, candle: &Candle) -> Option<f64> {
    let value = match reference.kind {
        IndicatorKind::Open => candle.open,
        IndicatorKind::High => candle.high,
        IndicatorKind::Low => candle.low,
        IndicatorKind::Close => candle.close,
        IndicatorKind::Volume => candle.volume,
        IndicatorKind::Price => candle.field(reference.source.unwrap_or(PriceField::Close)),
        _ => candle.indicator(&reference.key())?,
    };
    value.is_finite().then_some(value)
}

fn resolve_operand(operand: &Operand, candle: &Candle) -> Option<f64> {
    match operand {
        Operand::Indicator(r) => resolve_reference(r, candle),
        Operand::Value(v) => v.is_finite().then_some(*v),
    }
}

fn sides(condition: &Condition, candle: &Candle) -> Option<(f64, f64)> {
    let left = resolve_reference(&condition.left, candle)?;
    let right = resolve_operand(&condition.right, candle)?;
    Some((left, right))
}

pub fn evaluate_condition(condition: &Condition, current: &Candle, previous: Option<&Candle>) -> bool {
    let Some((left, right)) = sides(condition, current) else {
        return false;
    };

    match condition.comparator {
        Comparator::GreaterThan => left > right,
        Comparator::LessThan => left < right,
        Comparator::Equals => (left - right).abs() < EPSILON,
        Comparator::CrossesAbove | Comparator::CrossesBelow => {
            let Some((left_prev, right_prev)) = previous.and_then(|p| sides(condition, p)) else {
                return false;
            };
            if condition.comparator == Comparator::CrossesAbove {
                left_prev <= right_prev && left > right
            } else {
                left_prev >= right_prev && left < right
            }
        }
    }
}

pub fn evaluate_group(group: &LogicGroup, current: &Candle, previous: Option<&Candle>) -> bool {
    match group.operator {
        BoolOp::And => group
            .children
            .iter()
            .all(|child| evaluate_node(child, current, previous)),
        BoolOp::Or => group
            .children
            .iter()
            .any(|child| evaluate_node(child, current, previous)),
    }
}

pub fn evaluate_node(node: &LogicNode, current: &Candle, previous: Option<&Candle>) -> bool {
    match node {
        LogicNode::Condition(c) => evaluate_condition(c, current, previous),
        LogicNode::Group(g) => evaluate_group(g, current, previous),
    }
}

/// Evaluates a tree at `bar_index`, pairing it with the bar before (if any).
pub fn evaluate_at(group: &LogicGroup, candles: &[Candle], bar_index: usize) -> bool {
    let Some(current) = candles.get(bar_index) else {
        return false;
    };
    let previous = bar_index.checked_sub(1).and_then(|i| candles.get(i));
    evaluate_group(group, current, previous)
}
