//! Strategy condition tree.
//!
//! - `IndicatorReference`: what a condition reads (price field or indicator + period + source)
//! - `Comparator`: how the two sides are compared
//! - `Operand`: the right-hand side, either another reference or a constant
//! - `Condition`: a leaf comparison
//! - `LogicGroup`: an AND/OR node owning its children
//! - `LogicNode`: tagged union of the two node kinds
//!
//! The serde shape of these types is the persistence contract for strategies. Nodes are
//! internally tagged by `type` (`"condition"` or `"group"`); any other tag fails to decode.

use crate::domain::indicator::{IndicatorKey, IndicatorKind, PriceField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReference {
    pub kind: IndicatorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PriceField>,
}

impl IndicatorReference {
    pub fn price(kind: IndicatorKind) -> Self {
        IndicatorReference {
            kind,
            period: None,
            source: None,
        }
    }

    pub fn with_period(kind: IndicatorKind, period: usize) -> Self {
        IndicatorReference {
            kind,
            period: Some(period),
            source: None,
        }
    }

    pub fn key(&self) -> IndicatorKey {
        IndicatorKey::new(self.kind, self.period, self.source.unwrap_or(PriceField::Close))
    }
}

impl fmt::Display for IndicatorReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == IndicatorKind::Price {
            return write!(f, "{}", self.source.unwrap_or(PriceField::Close).name());
        }
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    GreaterThan,
    LessThan,
    Equals,
    CrossesAbove,
    CrossesBelow,
}

impl Comparator {
    pub fn needs_previous_bar(self) -> bool {
        matches!(self, Comparator::CrossesAbove | Comparator::CrossesBelow)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::GreaterThan => ">",
            Comparator::LessThan => "<",
            Comparator::Equals => "==",
            Comparator::CrossesAbove => "CROSSES_ABOVE",
            Comparator::CrossesBelow => "CROSSES_BELOW",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operand {
    Indicator(IndicatorReference),
    Value(f64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Indicator(r) => write!(f, "{}", r),
            Operand::Value(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub left: IndicatorReference,
    pub comparator: Comparator,
    pub right: Operand,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparator, self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOp {
    And,
    Or,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => f.write_str("AND"),
            BoolOp::Or => f.write_str("OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicGroup {
    pub id: String,
    pub operator: BoolOp,
    #[serde(default)]
    pub children: Vec<LogicNode>,
}

impl LogicGroup {
    pub fn new(id: impl Into<String>, operator: BoolOp, children: Vec<LogicNode>) -> Self {
        LogicGroup {
            id: id.into(),
            operator,
            children,
        }
    }

    pub fn and(id: impl Into<String>, children: Vec<LogicNode>) -> Self {
        Self::new(id, BoolOp::And, children)
    }

    pub fn or(id: impl Into<String>, children: Vec<LogicNode>) -> Self {
        Self::new(id, BoolOp::Or, children)
    }

    /// Depth-first visit of every node, the group itself first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(NodeRef<'a>)) {
        visit(NodeRef::Group(self));
        for child in &self.children {
            match child {
                LogicNode::Condition(c) => visit(NodeRef::Condition(c)),
                LogicNode::Group(g) => g.walk(visit),
            }
        }
    }

    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let NodeRef::Condition(c) = node {
                out.push(c);
            }
        });
        out
    }
}

impl fmt::Display for LogicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.children.is_empty() {
            // vacuous values: AND of nothing holds, OR of nothing does not
            return match self.operator {
                BoolOp::And => f.write_str("TRUE"),
                BoolOp::Or => f.write_str("FALSE"),
            };
        }
        f.write_str("(")?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.operator)?;
            }
            write!(f, "{}", child)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogicNode {
    Condition(Condition),
    Group(LogicGroup),
}

impl LogicNode {
    pub fn id(&self) -> &str {
        match self {
            LogicNode::Condition(c) => &c.id,
            LogicNode::Group(g) => &g.id,
        }
    }
}

impl From<Condition> for LogicNode {
    fn from(c: Condition) -> Self {
        LogicNode::Condition(c)
    }
}

impl From<LogicGroup> for LogicNode {
    fn from(g: LogicGroup) -> Self {
        LogicNode::Group(g)
    }
}

impl fmt::Display for LogicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicNode::Condition(c) => write!(f, "{}", c),
            LogicNode::Group(g) => write!(f, "{}", g),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Condition(&'a Condition),
    Group(&'a LogicGroup),
}

impl NodeRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            NodeRef::Condition(c) => &c.id,
            NodeRef::Group(g) => &g.id,
        }
    }
}

/// Every indicator a tree needs precomputed (price fields excluded).
pub fn extract_indicators(group: &LogicGroup) -> BTreeSet<IndicatorKey> {
    let mut keys = BTreeSet::new();
    for condition in group.conditions() {
        let mut add = |r: &IndicatorReference| {
            if !r.kind.is_price_field() {
                keys.insert(r.key());
            }
        };
        add(&condition.left);
        if let Operand::Indicator(r) = &condition.right {
            add(r);
        }
    }
    keys
}
