//! Offline assistant: renders strategies as pseudo-code and a structural summary.

use crate::domain::error::StratlabError;
use crate::domain::rule::{BoolOp, LogicGroup, LogicNode, NodeRef};
use crate::domain::strategy::Strategy;
use crate::ports::assistant_port::AssistantPort;
use std::fmt::Write;

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextAssistant;

fn depth(group: &LogicGroup) -> usize {
    1 + group
        .children
        .iter()
        .map(|child| match child {
            LogicNode::Group(g) => depth(g),
            LogicNode::Condition(_) => 0,
        })
        .max()
        .unwrap_or(0)
}

fn crossover_count(group: &LogicGroup) -> usize {
    group
        .conditions()
        .iter()
        .filter(|c| c.comparator.needs_previous_bar())
        .count()
}

fn group_count(group: &LogicGroup) -> usize {
    let mut n = 0;
    group.walk(&mut |node| {
        if let NodeRef::Group(_) = node {
            n += 1;
        }
    });
    n
}

fn describe_tree(out: &mut String, label: &str, group: &LogicGroup) -> std::fmt::Result {
    writeln!(
        out,
        "{label}: {} condition(s) in {} group(s), depth {}, {} crossover(s)",
        group.conditions().len(),
        group_count(group),
        depth(group),
        crossover_count(group),
    )?;
    if group.children.is_empty() {
        let note = match group.operator {
            BoolOp::And => "empty AND, always true",
            BoolOp::Or => "empty OR, never true",
        };
        writeln!(out, "  note: {note}")?;
    }
    Ok(())
}

fn fmt_err(_: std::fmt::Error) -> StratlabError {
    StratlabError::invalid("failed to render strategy text")
}

impl AssistantPort for PlainTextAssistant {
    fn generate_code(&self, strategy: &Strategy) -> Result<String, StratlabError> {
        let mut out = String::new();
        let render = |out: &mut String| -> std::fmt::Result {
            writeln!(out, "# {} ({})", strategy.id, strategy.symbol)?;
            if !strategy.name.is_empty() {
                writeln!(out, "# {}", strategy.name)?;
            }
            writeln!(out, "for each bar:")?;
            writeln!(out, "    if flat and {}:", strategy.entry)?;
            writeln!(out, "        buy at close")?;
            writeln!(out, "    elif long:")?;
            if let Some(pct) = strategy.stop_loss() {
                writeln!(out, "        if low <= entry * (1 - {pct} / 100): sell at stop")?;
            }
            if let Some(pct) = strategy.take_profit() {
                writeln!(out, "        if high >= entry * (1 + {pct} / 100): sell at target")?;
            }
            writeln!(out, "        if {}: sell at close", strategy.exit)?;
            writeln!(out, "on last bar: close any open position at close")
        };
        render(&mut out).map_err(fmt_err)?;
        Ok(out)
    }

    fn analyze(&self, strategy: &Strategy) -> Result<String, StratlabError> {
        let mut out = String::new();
        let render = |out: &mut String| -> std::fmt::Result {
            writeln!(out, "Strategy {} on {}", strategy.id, strategy.symbol)?;
            describe_tree(out, "entry", &strategy.entry)?;
            describe_tree(out, "exit", &strategy.exit)?;

            let indicators: Vec<String> = strategy
                .indicator_configs()
                .iter()
                .map(|k| k.to_string())
                .collect();
            if indicators.is_empty() {
                writeln!(out, "indicators: none")?;
            } else {
                writeln!(out, "indicators: {}", indicators.join(", "))?;
            }
            writeln!(out, "warm-up: {} bar(s)", strategy.warmup_bars())?;

            match (strategy.stop_loss(), strategy.take_profit()) {
                (None, None) => writeln!(out, "risk: no stop-loss or take-profit"),
                (stop, target) => writeln!(
                    out,
                    "risk: stop {}, target {}",
                    stop.map_or("off".to_string(), |p| format!("{p}%")),
                    target.map_or("off".to_string(), |p| format!("{p}%")),
                ),
            }
        };
        render(&mut out).map_err(fmt_err)?;
        Ok(out)
    }
}
