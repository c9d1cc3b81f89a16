use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A breakpoint stored in a routine body. An empty condition is unconditional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointEntry {
    pub line: u32,
    #[serde(default)]
    pub condition: String,
}

impl BreakpointEntry {
    pub fn new(line: u32, condition: impl Into<String>) -> Self {
        Self {
            line,
            condition: condition.into(),
        }
    }
}

/// Per-line breakpoint storage of one routine body.
pub trait StatementStore {
    /// Insert a breakpoint at the first statement on or after `line`.
    /// Returns the line the breakpoint landed on.
    fn add_breakpoint(&mut self, line: u32, condition: &str) -> Option<u32>;

    /// Remove every breakpoint at exactly `line`, returning how many went.
    fn remove_breakpoint(&mut self, line: u32) -> usize;

    /// Remove everything, returning the lines that had breakpoints.
    fn remove_all_breakpoints(&mut self) -> Vec<u32>;

    /// Breakpoints in line order; entries on one line keep insertion order.
    fn breakpoints(&self) -> Vec<BreakpointEntry>;

    fn has_breakpoints(&self) -> bool {
        !self.breakpoints().is_empty()
    }
}

/// A routine body reduced to the start lines of its statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementList {
    statement_lines: Vec<u32>,
    points: BTreeMap<u32, Vec<String>>,
}

impl StatementList {
    pub fn new(lines: impl IntoIterator<Item = u32>) -> Self {
        let mut statement_lines: Vec<u32> = lines.into_iter().collect();
        statement_lines.sort_unstable();
        statement_lines.dedup();
        Self {
            statement_lines,
            points: BTreeMap::new(),
        }
    }

    pub fn statement_lines(&self) -> &[u32] {
        &self.statement_lines
    }

    fn statement_on_or_after(&self, line: u32) -> Option<u32> {
        let idx = self.statement_lines.partition_point(|&l| l < line);
        self.statement_lines.get(idx).copied()
    }
}

impl StatementStore for StatementList {
    fn add_breakpoint(&mut self, line: u32, condition: &str) -> Option<u32> {
        let target = self.statement_on_or_after(line)?;
        // repeated requests stack up rather than being merged
        self.points
            .entry(target)
            .or_default()
            .push(condition.to_string());
        Some(target)
    }

    fn remove_breakpoint(&mut self, line: u32) -> usize {
        self.points.remove(&line).map_or(0, |conds| conds.len())
    }

    fn remove_all_breakpoints(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.points).into_keys().collect()
    }

    fn breakpoints(&self) -> Vec<BreakpointEntry> {
        self.points
            .iter()
            .flat_map(|(&line, conds)| {
                conds
                    .iter()
                    .map(move |cond| BreakpointEntry::new(line, cond.as_str()))
            })
            .collect()
    }

    fn has_breakpoints(&self) -> bool {
        !self.points.is_empty()
    }
}
