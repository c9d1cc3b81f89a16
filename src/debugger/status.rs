//! Breakpoint and trigger status, for interactive echo and for programmatic
//! save/restore.

use super::breakpoints::BreakpointEntry;
use crate::parser::EventCategory;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Breakpoints grouped by routine key (`F`, `F>helper`, `@cls/method`).
/// Within a file the main routine comes first, then sub-routines in
/// declaration order.
pub type BreakpointListing = Vec<(String, Vec<BreakpointEntry>)>;

/// A reason, other than a breakpoint, that execution will stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReason {
    pub category: EventCategory,
    /// `None` means every identifier in the category.
    pub id: Option<String>,
}

impl StopReason {
    pub fn all(category: EventCategory) -> Self {
        Self { category, id: None }
    }

    pub fn only(category: EventCategory, id: impl Into<String>) -> Self {
        Self {
            category,
            id: Some(id.into()),
        }
    }
}

/// Everything `status` knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub breakpoints: BreakpointListing,
    pub stops: Vec<StopReason>,
}

impl StatusReport {
    /// Lines for the interactive echo.
    pub fn render(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (key, entries) in &self.breakpoints {
            for entry in entries {
                let mut line = format!("breakpoint in {key} at line {}", entry.line);
                if !entry.condition.is_empty() {
                    line.push_str(" if ");
                    line.push_str(&entry.condition);
                }
                out.push(line);
            }
        }
        for stop in &self.stops {
            match &stop.id {
                Some(id) => out.push(format!("stop if {} {id}", stop.category)),
                None => out.push(format!("stop if {}", stop.category)),
            }
        }
        out
    }

    /// The structured form, suitable for serializing and for
    /// [`restore`](crate::BreakpointTable::restore).
    pub fn to_debug_status(&self) -> DebugStatus {
        let mut status = DebugStatus {
            bkpt: self
                .breakpoints
                .iter()
                .flat_map(|(key, entries)| {
                    entries.iter().map(move |entry| BreakpointInfo {
                        name: key.clone(),
                        line: entry.line,
                        cond: entry.condition.clone(),
                    })
                })
                .collect(),
            ..DebugStatus::default()
        };

        for stop in &self.stops {
            let field = match stop.category {
                EventCategory::Error => &mut status.errs,
                EventCategory::CaughtError => &mut status.caught,
                EventCategory::Warning => &mut status.warn,
                EventCategory::Interrupt => {
                    status.intr = true;
                    continue;
                }
                EventCategory::NanInf => {
                    status.naninf = true;
                    continue;
                }
            };
            match &stop.id {
                None => *field = Some(Value::String(String::new())),
                Some(id) => match field {
                    Some(Value::Array(ids)) => ids.push(Value::String(id.clone())),
                    _ => *field = Some(Value::Array(vec![Value::String(id.clone())])),
                },
            }
        }

        status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointInfo {
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub cond: String,
}

/// Saved debug state.
///
/// A trigger field is absent while its category is disabled, `""` when
/// it stops on everything, and a list of identifiers otherwise. The
/// fields stay untyped so a restore can report exactly which one is
/// malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugStatus {
    #[serde(default)]
    pub bkpt: Vec<BreakpointInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caught: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub intr: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub naninf: bool,
}

impl DebugStatus {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
