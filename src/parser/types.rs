use std::collections::BTreeMap;
use std::fmt;

/// Requested index -> line number.
///
/// Indices follow the order the lines were given on the command line, so a
/// result map can be matched back to the request.
pub type LineMap = BTreeMap<usize, u32>;

/// A syntax error in a condition or statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} near column {column}")]
pub struct ParseError {
    pub message: String,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, column: usize) -> Self {
        Self {
            message: message.into(),
            column,
        }
    }
}

/// Which command is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Stop,
    Clear,
}

impl CommandKind {
    /// `stop` turns things on, `clear` turns them off.
    pub fn enables(self) -> bool {
        matches!(self, CommandKind::Stop)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Stop => f.write_str("stop"),
            CommandKind::Clear => f.write_str("clear"),
        }
    }
}

/// One argument of a `stop`/`clear` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandArg {
    Text(String),
    /// A numeric vector of line numbers, as passed by programmatic callers.
    Lines(Vec<u32>),
}

impl CommandArg {
    pub fn text(s: impl Into<String>) -> Self {
        CommandArg::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CommandArg::Text(s) => Some(s),
            CommandArg::Lines(_) => None,
        }
    }
}

impl From<&str> for CommandArg {
    fn from(value: &str) -> Self {
        CommandArg::Text(value.to_string())
    }
}

impl From<String> for CommandArg {
    fn from(value: String) -> Self {
        CommandArg::Text(value)
    }
}

impl From<Vec<u32>> for CommandArg {
    fn from(value: Vec<u32>) -> Self {
        CommandArg::Lines(value)
    }
}

/// Runtime event classes that can suspend execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    Error,
    CaughtError,
    Warning,
    Interrupt,
    NanInf,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventCategory::Error => "error",
            EventCategory::CaughtError => "caught error",
            EventCategory::Warning => "warning",
            EventCategory::Interrupt => "interrupt",
            EventCategory::NanInf => "naninf",
        };
        f.write_str(s)
    }
}

/// An `if <event> [ID]` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventClause {
    pub category: EventCategory,
    /// Only `error`, `caught error` and `warning` take an identifier.
    pub id: Option<String>,
}

/// Normalized arguments of a `stop`/`clear` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointArgs {
    pub routine: Option<String>,
    pub class: Option<String>,
    pub lines: LineMap,
    pub condition: String,
    pub event: Option<EventClause>,
}
