//! Error types for breakpoint commands and condition validation.

use crate::parser::{CommandKind, ParseError};

pub type Result<T, E = BreakpointError> = std::result::Result<T, E>;

/// Reasons a breakpoint condition is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    /// The condition text is not valid syntax.
    #[error("cannot parse condition '{condition}': {source}")]
    Parse {
        condition: String,
        #[source]
        source: ParseError,
    },

    /// The condition parsed, but is not a single expression statement.
    #[error("condition '{condition}' {reason}")]
    Structure {
        condition: String,
        reason: &'static str,
    },

    /// The condition is an assignment, usually a typo for `==`.
    #[error("condition cannot be an assignment.  Did you mean '=='?")]
    Assignment { condition: String },
}

/// A malformed field in a bulk restore request.
#[derive(Debug, thiserror::Error)]
#[error("invalid '{field}' field: {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

/// Errors returned by `stop`, `clear` and the table operations behind them.
#[derive(Debug, thiserror::Error)]
pub enum BreakpointError {
    /// Bad clause order or arity.
    #[error("{who}: {message}")]
    CommandSyntax { who: CommandKind, message: String },

    /// The routine name did not resolve in the directory.
    #[error("{who}: unable to find function '{name}'")]
    UnknownRoutine { who: CommandKind, name: String },

    #[error("{who}: {source}")]
    Condition {
        who: CommandKind,
        #[source]
        source: ConditionError,
    },

    /// `if WORD` where WORD is not an event category.
    #[error("{who}: invalid condition {category}")]
    UnknownEventCategory { who: CommandKind, category: String },

    #[error(transparent)]
    InvalidField(#[from] FieldError),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

impl BreakpointError {
    pub(crate) fn syntax(who: CommandKind, message: impl Into<String>) -> Self {
        Self::CommandSyntax {
            who,
            message: message.into(),
        }
    }
}

/// Non-fatal problems reported alongside a successful command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandWarning {
    #[error("{who}: condition '{category}' not yet supported")]
    UnsupportedCategory { who: CommandKind, category: String },
}
