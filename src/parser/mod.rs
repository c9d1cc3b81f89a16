mod commands;
mod lexer;
mod statement;
mod types;

pub use commands::{parse_breakpoint_args, split_command_line};
pub use statement::{
    parse_statement_list, BinaryOp, ControlKind, Expr, PostfixOp, ScriptParser, Statement,
    StatementParser, UnaryOp,
};
pub use types::{
    BreakpointArgs, CommandArg, CommandKind, EventCategory, EventClause, LineMap, ParseError,
};
