//! Breakpoints and stop-on-event triggers for a script interpreter.
//!
//! [`BreakpointTable`] owns the state. Its `stop`, `clear` and `status`
//! commands take the same argument grammar the interactive prompt accepts:
//!
//! ```
//! use script_breakpoints::debugger::{InMemoryDirectory, RoutineSource, SessionState};
//! use script_breakpoints::BreakpointTable;
//!
//! let mut directory = InMemoryDirectory::new();
//! directory.insert(RoutineSource::function("F", 1, 20).with_statements([2, 5, 9]));
//!
//! let mut table = BreakpointTable::new(directory, SessionState::new());
//! table.execute("stop in F at 4").unwrap();
//! assert_eq!(table.status(None).render(), ["breakpoint in F at line 5"]);
//! ```

mod config;
pub mod debugger;
mod error;
pub mod parser;

pub use config::TableOptions;
pub use debugger::BreakpointTable;
pub use error::{BreakpointError, CommandWarning, ConditionError, FieldError, Result};
