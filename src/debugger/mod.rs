mod breakpoints;
mod commands;
mod condition;
mod resolver;
mod routines;
mod session;
mod status;
mod table;
mod triggers;

pub use breakpoints::{BreakpointEntry, StatementList, StatementStore};
pub use commands::{ClearOutcome, CommandOutput, StopOutcome};
pub use condition::validate_condition;
pub use resolver::find_routine_by_line;
pub use routines::{
    InMemoryDirectory, RoutineDirectory, RoutineId, RoutineKind, RoutineNode, RoutineSource,
    RoutineTree,
};
pub use session::{BreakpointEvent, DebugSession, SessionState};
pub use status::{BreakpointInfo, BreakpointListing, DebugStatus, StatusReport, StopReason};
pub use table::BreakpointTable;
pub use triggers::{extract_id_list, IdSpec, TriggerRegistry, TriggerState};
