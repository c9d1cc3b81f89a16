/// The evaluator side of a debug session, as seen by the breakpoint table.
pub trait DebugSession {
    /// Routine the interpreter is suspended in, if any.
    fn active_routine(&self) -> Option<&str>;

    /// Drop any cached "currently debugging" state. Called after every
    /// command that changes breakpoints or triggers.
    fn reset_debug_state(&mut self);

    /// A breakpoint was inserted at or removed from `line` of `file`.
    fn breakpoint_changed(&mut self, _file: &str, _line: u32, _inserted: bool) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointEvent {
    pub file: String,
    pub line: u32,
    pub inserted: bool,
}

/// Session state for a host without a running evaluator. Keeps the active
/// routine and a log of what the table told it.
///
/// The log is unbounded. Long-lived owners drain it with
/// [`take_events`](Self::take_events) after each command.
#[derive(Debug, Default)]
pub struct SessionState {
    active: Option<String>,
    resets: usize,
    events: Vec<BreakpointEvent>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend execution is suspended in `routine`.
    pub fn suspend_in(&mut self, routine: impl Into<String>) {
        self.active = Some(routine.into());
    }

    pub fn resume(&mut self) {
        self.active = None;
    }

    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Changes recorded since the last [`take_events`](Self::take_events).
    pub fn events(&self) -> &[BreakpointEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BreakpointEvent> {
        std::mem::take(&mut self.events)
    }
}

impl DebugSession for SessionState {
    fn active_routine(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn reset_debug_state(&mut self) {
        self.resets += 1;
    }

    fn breakpoint_changed(&mut self, file: &str, line: u32, inserted: bool) {
        self.events.push(BreakpointEvent {
            file: file.to_string(),
            line,
            inserted,
        });
    }
}
