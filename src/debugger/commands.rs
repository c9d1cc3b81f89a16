//! The `stop`, `clear` and `status` commands on top of [`BreakpointTable`].

use super::routines::{split_routine_key, RoutineDirectory};
use super::session::DebugSession;
use super::status::{DebugStatus, StatusReport};
use super::table::BreakpointTable;
use super::triggers::extract_id_list;
use crate::error::{BreakpointError, CommandWarning, Result};
use crate::parser::{
    parse_breakpoint_args, split_command_line, CommandArg, CommandKind, EventCategory, LineMap,
};

/// Result of a `stop` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopOutcome {
    /// Request index -> inserted line, `0` where nothing was inserted.
    pub lines: LineMap,
    pub warnings: Vec<CommandWarning>,
}

/// Result of a `clear` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearOutcome {
    pub removed: usize,
    pub warnings: Vec<CommandWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Stop(StopOutcome),
    Clear(ClearOutcome),
    Status(StatusReport),
}

impl<D: RoutineDirectory, S: DebugSession> BreakpointTable<D, S> {
    /// Set breakpoints or enable a stop trigger.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self, args: &[CommandArg]) -> Result<StopOutcome> {
        let who = CommandKind::Stop;
        let parsed = parse_breakpoint_args(who, args, self.session().active_routine())?;
        let mut outcome = StopOutcome::default();

        if let Some(routine) = &parsed.routine {
            let lines = if parsed.lines.is_empty() {
                LineMap::from([(0, self.options.default_line)])
            } else {
                parsed.lines.clone()
            };
            outcome.lines = self.add(routine, parsed.class.as_deref(), &lines, &parsed.condition)?;
        } else if let Some(event) = &parsed.event {
            outcome.warnings.extend(self.triggers.apply(who, event, &self.options));
            self.session_mut().reset_debug_state();
        }

        Ok(outcome)
    }

    /// Remove breakpoints or disable a stop trigger.
    ///
    /// No arguments, or just `all`, removes every breakpoint and disables
    /// every trigger.
    #[tracing::instrument(skip(self))]
    pub fn clear(&mut self, args: &[CommandArg]) -> Result<ClearOutcome> {
        let who = CommandKind::Clear;
        let mut outcome = ClearOutcome::default();

        if args.is_empty() || matches!(args, [CommandArg::Text(all)] if all == "all") {
            outcome.removed = self.remove_all();
            self.triggers.clear_all();
            return Ok(outcome);
        }

        let parsed = parse_breakpoint_args(who, args, self.session().active_routine())?;
        if let Some(routine) = &parsed.routine {
            outcome.removed = self.remove(routine, parsed.class.as_deref(), &parsed.lines)?;
        } else if let Some(event) = &parsed.event {
            outcome.warnings.extend(self.triggers.apply(who, event, &self.options));
            self.session_mut().reset_debug_state();
        }

        Ok(outcome)
    }

    /// Re-apply a saved [`DebugStatus`].
    ///
    /// Every trigger field and condition is checked before anything is
    /// changed. A saved `naninf` trigger the table cannot honour comes back
    /// as a warning.
    #[tracing::instrument(skip_all, fields(breakpoints = saved.bkpt.len()))]
    pub fn restore(&mut self, saved: &DebugStatus) -> Result<Vec<CommandWarning>> {
        let errs = extract_id_list("errs", saved.errs.as_ref())?;
        let caught = extract_id_list("caught", saved.caught.as_ref())?;
        let warn = extract_id_list("warn", saved.warn.as_ref())?;
        for info in &saved.bkpt {
            self.check_condition(CommandKind::Stop, &info.cond)?;
        }

        for info in &saved.bkpt {
            let (class, name) = split_routine_key(&info.name);
            self.add(name, class, &LineMap::from([(0, info.line)]), &info.cond)?;
        }

        self.triggers.restore(&errs, &caught, &warn, saved.intr);
        let mut warnings = Vec::new();
        if saved.naninf {
            if self.options.naninf_supported {
                self.triggers.naninf = true;
            } else {
                let warning = CommandWarning::UnsupportedCategory {
                    who: CommandKind::Stop,
                    category: EventCategory::NanInf.to_string(),
                };
                tracing::warn!(%warning, "ignoring saved trigger");
                warnings.push(warning);
            }
        }
        self.session_mut().reset_debug_state();
        Ok(warnings)
    }

    /// Run a command line such as `stop in F at 60 if x > 3`.
    pub fn execute(&mut self, line: &str) -> Result<CommandOutput> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));

        match command {
            "stop" => {
                let args = split_command_line(CommandKind::Stop, rest)?;
                self.stop(&args).map(CommandOutput::Stop)
            }
            "clear" => {
                let args = split_command_line(CommandKind::Clear, rest)?;
                self.clear(&args).map(CommandOutput::Clear)
            }
            "status" => {
                let filter = rest.trim();
                let filter = (!filter.is_empty()).then_some(filter);
                Ok(CommandOutput::Status(self.status(filter)))
            }
            other => Err(BreakpointError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::breakpoints::BreakpointEntry;
    use crate::debugger::routines::{InMemoryDirectory, RoutineSource};
    use crate::debugger::session::SessionState;
    use crate::debugger::triggers::TriggerState;
    use crate::TableOptions;

    fn table() -> BreakpointTable {
        let mut directory = InMemoryDirectory::new();
        directory.insert(
            RoutineSource::function("F", 1, 200)
                .with_statements([2, 10, 20, 90])
                .with_subroutine(RoutineSource::function("helper", 50, 80).with_statements([55, 60])),
        );
        directory.insert_method(
            "Account",
            RoutineSource::function("deposit", 1, 12).with_statements([3, 4, 7]),
        );
        BreakpointTable::new(directory, SessionState::new())
    }

    fn words(line: &str) -> Vec<CommandArg> {
        line.split_whitespace().map(CommandArg::text).collect()
    }

    #[test]
    fn stop_without_lines_uses_default_line() {
        let mut t = table();
        let outcome = t.stop(&words("in F")).unwrap();
        assert_eq!(outcome.lines, LineMap::from([(0, 2)]));
    }

    #[test]
    fn stop_in_method() {
        let mut t = table();
        let outcome = t.stop(&words("in Account at deposit")).unwrap();
        assert_eq!(outcome.lines, LineMap::from([(0, 3)]));
        assert_eq!(t.files().collect::<Vec<_>>(), ["@Account/deposit"]);
    }

    #[test]
    fn stop_uses_active_routine() {
        let mut t = table();
        t.session_mut().suspend_in("F");
        let outcome = t.stop(&words("at 60")).unwrap();
        assert_eq!(outcome.lines, LineMap::from([(0, 60)]));
    }

    #[test]
    fn clear_all_resets_triggers() {
        let mut t = table();
        t.stop(&words("F 10")).unwrap();
        t.stop(&words("if warning")).unwrap();
        t.stop(&words("if interrupt")).unwrap();

        let outcome = t.clear(&words("all")).unwrap();
        assert_eq!(outcome.removed, 1);
        assert!(t.triggers().stop_reasons().is_empty());
        assert_eq!(t.files().count(), 0);
    }

    #[test]
    fn clear_one_identifier() {
        let mut t = table();
        t.stop(&words("if error A:one")).unwrap();
        t.stop(&words("if error B:two")).unwrap();
        t.clear(&words("if error A:one")).unwrap();
        assert!(t.triggers().should_stop_on_error("B:two"));
        assert!(!t.triggers().should_stop_on_error("A:one"));
    }

    #[test]
    fn naninf_warning_is_not_an_error() {
        let mut t = table();
        let outcome = t.stop(&words("if naninf")).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].to_string(), "stop: condition 'naninf' not yet supported");

        let mut t = table().with_options(TableOptions {
            naninf_supported: true,
            ..TableOptions::default()
        });
        assert!(t.stop(&words("if naninf")).unwrap().warnings.is_empty());
        assert!(t.triggers().naninf());
    }

    #[test]
    fn status_round_trips_through_restore() {
        let mut t = table();
        t.execute("stop in F at 10 60 if x > 1").unwrap();
        t.execute("stop in Account at deposit").unwrap();
        t.execute("stop if caught error Io:closed").unwrap();
        t.execute("stop if error").unwrap();
        let saved = t.status(None).to_debug_status();

        let mut fresh = table();
        assert!(fresh.restore(&saved).unwrap().is_empty());
        assert_eq!(fresh.list(None), t.list(None));
        assert_eq!(fresh.triggers(), t.triggers());
    }

    #[test]
    fn condition_quotes_reach_the_breakpoint() {
        let mut t = table();
        t.execute("stop F 10 if s == 'abc'").unwrap();
        t.execute("stop F 20 if x' > 0").unwrap();
        assert_eq!(
            t.breakpoints_in("F"),
            vec![
                BreakpointEntry::new(10, "s == 'abc'"),
                BreakpointEntry::new(20, "x' > 0"),
            ]
        );
    }

    #[test]
    fn restore_reports_unsupported_naninf() {
        let saved = DebugStatus::from_json_str(r#"{"bkpt": [], "naninf": true}"#).unwrap();

        let mut t = table();
        let warnings = t.restore(&saved).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "stop: condition 'naninf' not yet supported");
        assert!(!t.triggers().naninf());

        let mut t = table().with_options(TableOptions {
            naninf_supported: true,
            ..TableOptions::default()
        });
        assert!(t.restore(&saved).unwrap().is_empty());
        assert!(t.triggers().naninf());
    }

    #[test]
    fn restore_rejects_bad_field_before_changing_anything() {
        let mut t = table();
        let saved = DebugStatus::from_json_str(
            r#"{"bkpt": [{"name": "F", "line": 10}], "warn": 7}"#,
        )
        .unwrap();
        assert!(matches!(t.restore(&saved), Err(BreakpointError::InvalidField(_))));
        assert_eq!(t.files().count(), 0);
        assert_eq!(*t.triggers().warning(), TriggerState::Disabled);
    }

    #[test]
    fn execute_dispatch() {
        let mut t = table();
        assert!(matches!(
            t.execute("stop F 10").unwrap(),
            CommandOutput::Stop(StopOutcome { .. })
        ));
        match t.execute("status F").unwrap() {
            CommandOutput::Status(report) => {
                assert_eq!(report.render(), ["breakpoint in F at line 10"]);
            }
            other => panic!("unexpected output {other:?}"),
        }
        assert!(matches!(t.execute("step"), Err(BreakpointError::UnknownCommand(_))));
        assert_eq!(
            t.execute("clear").unwrap(),
            CommandOutput::Clear(ClearOutcome {
                removed: 1,
                warnings: Vec::new()
            })
        );
    }
}
