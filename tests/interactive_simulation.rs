// tests/interactive_simulation.rs
// Drives the table with command lines, the way a prompt would

use script_breakpoints::debugger::{
    CommandOutput, DebugStatus, InMemoryDirectory, RoutineSource, SessionState,
};
use script_breakpoints::{BreakpointError, BreakpointTable, TableOptions};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const ROUTINES: &str = r#"[
    {
        "name": "fit_model",
        "begin_line": 1,
        "end_line": 120,
        "statements": [3, 4, 5, 12, 20, 21, 100],
        "subroutines": [
            {"name": "residuals", "begin_line": 30, "end_line": 60, "statements": [31, 33, 40, 59]},
            {"name": "jacobian", "begin_line": 70, "end_line": 90, "statements": [71, 72, 88]}
        ]
    },
    {
        "name": "setup",
        "kind": "script",
        "begin_line": 1,
        "end_line": 15,
        "statements": [1, 2, 3, 7, 15]
    }
]"#;

#[cfg(test)]
mod interactive_tests {
    use super::*;

    fn start() -> BreakpointTable {
        let directory = InMemoryDirectory::from_json_str(ROUTINES).expect("routine snapshot");
        BreakpointTable::new(directory, SessionState::new())
    }

    fn screen(table: &mut BreakpointTable) -> Vec<String> {
        match table.execute("status").expect("status") {
            CommandOutput::Status(report) => report.render(),
            other => panic!("status returned {other:?}"),
        }
    }

    #[test]
    fn test_typical_session() {
        let mut table = start();

        table.execute("stop fit_model 4 35").unwrap();
        table.execute("stop in setup at 6 if n > 10").unwrap();
        table.execute("stop if warning Optim:maxiter").unwrap();

        assert_eq!(
            screen(&mut table),
            [
                "breakpoint in fit_model at line 4",
                "breakpoint in fit_model>residuals at line 40",
                "breakpoint in setup at line 7 if n > 10",
                "stop if warning Optim:maxiter",
            ]
        );

        table.execute("clear fit_model").unwrap();
        assert_eq!(
            screen(&mut table),
            [
                "breakpoint in setup at line 7 if n > 10",
                "stop if warning Optim:maxiter",
            ]
        );

        table.execute("clear all").unwrap();
        assert!(screen(&mut table).is_empty());
    }

    #[test]
    fn test_suspended_session_supplies_routine() {
        let mut table = start();
        table.session_mut().suspend_in("fit_model");

        match table.execute("stop at 71").unwrap() {
            CommandOutput::Stop(outcome) => assert_eq!(outcome.lines.get(&0), Some(&71)),
            other => panic!("unexpected {other:?}"),
        }

        table.session_mut().resume();
        let err = table.execute("stop at 71").unwrap_err();
        assert!(matches!(err, BreakpointError::CommandSyntax { .. }));
    }

    #[test]
    fn test_qualified_subroutine_name() {
        let mut table = start();
        table.execute("stop fit_model>jacobian 1").unwrap();
        assert_eq!(screen(&mut table), ["breakpoint in fit_model>jacobian at line 71"]);

        table.execute("clear fit_model>jacobian 71").unwrap();
        assert!(screen(&mut table).is_empty());
    }

    #[test]
    fn test_syntax_errors_leave_state_alone() {
        let mut table = start();
        table.execute("stop fit_model 4").unwrap();
        let resets = table.session().resets();

        for line in [
            "stop fit_model setup",
            "stop fit_model 4 if x == 1 at 5",
            "stop in",
            "stop fit_model 4 if y = 2",
            "stop if interrupt now",
            "stop if error A:b C:d",
            "stop fit_model 4 if \"unbalanced",
        ] {
            assert!(table.execute(line).is_err(), "{line} should fail");
        }

        assert_eq!(screen(&mut table), ["breakpoint in fit_model at line 4"]);
        assert_eq!(table.session().resets(), resets);
    }

    #[test]
    fn test_save_and_restore_between_sessions() {
        let mut table = start();
        table.execute("stop fit_model 12 33").unwrap();
        table.execute("stop if error").unwrap();
        table.execute("stop if caught error IO:eof").unwrap();

        let saved = table.execute("status").unwrap();
        let json = match saved {
            CommandOutput::Status(report) => report.to_debug_status().to_json().unwrap(),
            other => panic!("unexpected {other:?}"),
        };

        let mut next = start();
        let warnings = next.restore(&DebugStatus::from_json_str(&json).unwrap()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(screen(&mut next), screen(&mut table));
        assert!(next.triggers().interrupt());
    }

    #[test]
    fn test_naninf_depends_on_options() {
        let mut table = start();
        match table.execute("stop if naninf").unwrap() {
            CommandOutput::Stop(outcome) => assert_eq!(outcome.warnings.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(screen(&mut table).is_empty());

        let options = TableOptions::from_json_str(r#"{"naninf_supported": true}"#).unwrap();
        let mut table = start().with_options(options);
        table.execute("stop if naninf").unwrap();
        assert_eq!(screen(&mut table), ["stop if naninf"]);
    }
}
