use super::breakpoints::{BreakpointEntry, StatementStore};
use super::condition::validate_condition;
use super::resolver::find_routine_by_line;
use super::routines::{
    routine_key, split_routine_key, split_subroutine, InMemoryDirectory, RoutineDirectory,
    RoutineId, RoutineTree,
};
use super::session::{DebugSession, SessionState};
use super::status::{BreakpointListing, StatusReport};
use super::triggers::TriggerRegistry;
use crate::config::TableOptions;
use crate::error::{BreakpointError, Result};
use crate::parser::{CommandKind, LineMap, ScriptParser, StatementParser};
use std::collections::BTreeSet;

/// All breakpoints and stop triggers of one interpreter.
///
/// Breakpoints live in the routine bodies owned by the directory. The table
/// keeps the set of files that have any, which is what listing and
/// clearing iterate over.
pub struct BreakpointTable<D = InMemoryDirectory, S = SessionState> {
    directory: D,
    session: S,
    files: BTreeSet<String>,
    pub(crate) triggers: TriggerRegistry,
    parser: Box<dyn StatementParser>,
    pub(crate) options: TableOptions,
}

impl<D: RoutineDirectory, S: DebugSession> BreakpointTable<D, S> {
    pub fn new(directory: D, session: S) -> Self {
        Self {
            directory,
            session,
            files: BTreeSet::new(),
            triggers: TriggerRegistry::default(),
            parser: Box::new(ScriptParser),
            options: TableOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a different parser for condition checks.
    pub fn with_parser(mut self, parser: impl StatementParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Files with at least one breakpoint.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub(crate) fn check_condition(&self, who: CommandKind, condition: &str) -> Result<()> {
        validate_condition(&*self.parser, condition)
            .map_err(|source| BreakpointError::Condition { who, source })
    }

    /// Insert a breakpoint for every requested line of `name`.
    ///
    /// `name` may address a sub-routine as `F>helper`; resolution then
    /// starts there. The result maps each request index to the line the
    /// breakpoint landed on, or `0` if the line is outside every routine.
    pub fn add(
        &mut self,
        name: &str,
        class: Option<&str>,
        lines: &LineMap,
        condition: &str,
    ) -> Result<LineMap> {
        let who = CommandKind::Stop;
        self.check_condition(who, condition)?;

        let (file, sub) = split_subroutine(name);
        let key = routine_key(file, class);
        let unknown = || BreakpointError::UnknownRoutine {
            who,
            name: name.to_string(),
        };

        let tree = self.directory.resolve_mut(file, class).ok_or_else(unknown)?;
        let start = match sub {
            Some(sub) => tree.find_subroutine(sub).ok_or_else(unknown)?,
            None => RoutineId::ROOT,
        };

        let mut inserted = LineMap::new();
        for (&index, &line) in lines {
            let landed = find_routine_by_line(tree, start, line)
                .and_then(|id| tree.body_mut(id).add_breakpoint(line, condition));
            match landed {
                Some(at) => {
                    tracing::debug!(file = %key, requested = line, line = at, "inserted breakpoint");
                    self.session.breakpoint_changed(&key, at, true);
                }
                None => tracing::debug!(file = %key, line, "no routine owns line"),
            }
            inserted.insert(index, landed.unwrap_or(0));
        }

        let has_breakpoints = tree.has_breakpoints();
        self.update_membership(&key, has_breakpoints);
        self.session.reset_debug_state();
        Ok(inserted)
    }

    /// Remove breakpoints from `name`, returning how many were removed.
    ///
    /// With no lines every breakpoint in the file goes. Otherwise the
    /// given lines are removed from the main routine and each sub-routine.
    /// A `F>helper` name limits removal to that sub-routine and what it
    /// contains.
    pub fn remove(&mut self, name: &str, class: Option<&str>, lines: &LineMap) -> Result<usize> {
        let who = CommandKind::Clear;
        let (file, sub) = split_subroutine(name);
        let key = routine_key(file, class);
        let unknown = || BreakpointError::UnknownRoutine {
            who,
            name: name.to_string(),
        };

        let tree = self.directory.resolve_mut(file, class).ok_or_else(unknown)?;
        let start = match sub {
            Some(sub) => tree.find_subroutine(sub).ok_or_else(unknown)?,
            None => RoutineId::ROOT,
        };

        let removed = remove_from_tree(tree, start, lines, &key, &mut self.session);
        let has_breakpoints = tree.has_breakpoints();
        self.update_membership(&key, has_breakpoints);
        tracing::debug!(file = %key, removed, "removed breakpoints");
        self.session.reset_debug_state();
        Ok(removed)
    }

    /// Remove every breakpoint in every file.
    pub fn remove_all(&mut self) -> usize {
        let files: Vec<String> = self.files.iter().cloned().collect();
        let mut removed = 0;

        for key in files {
            let (class, name) = split_routine_key(&key);
            match self.directory.resolve_mut(name, class) {
                Some(tree) => {
                    removed += remove_from_tree(tree, RoutineId::ROOT, &LineMap::new(), &key, &mut self.session);
                }
                None => tracing::warn!(file = %key, "file with breakpoints is no longer in the directory"),
            }
            self.files.remove(&key);
        }

        tracing::debug!(removed, "cleared all breakpoints");
        self.session.reset_debug_state();
        removed
    }

    /// Breakpoints per routine, optionally only for one file.
    pub fn list(&self, filter: Option<&str>) -> BreakpointListing {
        let filter = filter.map(|f| split_subroutine(f).0);
        let files: Vec<&String> = self
            .files
            .iter()
            .filter(|key| filter.map_or(true, |f| key.as_str() == f))
            .collect();

        let mut listing = BreakpointListing::new();
        for key in files {
            let (class, name) = split_routine_key(key);
            let Some(tree) = self.directory.resolve(name, class) else {
                continue;
            };

            let entries = tree.node(RoutineId::ROOT).body().breakpoints();
            if !entries.is_empty() {
                listing.push((key.clone(), entries));
            }
            for id in tree.descendants(RoutineId::ROOT) {
                let entries = tree.node(id).body().breakpoints();
                if !entries.is_empty() {
                    listing.push((format!("{key}>{}", tree.node(id).name), entries));
                }
            }
        }
        listing
    }

    /// Breakpoints of one routine key, as shown by [`list`](Self::list).
    pub fn breakpoints_in(&self, key: &str) -> Vec<BreakpointEntry> {
        self.list(Some(key))
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, entries)| entries)
            .unwrap_or_default()
    }

    /// Breakpoint listing plus the enabled stop triggers.
    pub fn status(&self, filter: Option<&str>) -> StatusReport {
        StatusReport {
            breakpoints: self.list(filter),
            stops: self.triggers.stop_reasons(),
        }
    }

    fn update_membership(&mut self, key: &str, has_breakpoints: bool) {
        if has_breakpoints {
            self.files.insert(key.to_string());
        } else {
            self.files.remove(key);
        }
    }
}

fn remove_from_tree<St, S>(
    tree: &mut RoutineTree<St>,
    start: RoutineId,
    lines: &LineMap,
    key: &str,
    session: &mut S,
) -> usize
where
    St: StatementStore,
    S: DebugSession,
{
    let mut targets = vec![start];
    targets.extend(tree.descendants(start));

    let mut removed = 0;
    for id in targets {
        let body = tree.body_mut(id);
        if lines.is_empty() {
            let gone = body.breakpoints().len();
            for line in body.remove_all_breakpoints() {
                session.breakpoint_changed(key, line, false);
            }
            removed += gone;
        } else {
            for &line in lines.values() {
                let gone = body.remove_breakpoint(line);
                if gone > 0 {
                    session.breakpoint_changed(key, line, false);
                    removed += gone;
                }
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::routines::RoutineSource;
    use crate::error::ConditionError;

    fn table() -> BreakpointTable {
        let mut directory = InMemoryDirectory::new();
        directory.insert(
            RoutineSource::function("F", 1, 200)
                .with_statements([2, 10, 20, 90, 150])
                .with_subroutine(RoutineSource::function("helper", 50, 80).with_statements([55, 60, 70])),
        );
        directory.insert(RoutineSource::script("s", 1, 20).with_statements(1..=20));
        BreakpointTable::new(directory, SessionState::new())
    }

    fn at(lines: &[u32]) -> LineMap {
        lines.iter().copied().enumerate().collect()
    }

    #[test]
    fn add_resolves_into_subroutine() {
        let mut t = table();
        assert_eq!(t.add("F", None, &at(&[60]), "").unwrap(), at(&[60]));
        assert_eq!(
            t.list(None),
            vec![("F>helper".to_string(), vec![BreakpointEntry::new(60, "")])]
        );
        assert_eq!(t.files().collect::<Vec<_>>(), ["F"]);
    }

    #[test]
    fn add_snaps_and_reports_unresolved_as_zero() {
        let mut t = table();
        let inserted = t.add("F", None, &at(&[11, 500]), "").unwrap();
        assert_eq!(inserted, LineMap::from([(0, 20), (1, 0)]));
    }

    #[test]
    fn invalid_condition_changes_nothing() {
        let mut t = table();
        let err = t.add("F", None, &at(&[10]), "y=5").unwrap_err();
        assert!(matches!(
            err,
            BreakpointError::Condition {
                source: ConditionError::Assignment { .. },
                ..
            }
        ));
        assert!(t.list(None).is_empty());
        assert_eq!(t.session().resets(), 0);
    }

    #[test]
    fn nested_condition_fails_without_inserting() {
        let mut t = table();
        for n in [200, 10_000] {
            let condition = format!("{}x{}", "(".repeat(n), ")".repeat(n));
            assert!(matches!(
                t.add("F", None, &at(&[10]), &condition),
                Err(BreakpointError::Condition {
                    source: ConditionError::Parse { .. },
                    ..
                })
            ));
        }
        assert_eq!(t.files().count(), 0);
    }

    #[test]
    fn unknown_routine() {
        let mut t = table();
        assert!(matches!(
            t.add("nope", None, &at(&[1]), ""),
            Err(BreakpointError::UnknownRoutine { .. })
        ));
        assert!(matches!(
            t.add("F>nope", None, &at(&[1]), ""),
            Err(BreakpointError::UnknownRoutine { .. })
        ));
    }

    #[test]
    fn qualified_name_starts_at_subroutine() {
        let mut t = table();
        // line 10 is in F's own body, but the search starts at helper
        let inserted = t.add("F>helper", None, &at(&[10]), "").unwrap();
        assert_eq!(inserted, at(&[55]));
        assert_eq!(t.files().collect::<Vec<_>>(), ["F"]);
    }

    #[test]
    fn removing_last_breakpoint_drops_file() {
        let mut t = table();
        t.add("F", None, &at(&[10, 60]), "").unwrap();
        assert_eq!(t.remove("F", None, &at(&[10])).unwrap(), 1);
        assert_eq!(t.files().count(), 1);
        assert_eq!(t.remove("F", None, &at(&[60])).unwrap(), 1);
        assert_eq!(t.files().count(), 0);
        assert_eq!(t.remove("F", None, &at(&[60])).unwrap(), 0);
    }

    #[test]
    fn remove_whole_file() {
        let mut t = table();
        t.add("F", None, &at(&[10, 60, 150]), "").unwrap();
        assert_eq!(t.remove("F", None, &LineMap::new()).unwrap(), 3);
        assert!(t.list(Some("F")).is_empty());
    }

    #[test]
    fn remove_all_clears_every_file() {
        let mut t = table();
        t.add("F", None, &at(&[10]), "").unwrap();
        t.add("s", None, &at(&[3, 4]), "k > 2").unwrap();
        assert_eq!(t.remove_all(), 3);
        assert_eq!(t.files().count(), 0);
        assert!(t.list(None).is_empty());
    }

    #[test]
    fn listing_filter_and_order() {
        let mut t = table();
        t.add("F", None, &at(&[60, 10]), "").unwrap();
        t.add("s", None, &at(&[3]), "").unwrap();
        let keys: Vec<String> = t.list(None).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["F", "F>helper", "s"]);
        assert_eq!(t.list(Some("s")).len(), 1);
        assert_eq!(t.breakpoints_in("F>helper"), vec![BreakpointEntry::new(60, "")]);
    }

    #[test]
    fn session_is_notified() {
        let mut t = table();
        t.add("F", None, &at(&[60]), "").unwrap();
        t.remove("F", None, &LineMap::new()).unwrap();
        let events = t.session_mut().take_events();
        assert_eq!(events.len(), 2);
        assert!(events[0].inserted);
        assert!(!events[1].inserted);
        assert_eq!(t.session().resets(), 2);
    }
}
