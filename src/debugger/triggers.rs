use super::status::StopReason;
use crate::config::TableOptions;
use crate::error::{CommandWarning, FieldError};
use crate::parser::{CommandKind, EventCategory, EventClause};
use serde_json::Value;
use std::collections::BTreeSet;

/// Whether a category of runtime events suspends execution.
///
/// "Enabled for all" and "enabled for none" are different things, so the
/// identifier set alone cannot carry the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TriggerState {
    #[default]
    Disabled,
    EnabledForAll,
    EnabledFor(BTreeSet<String>),
}

/// A requested trigger setting, as read from a bulk restore field.
pub type IdSpec = TriggerState;

impl TriggerState {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, TriggerState::Disabled)
    }

    /// Would an event with this identifier stop execution?
    pub fn matches(&self, id: &str) -> bool {
        match self {
            TriggerState::Disabled => false,
            TriggerState::EnabledForAll => true,
            TriggerState::EnabledFor(ids) => ids.contains(id),
        }
    }

    /// `None` enables everything. An identifier narrows an enable-all down
    /// to just that identifier.
    pub fn enable(&mut self, id: Option<&str>) {
        match (id, &mut *self) {
            (None, _) => *self = TriggerState::EnabledForAll,
            (Some(id), TriggerState::EnabledFor(ids)) => {
                ids.insert(id.to_string());
            }
            (Some(id), _) => *self = TriggerState::EnabledFor(BTreeSet::from([id.to_string()])),
        }
    }

    /// `None` disables everything. Removing the last identifier disables
    /// the category rather than widening it to all.
    pub fn disable(&mut self, id: Option<&str>) {
        match (id, &mut *self) {
            (Some(id), TriggerState::EnabledFor(ids)) => {
                ids.remove(id);
                if ids.is_empty() {
                    *self = TriggerState::Disabled;
                }
            }
            _ => *self = TriggerState::Disabled,
        }
    }

    /// Merge a restored setting. Restoring only ever enables.
    fn restore(&mut self, setting: &IdSpec) {
        match setting {
            TriggerState::Disabled => {}
            TriggerState::EnabledForAll => self.enable(None),
            TriggerState::EnabledFor(ids) => {
                for id in ids {
                    self.enable(Some(id));
                }
            }
        }
    }
}

/// Read one `errs`/`caught`/`warn` field of a bulk restore request.
///
/// An absent field leaves the category alone. An empty value enables the
/// category for all identifiers. A list of strings enables those.
pub fn extract_id_list(field: &'static str, value: Option<&Value>) -> Result<IdSpec, FieldError> {
    let invalid = |reason: &str| FieldError {
        field,
        reason: reason.to_string(),
    };

    match value {
        None => Ok(TriggerState::Disabled),
        Some(Value::Null) => Ok(TriggerState::EnabledForAll),
        Some(Value::String(s)) if s.is_empty() => Ok(TriggerState::EnabledForAll),
        Some(Value::Array(items)) if items.is_empty() => Ok(TriggerState::EnabledForAll),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid("identifiers must be strings"))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(TriggerState::EnabledFor),
        Some(_) => Err(invalid("expected an empty value or a list of identifiers")),
    }
}

/// Every reason to stop other than a line breakpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerRegistry {
    pub(crate) error: TriggerState,
    pub(crate) caught: TriggerState,
    pub(crate) warning: TriggerState,
    pub(crate) interrupt: bool,
    pub(crate) naninf: bool,
}

impl TriggerRegistry {
    pub fn error(&self) -> &TriggerState {
        &self.error
    }

    pub fn caught(&self) -> &TriggerState {
        &self.caught
    }

    pub fn warning(&self) -> &TriggerState {
        &self.warning
    }

    pub fn interrupt(&self) -> bool {
        self.interrupt
    }

    pub fn naninf(&self) -> bool {
        self.naninf
    }

    pub fn should_stop_on_error(&self, id: &str) -> bool {
        self.error.matches(id)
    }

    pub fn should_stop_on_caught(&self, id: &str) -> bool {
        self.caught.matches(id)
    }

    pub fn should_stop_on_warning(&self, id: &str) -> bool {
        self.warning.matches(id)
    }

    /// Apply an `if <event>` clause of a `stop` or `clear` command.
    pub fn apply(
        &mut self,
        who: CommandKind,
        clause: &EventClause,
        options: &TableOptions,
    ) -> Option<CommandWarning> {
        let on = who.enables();
        let id = clause.id.as_deref();

        let state = match clause.category {
            EventCategory::Error => &mut self.error,
            EventCategory::CaughtError => &mut self.caught,
            EventCategory::Warning => &mut self.warning,
            EventCategory::Interrupt => {
                self.interrupt = on;
                return None;
            }
            EventCategory::NanInf => {
                if !options.naninf_supported {
                    let warning = CommandWarning::UnsupportedCategory {
                        who,
                        category: clause.category.to_string(),
                    };
                    tracing::warn!(%warning, "ignoring event clause");
                    return Some(warning);
                }
                self.naninf = on;
                return None;
            }
        };

        if on {
            state.enable(id);
        } else {
            state.disable(id);
        }

        // stopping on any error also stops on interrupt
        if clause.category == EventCategory::Error && id.is_none() && options.error_stops_on_interrupt {
            self.interrupt = on;
        }

        tracing::debug!(category = %clause.category, ?id, on, "updated stop trigger");
        None
    }

    /// Merge the trigger fields of a saved status.
    pub fn restore(&mut self, errs: &IdSpec, caught: &IdSpec, warn: &IdSpec, intr: bool) {
        self.error.restore(errs);
        self.caught.restore(caught);
        self.warning.restore(warn);
        if intr {
            self.interrupt = true;
        }
    }

    /// Every enabled trigger, one entry per identifier.
    pub fn stop_reasons(&self) -> Vec<StopReason> {
        let mut out = Vec::new();
        for (category, state) in [
            (EventCategory::Error, &self.error),
            (EventCategory::CaughtError, &self.caught),
            (EventCategory::Warning, &self.warning),
        ] {
            match state {
                TriggerState::Disabled => {}
                TriggerState::EnabledForAll => out.push(StopReason::all(category)),
                TriggerState::EnabledFor(ids) => {
                    out.extend(ids.iter().map(|id| StopReason::only(category, id.as_str())))
                }
            }
        }
        if self.interrupt {
            out.push(StopReason::all(EventCategory::Interrupt));
        }
        if self.naninf {
            out.push(StopReason::all(EventCategory::NanInf));
        }
        out
    }

    /// Turn off every trigger category.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clause(category: EventCategory, id: Option<&str>) -> EventClause {
        EventClause {
            category,
            id: id.map(str::to_string),
        }
    }

    #[test]
    fn enable_then_ids_accumulate() {
        let mut state = TriggerState::Disabled;
        state.enable(Some("A:one"));
        state.enable(Some("B:two"));
        assert_eq!(
            state,
            TriggerState::EnabledFor(BTreeSet::from(["A:one".into(), "B:two".into()]))
        );
    }

    #[test]
    fn removing_last_id_disables() {
        let mut state = TriggerState::Disabled;
        state.enable(Some("A:one"));
        state.disable(Some("A:one"));
        assert_eq!(state, TriggerState::Disabled);
    }

    #[test]
    fn id_after_enable_all_narrows() {
        let mut state = TriggerState::Disabled;
        state.enable(None);
        state.enable(Some("X:bad"));
        assert_eq!(state, TriggerState::EnabledFor(BTreeSet::from(["X:bad".into()])));
        assert!(!state.matches("Y:other"));
    }

    #[test]
    fn unconditional_error_toggles_interrupt() {
        let options = TableOptions::default();
        let mut registry = TriggerRegistry::default();
        registry.apply(CommandKind::Stop, &clause(EventCategory::Error, None), &options);
        assert!(registry.interrupt());
        assert!(registry.should_stop_on_error("Any:thing"));

        registry.apply(CommandKind::Clear, &clause(EventCategory::Error, None), &options);
        assert!(!registry.interrupt());
        assert!(!registry.error().is_enabled());
    }

    #[test]
    fn error_with_id_leaves_interrupt_alone() {
        let mut registry = TriggerRegistry::default();
        registry.apply(
            CommandKind::Stop,
            &clause(EventCategory::Error, Some("X:bad")),
            &TableOptions::default(),
        );
        assert!(!registry.interrupt());
    }

    #[test]
    fn naninf_unsupported_is_a_warning() {
        let mut registry = TriggerRegistry::default();
        let warning = registry.apply(
            CommandKind::Stop,
            &clause(EventCategory::NanInf, None),
            &TableOptions::default(),
        );
        assert!(matches!(warning, Some(CommandWarning::UnsupportedCategory { .. })));
        assert!(!registry.naninf());

        let options = TableOptions {
            naninf_supported: true,
            ..TableOptions::default()
        };
        assert!(registry
            .apply(CommandKind::Stop, &clause(EventCategory::NanInf, None), &options)
            .is_none());
        assert!(registry.naninf());
    }

    #[test]
    fn reasons_follow_state() {
        let options = TableOptions::default();
        let mut registry = TriggerRegistry::default();
        assert!(registry.stop_reasons().is_empty());

        registry.apply(CommandKind::Stop, &clause(EventCategory::Warning, Some("W:a")), &options);
        registry.apply(CommandKind::Stop, &clause(EventCategory::Warning, Some("W:b")), &options);
        registry.apply(CommandKind::Stop, &clause(EventCategory::CaughtError, None), &options);
        assert_eq!(
            registry.stop_reasons(),
            [
                StopReason::all(EventCategory::CaughtError),
                StopReason::only(EventCategory::Warning, "W:a"),
                StopReason::only(EventCategory::Warning, "W:b"),
            ]
        );

        registry.clear_all();
        assert!(registry.stop_reasons().is_empty());
    }

    #[test]
    fn extract_id_list_shapes() {
        assert_eq!(extract_id_list("errs", None).unwrap(), TriggerState::Disabled);
        assert_eq!(
            extract_id_list("errs", Some(&json!(""))).unwrap(),
            TriggerState::EnabledForAll
        );
        assert_eq!(
            extract_id_list("warn", Some(&json!(["W:a", "W:b"]))).unwrap(),
            TriggerState::EnabledFor(BTreeSet::from(["W:a".into(), "W:b".into()]))
        );
        let err = extract_id_list("caught", Some(&json!(42))).unwrap_err();
        assert_eq!(err.field, "caught");
        assert!(extract_id_list("caught", Some(&json!(["ok", 1]))).is_err());
    }
}
