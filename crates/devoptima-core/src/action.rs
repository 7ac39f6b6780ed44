use std::collections::HashMap;

use devoptima_agent::SupportedModel;
use devoptima_protocol::Prompts;

use crate::{ActionReport, DEFAULT_MAX_ATTEMPTS};

/// A directive the workbench can run against a piece of source code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Refactor,
    Optimize,
    Transpile { target_language: String },
    Debug { error_log: String },
    Audit,
    BatchFix { fixes: Vec<String> },
    Simulate { chaos: bool },
    Tree,
    Diagram,
    Sequence,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Refactor => "refactor",
            Action::Optimize => "optimize",
            Action::Transpile { .. } => "transpile",
            Action::Debug { .. } => "debug",
            Action::Audit => "audit",
            Action::BatchFix { .. } => "batch-fix",
            Action::Simulate { .. } => "simulate",
            Action::Tree => "tree",
            Action::Diagram => "diagram",
            Action::Sequence => "sequence",
        }
    }

    /// System instruction for the first generation call
    pub fn instruction(&self) -> String {
        match self {
            Action::Refactor => Prompts::refactor(),
            Action::Optimize => Prompts::optimize(),
            Action::Transpile { target_language } => Prompts::transpile(target_language),
            Action::Debug { error_log } => Prompts::debug(error_log),
            Action::Audit => Prompts::audit(),
            Action::BatchFix { fixes } => Prompts::batch_fix(fixes),
            Action::Simulate { chaos } => Prompts::simulator(*chaos),
            Action::Tree => Prompts::tree(),
            Action::Diagram => Prompts::flowchart(),
            Action::Sequence => Prompts::sequence_diagram(),
        }
    }

    /// Actions whose output is Python and goes through the correction loop
    pub fn uses_correction_loop(&self) -> bool {
        matches!(
            self,
            Action::Refactor | Action::Optimize | Action::Debug { .. } | Action::BatchFix { .. }
        )
    }

    /// Actions that report complexity before and after
    pub fn reports_complexity(&self) -> bool {
        matches!(self, Action::Refactor | Action::Optimize)
    }

    /// Actions whose output is Mermaid text rather than marker sections
    pub fn is_diagram(&self) -> bool {
        matches!(self, Action::Diagram | Action::Sequence)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Transpile { target_language } => {
                write!(f, "{} ({})", self.name(), target_language)
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Request-scoped state for a series of actions over one source text
#[derive(Debug, Clone)]
pub struct ActionContext {
    source_text: String,
    pub model: SupportedModel,
    pub max_attempts: u32,
    reports: HashMap<Action, ActionReport>,
}

impl ActionContext {
    pub fn new(source_text: impl Into<String>, model: SupportedModel) -> Self {
        Self {
            source_text: source_text.into(),
            model,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            reports: HashMap::new(),
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Replace the source text. Cached reports describe the old text and are
    /// dropped.
    pub fn set_source_text(&mut self, source_text: impl Into<String>) {
        self.source_text = source_text.into();
        self.reports.clear();
    }

    /// Last report produced for `action` in this context
    pub fn report(&self, action: &Action) -> Option<&ActionReport> {
        self.reports.get(action)
    }

    pub fn store(&mut self, action: Action, report: ActionReport) {
        self.reports.insert(action, report);
    }

    pub fn cached_actions(&self) -> usize {
        self.reports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionStatus;

    #[test]
    fn test_loop_membership() {
        assert!(Action::Refactor.uses_correction_loop());
        assert!(Action::BatchFix { fixes: vec![] }.uses_correction_loop());
        assert!(!Action::Audit.uses_correction_loop());
        assert!(!Action::Transpile {
            target_language: "Rust".into()
        }
        .uses_correction_loop());
        assert!(Action::Sequence.is_diagram());
        assert!(Action::Optimize.reports_complexity());
        assert!(!Action::Debug {
            error_log: String::new()
        }
        .reports_complexity());
    }

    #[test]
    fn test_instruction_matches_action() {
        let transpile = Action::Transpile {
            target_language: "Go".into(),
        };
        assert!(transpile.instruction().contains("TARGET LANGUAGE: Go"));
        assert_eq!(transpile.to_string(), "transpile (Go)");
        assert!(Action::Audit.instruction().contains("---SECURITY_SCORE---"));
    }

    #[test]
    fn test_changing_source_clears_cache() {
        let mut context = ActionContext::new("x = 1", SupportedModel::default());
        context.store(
            Action::Audit,
            ActionReport::rejected(&Action::Audit, &context, "empty".into()),
        );
        assert_eq!(context.cached_actions(), 1);
        assert_eq!(
            context.report(&Action::Audit).map(|r| r.status),
            Some(ActionStatus::InvalidInput)
        );

        context.set_source_text("y = 2");
        assert_eq!(context.cached_actions(), 0);
        assert!(context.report(&Action::Audit).is_none());
    }
}
