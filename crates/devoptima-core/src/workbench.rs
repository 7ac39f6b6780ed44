use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use devoptima_agent::{GenerationRequest, Generator, RawResponse};
use devoptima_logging::{LogEvent, Logger};
use devoptima_protocol::{parse, strip_fences, ParsedResult};
use devoptima_validator::{average_complexity, Validator};

use crate::{Action, ActionContext, CorrectionContext, CorrectionOutcome, CorrectionRunner};

/// How an action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Completed,
    /// The correction loop ran out of attempts without valid code
    Exhausted,
    /// The completion service could not produce a response
    GenerationFailed,
    /// Source text was empty or did not parse; nothing was generated
    InvalidInput,
}

impl ActionStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            ActionStatus::Completed => 0,
            ActionStatus::Exhausted => 1,
            ActionStatus::GenerationFailed => 2,
            ActionStatus::InvalidInput => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Completed => "completed",
            ActionStatus::Exhausted => "exhausted",
            ActionStatus::GenerationFailed => "generation_failed",
            ActionStatus::InvalidInput => "invalid_input",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Average cyclomatic complexity of the input and of the generated code
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplexityDelta {
    pub before: f64,
    pub after: f64,
}

impl ComplexityDelta {
    pub fn change(&self) -> f64 {
        self.after - self.before
    }
}

/// Everything one action produced
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub action: String,
    pub model: String,
    pub status: ActionStatus,
    /// Generation calls made
    pub attempts: u32,
    pub result: ParsedResult,
    /// Mermaid source for diagram actions
    pub diagram: Option<String>,
    pub complexity: Option<ComplexityDelta>,
    pub error: Option<String>,
    pub duration_secs: f64,
}

impl ActionReport {
    pub(crate) fn rejected(action: &Action, context: &ActionContext, message: String) -> Self {
        Self {
            action: action.to_string(),
            model: context.model.to_string(),
            status: ActionStatus::InvalidInput,
            attempts: 0,
            result: ParsedResult::default(),
            diagram: None,
            complexity: None,
            error: Some(message),
            duration_secs: 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Completed
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

/// Runs actions against the source text held in an [`ActionContext`]
pub struct Workbench<'a> {
    generator: &'a dyn Generator,
    validator: &'a dyn Validator,
    logger: Arc<Logger>,
}

impl<'a> Workbench<'a> {
    pub fn new(
        generator: &'a dyn Generator,
        validator: &'a dyn Validator,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            generator,
            validator,
            logger,
        }
    }

    /// Run `action`, store its report in `context` and return it
    pub async fn execute(&self, action: &Action, context: &mut ActionContext) -> ActionReport {
        let started = Instant::now();
        self.logger.log(&LogEvent::ActionStarted {
            action: action.to_string(),
            model: context.model.to_string(),
            source_lines: context.source_text().lines().count(),
        });

        let mut report = self.run(action, context).await;
        report.duration_secs = started.elapsed().as_secs_f64();

        self.logger.log(&LogEvent::ActionCompleted {
            action: report.action.clone(),
            status: report.status.to_string(),
            duration_secs: report.duration_secs,
        });

        context.store(action.clone(), report.clone());
        report
    }

    async fn run(&self, action: &Action, context: &ActionContext) -> ActionReport {
        let source = context.source_text();
        if source.trim().is_empty() {
            return ActionReport::rejected(action, context, "Source text is empty".to_string());
        }

        // Input is checked before anything is sent to the model
        if let Some(diagnostic) = self.validator.validate(source).diagnostic() {
            debug!(
                action = action.name(),
                language = self.validator.language(),
                %diagnostic,
                "Rejecting unparsable input"
            );
            return ActionReport::rejected(action, context, diagnostic);
        }

        let (response, attempts, status, error) = if action.uses_correction_loop() {
            let correction = CorrectionContext::new(action.instruction(), source, context.model)
                .with_max_attempts(context.max_attempts);
            let runner = CorrectionRunner::new(self.generator, self.validator, self.logger.clone());
            match runner.run(correction).await {
                Ok(outcome) => Self::settle(outcome),
                Err(e) => return ActionReport::rejected(action, context, e.to_string()),
            }
        } else {
            let request = GenerationRequest::new(action.instruction(), source, context.model);
            let response = self.generator.generate(&request).await;
            if response.is_error {
                let error = Some(response.text.clone());
                (response, 1, ActionStatus::GenerationFailed, error)
            } else {
                (response, 1, ActionStatus::Completed, None)
            }
        };

        if status == ActionStatus::GenerationFailed {
            warn!(action = action.name(), "Generation failed");
        }

        let mut report = ActionReport {
            action: action.to_string(),
            model: context.model.to_string(),
            status,
            attempts,
            result: ParsedResult::default(),
            diagram: None,
            complexity: None,
            error,
            duration_secs: 0.0,
        };

        if response.is_error {
            return report;
        }

        if action.is_diagram() {
            report.diagram = Some(strip_fences(&response.text));
            return report;
        }

        report.result = parse(&response.text);
        if action.reports_complexity() && report.result.has_code() {
            report.complexity = Some(ComplexityDelta {
                before: average_complexity(source),
                after: average_complexity(&report.result.code),
            });
        }
        report
    }

    /// Map a loop outcome to the response, call count, status and error text
    fn settle(outcome: CorrectionOutcome) -> (RawResponse, u32, ActionStatus, Option<String>) {
        match outcome {
            CorrectionOutcome::Accepted {
                attempts, response, ..
            } => (response, attempts, ActionStatus::Completed, None),
            CorrectionOutcome::Exhausted {
                attempts,
                response,
                last_diagnostic,
                ..
            } => {
                let status = if response.is_error {
                    ActionStatus::GenerationFailed
                } else {
                    ActionStatus::Exhausted
                };
                (response, attempts, status, Some(last_diagnostic))
            }
        }
    }
}
