use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use devoptima_agent::{Generator, RawResponse};
use devoptima_logging::{LogEvent, Logger};
use devoptima_protocol::extract_code;
use devoptima_validator::{ValidationOutcome, Validator};

use crate::context::CorrectionAttempt;
use crate::error::CorrectionError;
use crate::outcome::CorrectionOutcome;
use crate::state::AttemptState;
use crate::CorrectionContext;

const PROMPT_PREVIEW_CHARS: usize = 100;

/// Drives the generate, validate and repair cycle
pub struct CorrectionRunner<'a> {
    generator: &'a dyn Generator,
    validator: &'a dyn Validator,
    logger: Arc<Logger>,
}

/// What one attempt produced
struct AttemptResult {
    response: RawResponse,
    code: String,
    validation: ValidationOutcome,
    diagnostic: Option<String>,
}

impl<'a> CorrectionRunner<'a> {
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

    /// Run until a candidate validates or the attempt budget is spent.
    ///
    /// Makes at most `context.max_attempts` generation calls and never calls
    /// the generator again once a candidate is valid.
    pub async fn run(
        &self,
        mut context: CorrectionContext,
    ) -> Result<CorrectionOutcome, CorrectionError> {
        if context.max_attempts == 0 {
            return Err(CorrectionError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        self.logger.log(&LogEvent::CorrectionStarted {
            max_attempts: context.max_attempts,
        });

        let mut attempt = 1;
        loop {
            let result = self.run_attempt(&mut context, attempt).await;
            let state = AttemptState::after_validation(
                attempt,
                result.validation.is_valid(),
                context.max_attempts,
            );

            match state {
                AttemptState::Accepted(attempts) => {
                    self.logger
                        .log(&LogEvent::CorrectionAccepted { attempt: attempts });
                    let duration = context.total_duration();
                    return Ok(CorrectionOutcome::accepted(
                        attempts,
                        result.response,
                        context.history,
                        duration,
                    ));
                }
                AttemptState::Exhausted(attempts) => {
                    self.logger.log(&LogEvent::AttemptsExhausted { attempts });
                    warn!(attempts, "No valid candidate within the attempt budget");
                    let duration = context.total_duration();
                    return Ok(CorrectionOutcome::exhausted(
                        attempts,
                        result.response,
                        result.diagnostic.unwrap_or_default(),
                        context.history,
                        duration,
                    ));
                }
                AttemptState::Generating(next) => {
                    info!(next_attempt = next, "Requesting a corrected candidate");
                    context.reject(result.code, result.diagnostic.unwrap_or_default());
                    attempt = next;
                }
            }
        }
    }

    /// Generate one candidate and validate it
    async fn run_attempt(&self, context: &mut CorrectionContext, attempt: u32) -> AttemptResult {
        let request = context.next_request();

        self.logger.log(&LogEvent::GenerationStarted {
            attempt,
            prompt_preview: request.instruction.chars().take(PROMPT_PREVIEW_CHARS).collect(),
        });

        debug!(attempt, generator = self.generator.name(), "Generating candidate");
        let response = self.generator.generate(&request).await;

        self.logger.log(&LogEvent::GenerationCompleted {
            attempt,
            is_error: response.is_error,
            duration_secs: response.duration.as_secs_f64(),
            chars: response.text.chars().count(),
        });

        // A transport failure is not code; its text becomes the diagnostic
        let (code, validation, diagnostic) = if response.is_error {
            let validation = ValidationOutcome::invalid(response.text.clone(), None);
            (String::new(), validation, Some(response.text.clone()))
        } else {
            let code = extract_code(&response.text);
            let validation = self.validator.validate(&code);
            let diagnostic = validation.diagnostic();
            (code, validation, diagnostic)
        };

        match &validation {
            ValidationOutcome::Valid => {
                self.logger.log(&LogEvent::ValidationPassed { attempt });
            }
            ValidationOutcome::Invalid { message, line } => {
                self.logger.log(&LogEvent::ValidationFailed {
                    attempt,
                    message: message.clone(),
                    line: *line,
                });
            }
        }

        context.push_attempt(CorrectionAttempt {
            attempt_number: attempt,
            instruction: request.instruction,
            response: response.clone(),
            extracted_code: code.clone(),
            validation: validation.clone(),
            timestamp: Utc::now(),
        });

        AttemptResult {
            response,
            code,
            validation,
            diagnostic,
        }
    }
}
