use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

use devoptima_agent::{GenerationRequest, RawResponse, SupportedModel};
use devoptima_protocol::Prompts;
use devoptima_validator::ValidationOutcome;

/// Generation calls allowed per correction run unless overridden
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// State carried across the attempts of one correction run
#[derive(Debug, Clone)]
pub struct CorrectionContext {
    /// System instruction for the first attempt
    pub instruction: String,
    /// Code the instruction applies to
    pub source_text: String,
    pub model: SupportedModel,
    /// Upper bound on generation calls
    pub max_attempts: u32,
    /// Every attempt made so far, oldest first
    pub history: Vec<CorrectionAttempt>,
    started_at: Instant,
    rejection: Option<Rejection>,
}

/// The candidate that failed validation and why
#[derive(Debug, Clone)]
struct Rejection {
    code: String,
    diagnostic: String,
}

/// Record of a single generate-and-validate step
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionAttempt {
    pub attempt_number: u32,
    pub instruction: String,
    pub response: RawResponse,
    pub extracted_code: String,
    pub validation: ValidationOutcome,
    pub timestamp: DateTime<Utc>,
}

impl CorrectionContext {
    pub fn new(
        instruction: impl Into<String>,
        source_text: impl Into<String>,
        model: SupportedModel,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            source_text: source_text.into(),
            model,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            history: Vec::new(),
            started_at: Instant::now(),
            rejection: None,
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Instruction for the next attempt.
    ///
    /// The first attempt uses the original instruction. After a rejection the
    /// instruction is the correction template around the rejected code.
    pub fn current_instruction(&self) -> String {
        match self.rejection {
            None => self.instruction.clone(),
            Some(ref rejection) => {
                Prompts::build_correction_prompt(&rejection.code, &rejection.diagnostic)
            }
        }
    }

    /// Source text for the next attempt; empty once the instruction embeds
    /// the previous candidate
    pub fn current_source_text(&self) -> &str {
        match self.rejection {
            None => &self.source_text,
            Some(_) => "",
        }
    }

    pub fn next_request(&self) -> GenerationRequest {
        GenerationRequest::new(
            self.current_instruction(),
            self.current_source_text(),
            self.model,
        )
    }

    pub fn reject(&mut self, code: String, diagnostic: String) {
        self.rejection = Some(Rejection { code, diagnostic });
    }

    pub fn push_attempt(&mut self, attempt: CorrectionAttempt) {
        self.history.push(attempt);
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_carries_source() {
        let context = CorrectionContext::new("Refactor it", "x=1", SupportedModel::default());
        let request = context.next_request();
        assert_eq!(request.instruction, "Refactor it");
        assert_eq!(request.source_text, "x=1");
        assert_eq!(context.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_request_after_rejection_embeds_candidate() {
        let mut context = CorrectionContext::new("Refactor it", "x=1", SupportedModel::default())
            .with_max_attempts(5);
        context.reject(
            "def f(:".into(),
            "Syntax Error: invalid syntax on line 1".into(),
        );

        let request = context.next_request();
        assert!(request.instruction.contains("def f(:"));
        assert!(request
            .instruction
            .contains("Syntax Error: invalid syntax on line 1"));
        assert_eq!(request.source_text, "");
        assert_eq!(context.max_attempts, 5);
    }
}
