use serde::Serialize;
use std::time::Duration;

use devoptima_agent::RawResponse;

use crate::CorrectionAttempt;

/// The final outcome of a correction run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrectionOutcome {
    /// A candidate passed validation
    Accepted {
        attempts: u32,
        response: RawResponse,
        #[serde(skip)]
        history: Vec<CorrectionAttempt>,
        total_duration_secs: f64,
    },
    /// Every attempt failed validation; carries the last response
    Exhausted {
        attempts: u32,
        response: RawResponse,
        last_diagnostic: String,
        #[serde(skip)]
        history: Vec<CorrectionAttempt>,
        total_duration_secs: f64,
    },
}

impl CorrectionOutcome {
    pub fn accepted(
        attempts: u32,
        response: RawResponse,
        history: Vec<CorrectionAttempt>,
        duration: Duration,
    ) -> Self {
        Self::Accepted {
            attempts,
            response,
            history,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn exhausted(
        attempts: u32,
        response: RawResponse,
        last_diagnostic: String,
        history: Vec<CorrectionAttempt>,
        duration: Duration,
    ) -> Self {
        Self::Exhausted {
            attempts,
            response,
            last_diagnostic,
            history,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Accepted { attempts, .. } => *attempts,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn response(&self) -> &RawResponse {
        match self {
            Self::Accepted { response, .. } => response,
            Self::Exhausted { response, .. } => response,
        }
    }

    pub fn history(&self) -> &[CorrectionAttempt] {
        match self {
            Self::Accepted { history, .. } => history,
            Self::Exhausted { history, .. } => history,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Accepted { .. } => 0,
            Self::Exhausted { .. } => 1,
        }
    }
}
