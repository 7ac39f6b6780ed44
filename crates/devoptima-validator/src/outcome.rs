use serde::{Deserialize, Serialize};

/// Result of validating one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum ValidationOutcome {
    Valid,
    Invalid {
        message: String,
        /// 1-based line of the first structural error, when known
        line: Option<usize>,
    },
}

impl ValidationOutcome {
    pub fn invalid(message: impl Into<String>, line: Option<usize>) -> Self {
        ValidationOutcome::Invalid {
            message: message.into(),
            line,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Human-readable diagnostic, `None` when valid
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid {
                message,
                line: Some(line),
            } => Some(format!("Syntax Error: {} on line {}", message, line)),
            ValidationOutcome::Invalid { message, line: None } => {
                Some(format!("Syntax Error: {}", message))
            }
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid { line, .. } => *line,
        }
    }
}

impl std::fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.diagnostic() {
            Some(diagnostic) => write!(f, "{}", diagnostic),
            None => write!(f, "valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formats() {
        assert_eq!(ValidationOutcome::Valid.diagnostic(), None);
        assert_eq!(
            ValidationOutcome::invalid("expected ':'", Some(3)).to_string(),
            "Syntax Error: expected ':' on line 3"
        );
        assert_eq!(
            ValidationOutcome::invalid("parser unavailable", None).to_string(),
            "Syntax Error: parser unavailable"
        );
    }
}
