/// Position of a correction run in its attempt cycle.
///
/// `Accepted` and `Exhausted` are terminal. A run reaches `Accepted` only
/// through a valid candidate and `Exhausted` only on the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// About to make generation call `n` (1-based)
    Generating(u32),
    /// Candidate from this attempt passed validation
    Accepted(u32),
    /// Candidate from this final attempt failed validation
    Exhausted(u32),
}

impl AttemptState {
    /// Transition after the candidate from `attempt` has been validated
    pub fn after_validation(attempt: u32, is_valid: bool, max_attempts: u32) -> Self {
        if is_valid {
            AttemptState::Accepted(attempt)
        } else if attempt >= max_attempts {
            AttemptState::Exhausted(attempt)
        } else {
            AttemptState::Generating(attempt + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(
            AttemptState::after_validation(1, true, 3),
            AttemptState::Accepted(1)
        );
        assert_eq!(
            AttemptState::after_validation(1, false, 3),
            AttemptState::Generating(2)
        );
        assert_eq!(
            AttemptState::after_validation(3, false, 3),
            AttemptState::Exhausted(3)
        );
        // Valid on the last attempt still accepts
        assert_eq!(
            AttemptState::after_validation(3, true, 3),
            AttemptState::Accepted(3)
        );
    }

    #[test]
    fn test_single_attempt_budget() {
        assert_eq!(
            AttemptState::after_validation(1, false, 1),
            AttemptState::Exhausted(1)
        );
        assert_eq!(
            AttemptState::after_validation(1, true, 1),
            AttemptState::Accepted(1)
        );
    }
}
