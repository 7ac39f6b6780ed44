//! # devoptima-validator
//!
//! Structural checks over candidate code. Nothing here executes the code it
//! is given: validation is a tree-sitter parse and nothing more.

mod complexity;
mod outcome;
mod python;

pub use complexity::{average_complexity, function_complexities, FunctionComplexity};
pub use outcome::ValidationOutcome;
pub use python::PythonValidator;

/// A pure syntax check over a code candidate
pub trait Validator: Send + Sync {
    /// Language the validator understands (e.g., "python")
    fn language(&self) -> &str;

    /// Check `code` for structural errors without running it
    fn validate(&self, code: &str) -> ValidationOutcome;
}
