//! # devoptima-protocol
//!
//! The marker-delimited text protocol spoken between devoptima and the model.
//!
//! Prompts ask the model to separate its answer into sections with literal
//! marker lines such as `---DESCRIPTION---` and `---CODE---`. [`parse`] reads
//! those sections back into a [`ParsedResult`]. It is total: malformed or
//! unexpected output degrades to defaults rather than failing.

mod cascade;
mod fence;
pub mod markers;
mod prompts;
mod result;

pub use cascade::{detect_format, extract_code, parse, ResponseFormat, AUDIT_PARSE_FAILURE};
pub use fence::{extract_fenced_block, strip_fences};
pub use prompts::Prompts;
pub use result::{DebtGrade, IssueStatus, ParsedResult, SimulationTrace, TraceStep, TreeNode};
