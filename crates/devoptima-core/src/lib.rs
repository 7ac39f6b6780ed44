//! # devoptima-core
//!
//! Orchestration for devoptima: the bounded generate, validate and repair
//! loop ([`CorrectionRunner`]) and the per-action driver built on it
//! ([`Workbench`]).

mod action;
mod context;
mod error;
mod outcome;
mod runner;
mod state;
mod workbench;

pub use action::{Action, ActionContext};
pub use context::{CorrectionAttempt, CorrectionContext, DEFAULT_MAX_ATTEMPTS};
pub use error::CorrectionError;
pub use outcome::CorrectionOutcome;
pub use runner::CorrectionRunner;
pub use state::AttemptState;
pub use workbench::{ActionReport, ActionStatus, ComplexityDelta, Workbench};
