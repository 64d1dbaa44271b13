//! Survey Orchestrator
//!
//! Sequences the four-stage flow (identity → form → evidence →
//! completion): a pure stage machine plus a side-effecting interpreter
//! that owns the in-flight draft and decides the final sync status shown
//! to the operator.

mod flow;
mod stage;

pub use flow::{CompletionReport, SurveyOrchestrator};
pub use stage::{advance, Stage, StageEvent};
