//! Grading pipeline: fixture naming, subject invocation, comparison,
//! orchestration, and rubric reporting.

pub mod compare;
pub mod invoke;
pub mod naming;
pub mod orchestrator;
pub mod report;
pub mod rubric;
