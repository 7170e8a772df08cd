//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use cachesim_grader::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{GraderError, Result};

// Grading
pub use crate::grading::compare::{Outcome, compare, expected_lines};
pub use crate::grading::invoke::{ProcessError, Subject, SubjectInvoker};
pub use crate::grading::naming::{
    FixtureMatch, FixtureNamePattern, PrefetchCategory, TestParameters,
};
pub use crate::grading::orchestrator::{NoopObserver, Orchestrator, RubricCounters, RunObserver};
pub use crate::grading::report::{RunReport, write_artifact};
pub use crate::grading::rubric::{RubricKey, RubricSummary, RuleNumber, TestResult, aggregate};

// Logging
pub use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
