#![forbid(unsafe_code)]

//! Cache-simulator grader (cachegrade): automated grading harness for an
//! externally supplied cache-simulator executable.
//!
//! Pipeline:
//! 1. **Fixture naming**: test parameters decoded from expected-output filenames
//! 2. **Subject invocation**: one child process per fixture, input on stdin,
//!    `OUTPUT` lines collected from stdout
//! 3. **Comparison**: ordered, line-exact match against the golden file
//! 4. **Rubric scoring**: per-item totals and a timestamped JSON artifact
//!
//! # Library usage
//!
//! ```rust,no_run
//! use cachesim_grader::prelude::*;
//!
//! # fn main() -> cachesim_grader::core::errors::Result<()> {
//! let subject = SubjectInvoker::new("./cachesim", None);
//! let results = Orchestrator::new(&subject, "inputs", "expected", "LRU")
//!     .run(&mut NoopObserver)?;
//! let report = RunReport::from_results(results);
//! println!("{}/{}", report.total().score, report.total().max_score);
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod core;
pub mod grading;
pub mod logger;
