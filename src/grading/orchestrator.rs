//! Test orchestration: pair inputs with expected files, run, compare, record.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{GraderError, Result};
use crate::grading::compare::{Outcome, compare, expected_lines};
use crate::grading::invoke::Subject;
use crate::grading::naming::{FixtureMatch, FixtureNamePattern, PrefetchCategory, TestParameters};
use crate::grading::rubric::{RuleNumber, TestResult};

/// Per-category test counters. Monotonic for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RubricCounters {
    adjacent: u32,
    sequential: u32,
}

impl RubricCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next rule number for `category` (`1.1.<n>` / `1.2.<n>`, from 1).
    pub fn next(&mut self, category: PrefetchCategory) -> RuleNumber {
        let slot = match category {
            PrefetchCategory::Adjacent => &mut self.adjacent,
            PrefetchCategory::Sequential => &mut self.sequential,
        };
        *slot += 1;
        RuleNumber::in_section(category.rubric_section(), *slot)
    }

    /// Tests numbered so far in `category`.
    #[must_use]
    pub const fn issued(&self, category: PrefetchCategory) -> u32 {
        match category {
            PrefetchCategory::Adjacent => self.adjacent,
            PrefetchCategory::Sequential => self.sequential,
        }
    }
}

/// One input fixture paired with one of its expected-output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePair {
    pub input: PathBuf,
    pub expected: PathBuf,
    /// Expected file name; doubles as the test name.
    pub name: String,
    pub params: TestParameters,
}

/// Progress callbacks. All methods default to no-ops.
pub trait RunObserver {
    fn on_input(&mut self, _input: &Path) {}
    fn on_test_start(&mut self, _number: &RuleNumber, _pair: &FixturePair) {}
    fn on_result(&mut self, _result: &TestResult, _outcome: &Outcome) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Regular files in `dir`, sorted by file name. Names that are not valid
/// UTF-8 cannot take part in the naming protocol and are skipped.
pub fn list_fixture_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(GraderError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|source| GraderError::io(dir, source))? {
        let entry = entry.map_err(|source| GraderError::io(dir, source))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            files.push((name.to_string(), path));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Expected files that encode a test for `input_name`, in name order.
pub fn pairs_for_input(
    input: &Path,
    input_name: &str,
    expected_files: &[(String, PathBuf)],
) -> Result<Vec<FixturePair>> {
    let pattern = FixtureNamePattern::for_input(input_name)?;
    Ok(expected_files
        .iter()
        .filter_map(|(name, path)| match pattern.parse(name) {
            FixtureMatch::Parsed(params) => Some(FixturePair {
                input: input.to_path_buf(),
                expected: path.clone(),
                name: name.clone(),
                params,
            }),
            FixtureMatch::Unmatched => None,
        })
        .collect())
}

/// Drives the matching-and-scoring loop over one fixture layout.
pub struct Orchestrator<'a, S: Subject + ?Sized> {
    subject: &'a S,
    inputs_dir: PathBuf,
    expected_dir: PathBuf,
    replacement_policy: String,
}

impl<'a, S: Subject + ?Sized> Orchestrator<'a, S> {
    #[must_use]
    pub fn new(
        subject: &'a S,
        inputs_dir: impl Into<PathBuf>,
        expected_dir: impl Into<PathBuf>,
        replacement_policy: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            inputs_dir: inputs_dir.into(),
            expected_dir: expected_dir.into(),
            replacement_policy: replacement_policy.into(),
        }
    }

    /// Grade every fixture pair, in input-name then expected-name order.
    ///
    /// Subject failures are scored and the run continues; harness failures
    /// (missing directories, unreadable fixtures, unlaunchable executable)
    /// abort it.
    pub fn run(&self, observer: &mut dyn RunObserver) -> Result<Vec<TestResult>> {
        let inputs = list_fixture_files(&self.inputs_dir)?;
        let expected_files = list_fixture_files(&self.expected_dir)?;

        let mut counters = RubricCounters::new();
        let mut results = Vec::new();
        for (input_name, input) in &inputs {
            observer.on_input(input);
            for pair in pairs_for_input(input, input_name, &expected_files)? {
                results.push(self.grade_pair(&pair, &mut counters, observer)?);
            }
        }
        Ok(results)
    }

    /// Run and score a single pair, allocating its rule number from `counters`.
    pub fn grade_pair(
        &self,
        pair: &FixturePair,
        counters: &mut RubricCounters,
        observer: &mut dyn RunObserver,
    ) -> Result<TestResult> {
        let category = pair.params.prefetch_policy;
        let number = counters.next(category);
        observer.on_test_start(&number, pair);

        let raw = fs::read_to_string(&pair.expected)
            .map_err(|source| GraderError::io(&pair.expected, source))?;
        let expected = expected_lines(&raw);

        let args = pair.params.subject_args(&self.replacement_policy);
        let outcome = match self.subject.run_simulation(&args, &pair.input) {
            Ok(actual) => compare(&actual, &expected),
            Err(err) => Outcome::from_process_error(err)?,
        };

        let result = TestResult::from_outcome(number, &pair.name, &outcome, category.weight());
        observer.on_result(&result, &outcome);
        Ok(result)
    }
}
