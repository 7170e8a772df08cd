//! Run reporting: rubric summary text and the timestamped result artifact.

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::core::errors::{GraderError, Result};
use crate::grading::rubric::{
    RubricItem, RubricSummary, RubricTally, TestResult, aggregate, sort_results,
};

/// Artifact file stem; second resolution.
pub const ARTIFACT_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Advisory printed after the totals.
pub const SUBSET_NOTICE: [&str; 2] = [
    "NOTE: the starter code does not contain the complete set of test cases, so",
    "this score may not fully represent your final autograded score.",
];

const MAX_NAME_COLLISIONS: u32 = 1_000;

/// Sorted results plus their rubric totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub results: Vec<TestResult>,
    pub summary: RubricSummary,
}

impl RunReport {
    /// Sort results by numeric rule number, then aggregate.
    #[must_use]
    pub fn from_results(mut results: Vec<TestResult>) -> Self {
        sort_results(&mut results);
        let summary = aggregate(&results);
        Self { results, summary }
    }

    #[must_use]
    pub fn total(&self) -> RubricTally {
        self.summary.total()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Machine-readable view for `--json` output.
    #[must_use]
    pub fn document<'a>(&'a self, artifact: Option<&'a Path>) -> ReportDocument<'a> {
        ReportDocument {
            artifact,
            total: self.total(),
            rubric: self.summary.rows(),
            results: &self.results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument<'a> {
    pub artifact: Option<&'a Path>,
    pub total: RubricTally,
    pub rubric: Vec<RubricItem>,
    pub results: &'a [TestResult],
}

/// One `Rubric Item <key>: <score>/<max>` line per item, numerically ordered.
#[must_use]
pub fn rubric_lines(summary: &RubricSummary) -> Vec<String> {
    summary
        .iter()
        .map(|(key, tally)| format!("Rubric Item {key}: {}/{}", tally.score, tally.max_score))
        .collect()
}

#[must_use]
pub fn total_line(summary: &RubricSummary) -> String {
    let total = summary.total();
    format!(
        "Total Autograded Score: {}/{}",
        total.score, total.max_score
    )
}

/// `<stem>.json`, or `<stem>-<n>.json` for the n-th collision.
#[must_use]
pub fn artifact_file_name(timestamp: NaiveDateTime, collision: u32) -> String {
    let stem = timestamp.format(ARTIFACT_TIME_FORMAT);
    if collision == 0 {
        format!("{stem}.json")
    } else {
        format!("{stem}-{collision}.json")
    }
}

/// Write `results` as a JSON array into a new file under `results_dir`.
///
/// The directory is created if needed. Existing artifacts are never
/// overwritten: a name already taken gets a numeric suffix.
pub fn write_artifact(
    results_dir: &Path,
    results: &[TestResult],
    timestamp: NaiveDateTime,
) -> Result<PathBuf> {
    fs::create_dir_all(results_dir).map_err(|source| GraderError::io(results_dir, source))?;

    for collision in 0..MAX_NAME_COLLISIONS {
        let path = results_dir.join(artifact_file_name(timestamp, collision));
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(GraderError::io(&path, source)),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, results)?;
        writer
            .flush()
            .map_err(|source| GraderError::io(&path, source))?;
        return Ok(path);
    }

    Err(GraderError::Runtime {
        details: format!(
            "no free artifact name in {} for {}",
            results_dir.display(),
            timestamp.format(ARTIFACT_TIME_FORMAT)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    fn result(number: &str, score: u32, max_score: u32) -> TestResult {
        TestResult {
            max_score,
            name: format!("case-{number}"),
            number: number.parse().unwrap(),
            output: "PASS".to_string(),
            score,
        }
    }

    #[test]
    fn report_sorts_numerically_before_summarizing() {
        let report = RunReport::from_results(vec![
            result("1.2.10", 0, 1),
            result("1.2.9", 1, 1),
            result("1.1.1", 3, 3),
        ]);
        let order: Vec<String> = report
            .results
            .iter()
            .map(|r| r.number.to_string())
            .collect();
        assert_eq!(order, vec!["1.1.1", "1.2.9", "1.2.10"]);
        assert_eq!(report.passed(), 2);
        assert_eq!(
            rubric_lines(&report.summary),
            vec!["Rubric Item 1.1: 3/3", "Rubric Item 1.2: 1/2"]
        );
        assert_eq!(total_line(&report.summary), "Total Autograded Score: 4/5");
    }

    #[test]
    fn empty_report_totals_zero() {
        let report = RunReport::from_results(Vec::new());
        assert!(rubric_lines(&report.summary).is_empty());
        assert_eq!(total_line(&report.summary), "Total Autograded Score: 0/0");
    }

    #[test]
    fn artifact_name_has_second_resolution() {
        assert_eq!(artifact_file_name(ts(), 0), "2026-10-19-14-05-09.json");
        assert_eq!(artifact_file_name(ts(), 2), "2026-10-19-14-05-09-2.json");
    }

    #[test]
    fn artifact_contains_ordered_records() {
        let dir = tempfile::tempdir().unwrap();
        let results_dir = dir.path().join("test_results");
        let results = vec![result("1.1.1", 3, 3), result("1.2.1", 0, 1)];

        let path = write_artifact(&results_dir, &results, ts()).unwrap();
        assert_eq!(path, results_dir.join("2026-10-19-14-05-09.json"));

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["number"], "1.1.1");
        assert_eq!(entries[0]["max_score"], 3);
        assert_eq!(entries[1]["score"], 0);
        let keys: Vec<&String> = entries[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["max_score", "name", "number", "output", "score"]);
    }

    #[test]
    fn same_second_runs_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_artifact(dir.path(), &[result("1.1.1", 3, 3)], ts()).unwrap();
        let second = write_artifact(dir.path(), &[result("1.1.1", 0, 3)], ts()).unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("2026-10-19-14-05-09-1.json"));

        let first_body = fs::read_to_string(&first).unwrap();
        assert!(first_body.contains("\"score\":3"));
    }

    #[test]
    fn document_serializes_totals_and_rubric() {
        let report = RunReport::from_results(vec![result("1.1.1", 3, 3)]);
        let value = serde_json::to_value(report.document(None)).unwrap();
        assert_eq!(value["total"]["score"], 3);
        assert_eq!(value["rubric"][0]["item"], "1.1");
        assert!(value["artifact"].is_null());
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
    }
}
