//! Ordered, line-exact comparison of subject output against a golden file.

#![allow(missing_docs)]

use std::time::Duration;

use crate::grading::invoke::ProcessError;

/// Verdict for one fixture pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    LengthMismatch {
        actual: usize,
        expected: usize,
    },
    /// First diverging line; later lines are not examined.
    ContentMismatch {
        index: usize,
        found: String,
        expected: String,
    },
    SubjectCrashed {
        status: String,
        stderr: String,
    },
    TimedOut {
        after: Duration,
    },
}

impl Outcome {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Stable snake_case label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::LengthMismatch { .. } => "length_mismatch",
            Self::ContentMismatch { .. } => "content_mismatch",
            Self::SubjectCrashed { .. } => "subject_crashed",
            Self::TimedOut { .. } => "timed_out",
        }
    }

    /// Map a subject-side invocation failure to a scored outcome. Harness
    /// faults have no outcome and come back as `Err`.
    pub fn from_process_error(err: ProcessError) -> Result<Self, ProcessError> {
        match err {
            ProcessError::Crashed { status, stderr } => Ok(Self::SubjectCrashed { status, stderr }),
            ProcessError::TimedOut { after } => Ok(Self::TimedOut { after }),
            other => Err(other),
        }
    }

    /// Text persisted in the result artifact and echoed under a FAIL.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Pass => "PASS".to_string(),
            Self::LengthMismatch { actual, expected } => {
                format!("      {actual} OUTPUT lines found, expected {expected}")
            }
            Self::ContentMismatch {
                index,
                found,
                expected,
            } => [
                format!("      On line {index} found:"),
                format!("        {found}"),
                "      expected:".to_string(),
                format!("        {expected}"),
            ]
            .join("\n"),
            Self::SubjectCrashed { status, .. } => format!("      subject crashed ({status})"),
            Self::TimedOut { after } => format!("      subject timed out after {after:?}"),
        }
    }
}

/// Compare filtered subject lines with expected lines.
///
/// Length is checked first: once the counts differ an index-aligned report
/// would be misleading, so a length mismatch wins over any content mismatch.
#[must_use]
pub fn compare<A, E>(actual: &[A], expected: &[E]) -> Outcome
where
    A: AsRef<str>,
    E: AsRef<str>,
{
    if actual.len() != expected.len() {
        return Outcome::LengthMismatch {
            actual: actual.len(),
            expected: expected.len(),
        };
    }

    for (index, (found, want)) in actual.iter().zip(expected).enumerate() {
        if found.as_ref() != want.as_ref() {
            return Outcome::ContentMismatch {
                index,
                found: found.as_ref().to_string(),
                expected: want.as_ref().to_string(),
            };
        }
    }

    Outcome::Pass
}

/// Split an expected-output file into comparable lines, trimming trailing
/// whitespace (including `\r`) from each.
#[must_use]
pub fn expected_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim_end().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_pass() {
        let lines = ["OUTPUT: 00000000 MISS", "OUTPUT: 00000040 HIT"];
        assert_eq!(compare(&lines, &lines), Outcome::Pass);
        assert_eq!(compare::<&str, &str>(&[], &[]), Outcome::Pass);
    }

    #[test]
    fn length_checked_before_content() {
        let actual = ["OUTPUT: a", "OUTPUT: b"];
        let expected = ["OUTPUT: x"];
        assert_eq!(
            compare(&actual, &expected),
            Outcome::LengthMismatch {
                actual: 2,
                expected: 1
            }
        );
    }

    #[test]
    fn first_divergence_is_reported() {
        let actual = ["OUTPUT: a", "OUTPUT: b", "OUTPUT: c"];
        let expected = ["OUTPUT: a", "OUTPUT: B", "OUTPUT: C"];
        assert_eq!(
            compare(&actual, &expected),
            Outcome::ContentMismatch {
                index: 1,
                found: "OUTPUT: b".to_string(),
                expected: "OUTPUT: B".to_string(),
            }
        );
    }

    #[test]
    fn actual_lines_are_not_trimmed() {
        let actual = ["OUTPUT: a "];
        let expected = expected_lines("OUTPUT: a \n");
        assert!(matches!(
            compare(&actual, &expected),
            Outcome::ContentMismatch { index: 0, .. }
        ));
    }

    #[test]
    fn expected_lines_trim_trailing_whitespace_only() {
        assert_eq!(
            expected_lines("OUTPUT: a  \r\n  OUTPUT: b\t\n"),
            vec!["OUTPUT: a", "  OUTPUT: b"]
        );
        assert!(expected_lines("").is_empty());
    }

    #[test]
    fn length_diagnostic_text() {
        let outcome = Outcome::LengthMismatch {
            actual: 0,
            expected: 3,
        };
        assert_eq!(outcome.diagnostic(), "      0 OUTPUT lines found, expected 3");
    }

    #[test]
    fn content_diagnostic_names_both_lines() {
        let outcome = Outcome::ContentMismatch {
            index: 0,
            found: "OUTPUT: 00000000 HIT".to_string(),
            expected: "OUTPUT: 00000000 MISS".to_string(),
        };
        assert_eq!(
            outcome.diagnostic(),
            "      On line 0 found:\n        OUTPUT: 00000000 HIT\n      expected:\n        OUTPUT: 00000000 MISS"
        );
    }

    #[test]
    fn subject_faults_become_outcomes() {
        let crashed = Outcome::from_process_error(ProcessError::Crashed {
            status: "exit code 139".to_string(),
            stderr: String::new(),
        })
        .unwrap();
        assert!(crashed.diagnostic().contains("subject crashed (exit code 139)"));

        let timed_out = Outcome::from_process_error(ProcessError::TimedOut {
            after: Duration::from_secs(2),
        })
        .unwrap();
        assert!(timed_out.diagnostic().contains("timed out"));
        assert!(!timed_out.is_pass());
        assert_eq!(timed_out.kind(), "timed_out");
    }

    #[test]
    fn harness_faults_stay_errors() {
        let err = Outcome::from_process_error(ProcessError::Pipe {
            source: std::io::Error::other("broken"),
        })
        .expect_err("pipe failures are not scored");
        assert!(err.is_harness_fault());
    }
}
