//! Per-test result records and rubric aggregation.
//!
//! Rule numbers are dotted identifiers (`1.2.10`) whose first two components
//! name the rubric item. They order as integer tuples, never as strings.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::grading::compare::Outcome;

/// Dotted rubric identifier with at least two components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleNumber(Vec<u32>);

impl RuleNumber {
    /// Build from components; `None` when fewer than two are given.
    #[must_use]
    pub fn new(parts: Vec<u32>) -> Option<Self> {
        (parts.len() >= 2).then_some(Self(parts))
    }

    /// `<major>.<minor>.<index>` for a test inside a rubric section.
    #[must_use]
    pub fn in_section((major, minor): (u32, u32), index: u32) -> Self {
        Self(vec![major, minor, index])
    }

    #[must_use]
    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    /// Rubric item this rule belongs to.
    #[must_use]
    pub fn rubric_key(&self) -> RubricKey {
        RubricKey(self.0[0], self.0[1])
    }
}

impl fmt::Display for RuleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// Rejected rule number text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rule number {0:?}: expected dotted integers with at least two components")]
pub struct RuleNumberParseError(String);

impl FromStr for RuleNumber {
    type Err = RuleNumberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| RuleNumberParseError(s.to_string()))?;
        Self::new(parts).ok_or_else(|| RuleNumberParseError(s.to_string()))
    }
}

impl Serialize for RuleNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RuleNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One executed fixture pair. Field order matches the artifact layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub max_score: u32,
    pub name: String,
    pub number: RuleNumber,
    pub output: String,
    pub score: u32,
}

impl TestResult {
    /// Score is all or nothing: `max_score` on a pass, 0 otherwise.
    #[must_use]
    pub fn from_outcome(
        number: RuleNumber,
        name: impl Into<String>,
        outcome: &Outcome,
        max_score: u32,
    ) -> Self {
        Self {
            max_score,
            name: name.into(),
            number,
            output: outcome.diagnostic(),
            score: if outcome.is_pass() { max_score } else { 0 },
        }
    }

    #[must_use]
    pub const fn passed(&self) -> bool {
        self.score == self.max_score
    }
}

/// First two components of a rule number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RubricKey(pub u32, pub u32);

impl fmt::Display for RubricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Running score for one rubric item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RubricTally {
    pub score: u32,
    pub max_score: u32,
}

impl RubricTally {
    fn add(&mut self, result: &TestResult) {
        self.score += result.score;
        self.max_score += result.max_score;
    }
}

/// Display row for one rubric item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricItem {
    pub item: String,
    pub score: u32,
    pub max_score: u32,
}

/// Scores grouped by rubric item, iterated in numeric key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RubricSummary {
    items: BTreeMap<RubricKey, RubricTally>,
}

impl RubricSummary {
    pub fn iter(&self) -> impl Iterator<Item = (RubricKey, RubricTally)> + '_ {
        self.items.iter().map(|(key, tally)| (*key, *tally))
    }

    #[must_use]
    pub fn get(&self, key: RubricKey) -> Option<RubricTally> {
        self.items.get(&key).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> RubricTally {
        self.items
            .values()
            .fold(RubricTally::default(), |acc, tally| RubricTally {
                score: acc.score + tally.score,
                max_score: acc.max_score + tally.max_score,
            })
    }

    #[must_use]
    pub fn rows(&self) -> Vec<RubricItem> {
        self.iter()
            .map(|(key, tally)| RubricItem {
                item: key.to_string(),
                score: tally.score,
                max_score: tally.max_score,
            })
            .collect()
    }
}

/// Group results by rubric item and sum their scores.
pub fn aggregate<'a, I>(results: I) -> RubricSummary
where
    I: IntoIterator<Item = &'a TestResult>,
{
    let mut items: BTreeMap<RubricKey, RubricTally> = BTreeMap::new();
    for result in results {
        items
            .entry(result.number.rubric_key())
            .or_default()
            .add(result);
    }
    RubricSummary { items }
}

/// Stable sort by numeric rule number.
pub fn sort_results(results: &mut [TestResult]) {
    results.sort_by(|a, b| a.number.cmp(&b.number));
}
