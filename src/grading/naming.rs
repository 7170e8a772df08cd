//! Fixture naming protocol: test parameters encoded in expected-output filenames.
//!
//! An expected file named `<cacheSize>-<numLines>-<associativity>-<category>-<prefetchAmount>-<input>`
//! is a test for the input file `<input>`. Numeric fields stay strings so the
//! exact spelling from the fixture name reaches the simulator and the report.

#![allow(missing_docs)]

use std::fmt;

use regex::Regex;
use crate::core::errors::{GraderError, Result};

/// Closed set of prefetch policies a fixture can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrefetchCategory {
    Adjacent,
    Sequential,
}

impl PrefetchCategory {
    pub const ALL: [Self; 2] = [Self::Adjacent, Self::Sequential];

    /// Spelling used inside fixture filenames.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adjacent => "adjacent",
            Self::Sequential => "sequential",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Points awarded for one passing test in this category.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Adjacent => 3,
            Self::Sequential => 1,
        }
    }

    /// Rubric item (`major.minor`) this category's tests are numbered under.
    #[must_use]
    pub const fn rubric_section(self) -> (u32, u32) {
        match self {
            Self::Adjacent => (1, 1),
            Self::Sequential => (1, 2),
        }
    }
}

impl fmt::Display for PrefetchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters extracted from one expected-output filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestParameters {
    pub cache_size: String,
    pub num_lines: String,
    pub associativity: String,
    pub prefetch_policy: PrefetchCategory,
    pub prefetch_amount: String,
}

impl TestParameters {
    /// The five encoded fields in filename order, upper-cased.
    #[must_use]
    pub fn upper_fields(&self) -> [String; 5] {
        [
            self.cache_size.to_uppercase(),
            self.num_lines.to_uppercase(),
            self.associativity.to_uppercase(),
            self.prefetch_policy.as_str().to_uppercase(),
            self.prefetch_amount.to_uppercase(),
        ]
    }

    /// Simulator argument vector: `[policy, cacheSize, numLines, associativity, PREFETCH, amount]`.
    #[must_use]
    pub fn subject_args(&self, replacement_policy: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(6);
        args.push(replacement_policy.to_uppercase());
        args.extend(self.upper_fields());
        args
    }

    /// Space-joined upper-cased fields, as shown in progress output.
    #[must_use]
    pub fn describe(&self) -> String {
        self.upper_fields().join(" ")
    }
}

/// Result of testing one candidate filename against an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureMatch {
    Parsed(TestParameters),
    /// The candidate is not a test for this input. Not an error.
    Unmatched,
}

/// Compiled matcher for the expected files of one input.
#[derive(Debug, Clone)]
pub struct FixtureNamePattern {
    input_name: String,
    regex: Regex,
}

impl FixtureNamePattern {
    /// Build the matcher for `input_name`, which is matched literally.
    pub fn for_input(input_name: &str) -> Result<Self> {
        let categories: Vec<&str> = PrefetchCategory::ALL
            .iter()
            .map(|c| c.as_str())
            .collect();
        let source = format!(
            r"^(\d+)-(\d+)-(\d+)-({})-(\d+)-{}$",
            categories.join("|"),
            regex::escape(input_name)
        );
        let regex = Regex::new(&source).map_err(|err| GraderError::Pattern {
            input: input_name.to_string(),
            details: err.to_string(),
        })?;
        Ok(Self {
            input_name: input_name.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Match one candidate expected-file name.
    #[must_use]
    pub fn parse(&self, candidate: &str) -> FixtureMatch {
        let Some(caps) = self.regex.captures(candidate) else {
            return FixtureMatch::Unmatched;
        };
        let Some(prefetch_policy) = PrefetchCategory::from_name(&caps[4]) else {
            return FixtureMatch::Unmatched;
        };
        FixtureMatch::Parsed(TestParameters {
            cache_size: caps[1].to_string(),
            num_lines: caps[2].to_string(),
            associativity: caps[3].to_string(),
            prefetch_policy,
            prefetch_amount: caps[5].to_string(),
        })
    }
}
