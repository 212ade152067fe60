//! Regression fixtures of the form `mangled ---> expected`.
//!
//! One case per line. Blank lines and lines starting with `#` are skipped. Inputs written
//! with a doubled leading underscore (`__T0...`, as emitted on Darwin) lose one underscore,
//! and an expected text that starts with a `{...} ` annotation has it stripped.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::batch::decode_and_render;
use crate::printer::RenderOptions;

const SEPARATOR: &str = " ---> ";

/// Errors raised while loading fixture files.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("line {line}: missing ` ---> ` separator")]
    MissingSeparator { line: usize },

    #[error("line {line}: empty mangled name")]
    EmptyInput { line: usize },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single fixture line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCase {
    pub line: usize,
    pub input: String,
    pub expected: String,
}

/// Cases parsed from one fixture file.
#[derive(Debug, Default)]
pub struct FixtureSet {
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    pub fn parse(content: &str) -> Result<Self, FixtureError> {
        let mut cases = Vec::new();
        for (i, raw) in content.lines().enumerate() {
            let line = i + 1;
            let trimmed = raw.trim_end();
            if trimmed.trim_start().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (input, expected) = trimmed
                .split_once(SEPARATOR)
                .ok_or(FixtureError::MissingSeparator { line })?;
            let input = input.trim();
            if input.is_empty() {
                return Err(FixtureError::EmptyInput { line });
            }
            let input = if input.starts_with("__") {
                &input[1..]
            } else {
                input
            };
            cases.push(FixtureCase {
                line,
                input: input.to_string(),
                expected: strip_annotation(expected).to_string(),
            });
        }
        Ok(FixtureSet { cases })
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// `{annotation} text` becomes `text`.
fn strip_annotation(expected: &str) -> &str {
    if expected.starts_with('{') {
        if let Some(end) = expected.find("} ") {
            return &expected[end + 2..];
        }
    }
    expected
}

/// A case whose rendering differs from the expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub line: usize,
    pub input: String,
    pub expected: String,
    pub actual: String,
}

/// Outcome of running a fixture set.
#[derive(Debug, Default)]
pub struct FixtureReport {
    pub passed: usize,
    pub mismatches: Vec<Mismatch>,
}

impl FixtureReport {
    pub fn is_success(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn total(&self) -> usize {
        self.passed + self.mismatches.len()
    }
}

/// Renders every case of a set and compares it against its expectation.
pub struct FixtureRunner {
    options: RenderOptions,
}

impl FixtureRunner {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, set: &FixtureSet) -> FixtureReport {
        let mut report = FixtureReport::default();
        for case in &set.cases {
            let actual = decode_and_render(&case.input, self.options);
            if actual == case.expected {
                report.passed += 1;
            } else {
                log::debug!("line {}: {} mismatched", case.line, case.input);
                report.mismatches.push(Mismatch {
                    line: case.line,
                    input: case.input.clone(),
                    expected: case.expected.clone(),
                    actual,
                });
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let set = FixtureSet::parse("# header\n\n$s4main3fooyyF ---> main.foo() -> ()\n").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.cases[0].line, 3);
        assert_eq!(set.cases[0].expected, "main.foo() -> ()");
    }

    #[test]
    fn test_parse_normalizes_input_and_expected() {
        let set = FixtureSet::parse("__T0x ---> {runtime} thing\n").unwrap();
        assert_eq!(set.cases[0].input, "_T0x");
        assert_eq!(set.cases[0].expected, "thing");
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        let err = FixtureSet::parse("$s4main3fooyyF main.foo\n").unwrap_err();
        assert!(matches!(err, FixtureError::MissingSeparator { line: 1 }));
    }

    #[test]
    fn test_runner_reports_mismatches() {
        let set = FixtureSet::parse(
            "$s4main3fooyyF ---> main.foo() -> ()\n$s4main3fooyyF ---> main.bar() -> ()\n",
        )
        .unwrap();
        let report = FixtureRunner::new(RenderOptions::default()).run(&set);
        assert_eq!(report.passed, 1);
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].actual, "main.foo() -> ()");
        assert!(!report.is_success());
    }
}
