//! Row-addressable failure model.
//!
//! Everything that can go wrong with the *inputs* of a run lands here as data:
//!
//! - [`ParseFailure`] - structural defect in the CSV file or the schema document
//! - [`Violation`] - a well-formed record failing one schema constraint
//! - [`ValidationReport`] - terminal result of validating a record set
//! - [`Outcome`] - tri-state result of a whole run, mapped to an exit code by the caller
//!
//! Formatting (`Error at row 2: Field age ...`) is a presentation of these
//! values; callers that need machine-readable output serialize the values
//! themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Locations
// =============================================================================

/// 1-based position of a data row, header excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowIndex(usize);

impl RowIndex {
    /// Row index for the data row at `offset` (0-based, header excluded).
    pub fn from_offset(offset: usize) -> Self {
        Self(offset + 1)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a parse failure originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "row", rename_all = "lowercase")]
pub enum Location {
    /// A single data row.
    Row(RowIndex),
    /// The schema document.
    Schema,
    /// The CSV input as a whole (unreadable file, missing header).
    Input,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Row(row) => write!(f, "row {}", row),
            Location::Schema => write!(f, "schema"),
            Location::Input => write!(f, "input"),
        }
    }
}

// =============================================================================
// Parse Failures
// =============================================================================

/// Machine-readable category of a [`ParseFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FailureKind {
    /// Row has fewer cells than the header.
    TooFewFields,
    /// Row has more cells than the header.
    TooManyFields,
    /// Bytes could not be decoded with the configured encoding.
    InvalidEncoding,
    /// The tokenizer rejected the row.
    MalformedRow,
    /// A read option (such as the delimiter) is unusable.
    InvalidOption,
    /// The input could not be read.
    Io,
    /// Input is empty or has no usable header row.
    MissingHeader,
    /// Two header cells share a name.
    DuplicateHeader,
    /// The schema document is not valid JSON/YAML.
    Syntax,
    /// The schema document is not a usable JSON Schema.
    InvalidSchema,
}

/// A structural defect in one of the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFailure {
    pub location: Location,
    pub kind: FailureKind,
    pub message: String,
}

impl ParseFailure {
    pub fn at_row(row: RowIndex, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            location: Location::Row(row),
            kind,
            message: message.into(),
        }
    }

    pub fn schema(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            location: Location::Schema,
            kind,
            message: message.into(),
        }
    }

    pub fn input(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            location: Location::Input,
            kind,
            message: message.into(),
        }
    }

    /// Row this failure is attached to, if any.
    pub fn row(&self) -> Option<RowIndex> {
        match self.location {
            Location::Row(row) => Some(row),
            _ => None,
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error at {}: {}.", self.location, cause(&self.message))
    }
}

// =============================================================================
// Violations
// =============================================================================

/// One failed constraint on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub row: RowIndex,
    /// Dotted path of the offending field inside the record.
    pub field: String,
    /// Schema keyword that failed (`type`, `required`, ...), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at row {}: Field {} {}.",
            self.row,
            self.field,
            cause(&self.message)
        )
    }
}

/// Messages are embedded in a sentence that supplies its own full stop.
fn cause(message: &str) -> &str {
    message.trim_end().trim_end_matches('.')
}

// =============================================================================
// Reports
// =============================================================================

/// Terminal result of validating a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "violations", rename_all = "lowercase")]
pub enum ValidationReport {
    Success,
    Failure(Vec<Violation>),
}

impl ValidationReport {
    /// Build the report from collected violations.
    ///
    /// Violations are ordered by ascending row; the sort is stable, so
    /// violations of one row keep the evaluator's order.
    pub fn from_violations(mut violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            return ValidationReport::Success;
        }
        violations.sort_by_key(|v| v.row);
        ValidationReport::Failure(violations)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ValidationReport::Success)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationReport::Success => &[],
            ValidationReport::Failure(violations) => violations,
        }
    }
}

/// Result of a whole run: inputs parsed and records validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Success,
    ParseFailed { failures: Vec<ParseFailure> },
    ValidationFailed { violations: Vec<Violation> },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Process exit code the outermost caller should use.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::ParseFailed { .. } | Outcome::ValidationFailed { .. } => 1,
        }
    }

    /// One formatted line per failure, in report order.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Outcome::Success => Vec::new(),
            Outcome::ParseFailed { failures } => failures.iter().map(ToString::to_string).collect(),
            Outcome::ValidationFailed { violations } => {
                violations.iter().map(ToString::to_string).collect()
            }
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<ValidationReport> for Outcome {
    fn from(report: ValidationReport) -> Self {
        match report {
            ValidationReport::Success => Outcome::Success,
            ValidationReport::Failure(violations) => Outcome::ValidationFailed { violations },
        }
    }
}
