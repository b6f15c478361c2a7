//! Drives a [`ConstraintEvaluator`] over a record set.
//!
//! `abort_early` works at two levels, and only one of them short-circuits:
//!
//! - within a record, the evaluator stops at the first failed constraint, so
//!   a record contributes at most one violation;
//! - across records, nothing stops: every record is always checked, so the
//!   report always names every broken row.
//!
//! Records are checked independently. The parallel entry point returns the
//! same report as the sequential one: violations in ascending row order,
//! ties in the evaluator's check order.

use futures::future::try_join_all;
use std::sync::Arc;

use super::ConstraintEvaluator;
use crate::error::PipelineResult;
use crate::options::ValidateOptions;
use crate::parser::Record;
use crate::report::{ValidationReport, Violation};

/// Validate records one after the other.
pub fn validate(
    records: &[Record],
    evaluator: &dyn ConstraintEvaluator,
    options: &ValidateOptions,
) -> ValidationReport {
    let violations = check_records(records, evaluator, options.abort_early);
    ValidationReport::from_violations(violations)
}

/// Validate records on `options.jobs` blocking workers.
pub async fn validate_parallel(
    records: Arc<Vec<Record>>,
    evaluator: Arc<dyn ConstraintEvaluator>,
    options: &ValidateOptions,
) -> PipelineResult<ValidationReport> {
    let jobs = options.jobs.max(1);
    let chunk_size = records.len().div_ceil(jobs).max(1);
    let abort_early = options.abort_early;

    let workers = (0..records.len()).step_by(chunk_size).map(|start| {
        let records = Arc::clone(&records);
        let evaluator = Arc::clone(&evaluator);
        tokio::task::spawn_blocking(move || {
            let end = (start + chunk_size).min(records.len());
            check_records(&records[start..end], &*evaluator, abort_early)
        })
    });

    // try_join_all keeps worker order, so chunks come back in row order
    let chunks = try_join_all(workers).await?;
    Ok(ValidationReport::from_violations(chunks.into_iter().flatten().collect()))
}

fn check_records(
    records: &[Record],
    evaluator: &dyn ConstraintEvaluator,
    abort_early: bool,
) -> Vec<Violation> {
    records
        .iter()
        .flat_map(|record| check_record(record, evaluator, abort_early))
        .collect()
}

fn check_record(record: &Record, evaluator: &dyn ConstraintEvaluator, abort_early: bool) -> Vec<Violation> {
    if evaluator.is_valid(record.as_value()) {
        return Vec::new();
    }

    let mut failures = evaluator.evaluate(record.as_value(), abort_early);
    if abort_early {
        // At most one violation per record, whatever the evaluator returned.
        failures.truncate(1);
    }

    failures
        .into_iter()
        .map(|failure| Violation {
            row: record.row(),
            field: failure.field,
            keyword: failure.keyword,
            message: failure.message,
        })
        .collect()
}
