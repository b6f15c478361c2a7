//! End-to-end run: load both inputs, then validate.
//!
//! The CSV file and the schema are loaded on two blocking tasks at the same
//! time. Validation starts only once both are in; if either failed, the run
//! ends with its parse failures and no record is checked.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvcheck::{check_files, CheckOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = check_files(
//!         Path::new("people.csv"),
//!         Path::new("people.schema.json"),
//!         &CheckOptions::default(),
//!     ).await?;
//!
//!     for line in outcome.lines() {
//!         eprintln!("{}", line);
//!     }
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::error::PipelineResult;
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::options::{CheckOptions, ValidateOptions};
use crate::parser::{read_csv, read_csv_file, ParsedTable};
use crate::report::{Outcome, ParseFailure};
use crate::schema::{load_schema, load_schema_file};
use crate::validation::orchestrator::{validate, validate_parallel};
use crate::validation::{ConstraintEvaluator, JsonSchemaEvaluator};

type TableResult = Result<ParsedTable, Vec<ParseFailure>>;
type EvaluatorResult = Result<JsonSchemaEvaluator, ParseFailure>;

/// Check a CSV file against a schema file.
///
/// Parse failures and violations are part of the returned [`Outcome`]; the
/// error path is reserved for bad options and broken worker tasks.
pub async fn check_files(data_path: &Path, schema_path: &Path, options: &CheckOptions) -> PipelineResult<Outcome> {
    options.check()?;
    log_info(format!("Reading {} and {}...", data_path.display(), schema_path.display()));

    let read_options = options.read.clone();
    let data_path = data_path.to_path_buf();
    let table_task = tokio::task::spawn_blocking(move || read_csv_file(&data_path, &read_options));

    let schema_options = options.schema.clone();
    let schema_path = schema_path.to_path_buf();
    let schema_task = tokio::task::spawn_blocking(move || {
        load_schema_file(&schema_path, &schema_options).and_then(|schema| JsonSchemaEvaluator::new(&schema))
    });

    let (table, evaluator) = tokio::try_join!(table_task, schema_task)?;
    check_loaded(table, evaluator, &options.validate).await
}

/// Check in-memory CSV bytes against in-memory schema bytes.
pub async fn check_bytes(data: Vec<u8>, schema: Vec<u8>, options: &CheckOptions) -> PipelineResult<Outcome> {
    options.check()?;

    let read_options = options.read.clone();
    let table_task = tokio::task::spawn_blocking(move || read_csv(&data, &read_options));

    let schema_options = options.schema.clone();
    let schema_task = tokio::task::spawn_blocking(move || {
        load_schema(&schema, &schema_options).and_then(|schema| JsonSchemaEvaluator::new(&schema))
    });

    let (table, evaluator) = tokio::try_join!(table_task, schema_task)?;
    check_loaded(table, evaluator, &options.validate).await
}

async fn check_loaded(
    table: TableResult,
    evaluator: EvaluatorResult,
    options: &ValidateOptions,
) -> PipelineResult<Outcome> {
    let (table, evaluator) = match (table, evaluator) {
        (Ok(table), Ok(evaluator)) => (table, evaluator),
        (table, evaluator) => {
            let mut failures = table.err().unwrap_or_default();
            failures.extend(evaluator.err());
            log_error(format!("{} parse failure(s), validation skipped", failures.len()));
            return Ok(Outcome::ParseFailed { failures });
        }
    };

    print_table_info(&table);
    for column in missing_columns(evaluator.declared_fields(), &table.headers) {
        log_warning(format!("Schema property '{}' has no column in the CSV", column));
    }

    log_info(format!(
        "Validating {} records{}...",
        table.records.len(),
        if options.abort_early { " (abort early)" } else { "" }
    ));

    let report = if options.jobs > 1 && table.records.len() > 1 {
        log_info_indent(format!("{} workers", options.jobs), 1);
        let evaluator: Arc<dyn ConstraintEvaluator> = Arc::new(evaluator);
        validate_parallel(Arc::new(table.records), evaluator, options).await?
    } else {
        validate(&table.records, &evaluator, options)
    };

    if report.is_success() {
        log_success("All records valid!");
    } else {
        log_warning(format!("{} violation(s)", report.violations().len()));
    }

    Ok(report.into())
}

/// Print CSV metadata
fn print_table_info(table: &ParsedTable) {
    log_success(format!("Encoding: {}", table.encoding.name()));
    log_success(format!("Delimiter: '{}'", format_delimiter(table.delimiter)));
    log_success(format!("Read {} rows", table.records.len()));
    log_info(format!("CSV has {} columns:", table.headers.len()));
    for (i, col) in table.headers.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }
}

/// Declared schema properties absent from the header, in schema order.
fn missing_columns<'a>(declared: &'a [String], headers: &[String]) -> Vec<&'a str> {
    declared
        .iter()
        .filter(|name| !headers.contains(name))
        .map(String::as_str)
        .collect()
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
