//! # csvcheck - validate CSV files against JSON Schema
//!
//! csvcheck checks every row of a CSV file against a JSON Schema describing
//! one record, and reports every problem with the row it comes from instead
//! of stopping at the first one.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │──┐
//! │ (any enc.)  │     │ (typed rows)│  │   ┌──────────────┐     ┌─────────────┐
//! └─────────────┘     └─────────────┘  ├──▶│ Orchestrator │────▶│   Outcome   │
//! ┌─────────────┐     ┌─────────────┐  │   │ (per record) │     │ (exit code) │
//! │ Schema File │────▶│   Schema    │──┘   └──────────────┘     └─────────────┘
//! │ (JSON/YAML) │     │  (compiled) │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csvcheck::{check_files, CheckOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let outcome = check_files(Path::new("people.csv"), Path::new("rules.json"), &CheckOptions::default())
//!         .await
//!         .unwrap();
//!     println!("{} problem(s)", outcome.lines().len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Configuration and pipeline error types
//! - [`report`] - Parse failures, violations, reports and outcomes
//! - [`options`] - Read, schema and validation options
//! - [`parser`] - CSV parsing with encoding and delimiter detection
//! - [`schema`] - Schema document loading
//! - [`validation`] - Constraint evaluation and orchestration
//! - [`pipeline`] - Concurrent end-to-end runs
//! - [`logs`] - Progress log broadcasting

// Core modules
pub mod error;
pub mod options;
pub mod report;

// Inputs
pub mod parser;
pub mod schema;

// Validation
pub mod validation;

// Orchestration
pub mod logs;
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ConfigResult, PipelineError, PipelineResult};

// =============================================================================
// Re-exports - Report
// =============================================================================

pub use report::{FailureKind, Location, Outcome, ParseFailure, RowIndex, ValidationReport, Violation};

// =============================================================================
// Re-exports - Options
// =============================================================================

pub use options::{CheckOptions, ReadOptions, SchemaFormat, SchemaOptions, ValidateOptions};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    read_csv,
    read_csv_file,
    read_csv_from,
    ParsedTable,
    Record,
};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{load_schema, load_schema_file, Schema};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::orchestrator::{validate, validate_parallel};
pub use validation::{ConstraintEvaluator, ConstraintFailure, JsonSchemaEvaluator};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{check_bytes, check_files};
