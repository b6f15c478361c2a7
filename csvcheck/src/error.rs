//! Error types for the csvcheck pipeline.
//!
//! Malformed input and failed constraints are not errors in this sense: they
//! are data, collected in [`crate::report`] as [`ParseFailure`]s and
//! [`Violation`]s. The types here cover what stops a run before any input is
//! looked at, or what breaks the run itself:
//!
//! - [`ConfigError`] - Invalid options (unknown encoding label, bad delimiter)
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! [`ParseFailure`]: crate::report::ParseFailure
//! [`Violation`]: crate::report::Violation

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while resolving options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The encoding label is not known to the WHATWG encoding registry.
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Delimiters must be a single ASCII character other than a quote or newline.
    #[error("Invalid delimiter: {0:?}")]
    InvalidDelimiter(char),

    /// Parallel validation needs at least one worker.
    #[error("Number of jobs must be at least 1")]
    NoJobs,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::pipeline::check_files`]. It
/// never carries a parse failure or a violation; those are part of the
/// returned [`crate::report::Outcome`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Options could not be resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A worker task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for option resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
