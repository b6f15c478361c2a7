//! Options for reading, schema loading, and validation.
//!
//! All option structs are plain serde values with defaults matching the CLI,
//! so embedding callers can build them in code or deserialize them from a
//! configuration document.

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Encoding label meaning "detect from the bytes".
pub const AUTO_ENCODING: &str = "auto";

/// Default encoding label.
pub const DEFAULT_ENCODING: &str = "utf8";

/// How the CSV input is tokenized and typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadOptions {
    /// Convert cells into numbers, booleans and nulls according to their format.
    pub dynamic_typing: bool,

    /// Encoding label (`utf8`, `latin1`, `windows-1252`, ... or `auto`).
    pub encoding: String,

    /// Drop rows whose cells are all empty.
    pub skip_empty_lines: bool,

    /// Field delimiter (auto-detect from the header line if not specified).
    pub delimiter: Option<char>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            dynamic_typing: false,
            encoding: DEFAULT_ENCODING.to_string(),
            skip_empty_lines: false,
            delimiter: None,
        }
    }
}

impl ReadOptions {
    /// Check that the encoding label and delimiter are usable.
    pub fn check(&self) -> ConfigResult<()> {
        resolve_encoding(&self.encoding)?;
        if let Some(d) = self.delimiter {
            if !d.is_ascii() || matches!(d, '"' | '\n' | '\r') {
                return Err(ConfigError::InvalidDelimiter(d));
            }
        }
        Ok(())
    }
}

/// Syntax of the schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFormat {
    #[default]
    Json,
    Yaml,
}

impl SchemaFormat {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is JSON.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => SchemaFormat::Yaml,
            _ => SchemaFormat::Json,
        }
    }
}

/// How the schema document is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaOptions {
    pub encoding: String,
    pub format: SchemaFormat,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            format: SchemaFormat::Json,
        }
    }
}

/// How records are checked against the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidateOptions {
    /// Stop checking a record at its first failed constraint.
    ///
    /// This never stops the run: every record is still checked.
    pub abort_early: bool,

    /// Number of workers for record validation (1 = sequential).
    pub jobs: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            abort_early: false,
            jobs: 1,
        }
    }
}

/// Everything a full run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckOptions {
    pub read: ReadOptions,
    pub schema: SchemaOptions,
    pub validate: ValidateOptions,
}

impl CheckOptions {
    /// Options with one encoding shared by both input files, as the CLI does.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        let encoding = encoding.into();
        self.schema.encoding = encoding.clone();
        self.read.encoding = encoding;
        self
    }

    pub fn check(&self) -> ConfigResult<()> {
        self.read.check()?;
        resolve_encoding(&self.schema.encoding)?;
        if self.validate.jobs == 0 {
            return Err(ConfigError::NoJobs);
        }
        Ok(())
    }
}

/// Resolve an encoding label.
///
/// Returns `None` for [`AUTO_ENCODING`]. Node-style labels such as `utf8`,
/// `latin1` and `ucs2` are accepted next to the WHATWG ones.
pub fn resolve_encoding(label: &str) -> ConfigResult<Option<&'static Encoding>> {
    let normalized = label.trim().to_ascii_lowercase();
    if normalized == AUTO_ENCODING {
        return Ok(None);
    }

    let whatwg = match normalized.as_str() {
        "utf8" => "utf-8",
        "ucs2" | "ucs-2" | "utf16le" => "utf-16le",
        "binary" => "latin1",
        other => other,
    };

    Encoding::for_label(whatwg.as_bytes())
        .map(Some)
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))
}
