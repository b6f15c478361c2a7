//! Record validation against a schema.
//!
//! Constraint checking sits behind [`ConstraintEvaluator`]: given one record,
//! return the constraints it fails, in check order. [`JsonSchemaEvaluator`]
//! is the shipped implementation; the [`orchestrator`] only ever talks to the
//! trait, so any constraint engine can be swapped in.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use csvcheck::{ConstraintEvaluator, JsonSchemaEvaluator, Schema};
//!
//! let schema = Schema::from_value(json!({
//!     "type": "object",
//!     "properties": { "age": { "type": "number" } }
//! })).unwrap();
//! let evaluator = JsonSchemaEvaluator::new(&schema).unwrap();
//!
//! assert!(evaluator.evaluate(&json!({ "age": 30 }), false).is_empty());
//! assert_eq!(evaluator.evaluate(&json!({ "age": "old" }), false)[0].field, "age");
//! ```

pub mod orchestrator;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde_json::Value;

use crate::report::{FailureKind, ParseFailure};
use crate::schema::Schema;

/// Field path used for constraints on the record as a whole.
pub const RECORD_FIELD: &str = "(record)";

/// One failed constraint, as reported by an evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintFailure {
    /// Dotted path of the field inside the record.
    pub field: String,
    /// Schema keyword that failed, when the engine knows it.
    pub keyword: Option<String>,
    pub message: String,
}

/// Checks one record against a schema bound at construction.
pub trait ConstraintEvaluator: Send + Sync {
    /// Return every failed constraint, or only the first one when
    /// `abort_early` is set.
    fn evaluate(&self, record: &Value, abort_early: bool) -> Vec<ConstraintFailure>;

    /// Whether the record passes every constraint.
    fn is_valid(&self, record: &Value) -> bool {
        self.evaluate(record, true).is_empty()
    }
}

/// JSON Schema evaluator backed by the `jsonschema` crate.
///
/// The draft is taken from the document's `$schema`, defaulting to the
/// latest one. The schema is compiled once and reused for every record.
pub struct JsonSchemaEvaluator {
    validator: Validator,
    declared_fields: Vec<String>,
}

impl JsonSchemaEvaluator {
    /// Compile a schema. An unusable schema is a parse failure of the schema document.
    pub fn new(schema: &Schema) -> Result<Self, ParseFailure> {
        let validator = jsonschema::validator_for(schema.document()).map_err(|e| {
            ParseFailure::schema(FailureKind::InvalidSchema, format!("Invalid schema: {}", e))
        })?;
        let declared_fields = schema.declared_fields().into_iter().map(str::to_string).collect();
        Ok(Self {
            validator,
            declared_fields,
        })
    }

    /// Columns the schema names under `properties`.
    pub fn declared_fields(&self) -> &[String] {
        &self.declared_fields
    }
}

impl ConstraintEvaluator for JsonSchemaEvaluator {
    fn is_valid(&self, record: &Value) -> bool {
        self.validator.is_valid(record)
    }

    fn evaluate(&self, record: &Value, abort_early: bool) -> Vec<ConstraintFailure> {
        if abort_early {
            return match self.validator.validate(record) {
                Ok(()) => Vec::new(),
                Err(error) => vec![to_failure(&error)],
            };
        }

        self.validator
            .iter_errors(record)
            .map(|error| to_failure(&error))
            .collect()
    }
}

fn to_failure(error: &ValidationError<'_>) -> ConstraintFailure {
    let keyword = error
        .schema_path
        .to_string()
        .rsplit('/')
        .next()
        .filter(|k| !k.is_empty())
        .map(str::to_string);

    let mut segments = pointer_segments(&error.instance_path.to_string());

    let message = match &error.kind {
        ValidationErrorKind::Required { property } => {
            segments.push(match property {
                Value::String(name) => name.clone(),
                other => other.to_string(),
            });
            "is required".to_string()
        }
        _ => match &keyword {
            Some(keyword) => format!("does not satisfy '{}': {}", keyword, error),
            None => format!("is invalid: {}", error),
        },
    };

    let field = if segments.is_empty() {
        RECORD_FIELD.to_string()
    } else {
        segments.join(".")
    };

    ConstraintFailure {
        field,
        keyword,
        message,
    }
}

/// Split a JSON pointer (`/a/b~1c`) into unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn evaluator(schema: Value) -> JsonSchemaEvaluator {
        JsonSchemaEvaluator::new(&Schema::from_value(schema).unwrap()).unwrap()
    }

    fn people() -> JsonSchemaEvaluator {
        evaluator(json!({
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": { "type": "string", "minLength": 4 },
                "age": { "type": "number" }
            }
        }))
    }

    #[test]
    fn test_valid_record() {
        let failures = people().evaluate(&json!({ "name": "Alice", "age": 30 }), false);
        assert!(failures.is_empty());
        assert!(people().is_valid(&json!({ "name": "Alice", "age": 30 })));
    }

    #[test]
    fn test_declared_fields_follow_schema() {
        assert_eq!(people().declared_fields(), ["name", "age"]);
        assert!(evaluator(json!(true)).declared_fields().is_empty());
    }

    #[test]
    fn test_type_failure_names_field_and_keyword() {
        let failures = people().evaluate(&json!({ "name": "Alice", "age": "notanumber" }), false);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "age");
        assert_eq!(failures[0].keyword.as_deref(), Some("type"));
        assert!(failures[0].message.starts_with("does not satisfy 'type'"));
    }

    #[test]
    fn test_all_failures_without_abort_early() {
        let failures = people().evaluate(&json!({ "name": "Bob", "age": "x" }), false);
        let fields: Vec<&str> = failures.iter().map(|f| f.field.as_str()).collect();

        assert_eq!(failures.len(), 2);
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"age"));
    }

    #[test]
    fn test_abort_early_returns_one() {
        let failures = people().evaluate(&json!({ "name": "Bob", "age": "x" }), true);
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_required_names_missing_property() {
        let failures = people().evaluate(&json!({ "name": "Alice" }), false);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "age");
        assert_eq!(failures[0].keyword.as_deref(), Some("required"));
        assert_eq!(failures[0].message, "is required");
    }

    #[test]
    fn test_record_level_failure() {
        let strict = evaluator(json!({
            "type": "object",
            "properties": { "a": {} },
            "additionalProperties": false
        }));
        let failures = strict.evaluate(&json!({ "a": 1, "b": 2 }), false);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, RECORD_FIELD);
    }

    #[test]
    fn test_invalid_schema_is_parse_failure() {
        let schema = Schema::from_value(json!({ "type": "not-a-type" })).unwrap();
        let failure = JsonSchemaEvaluator::new(&schema).err().unwrap();
        assert_eq!(failure.kind, FailureKind::InvalidSchema);
        assert!(failure.to_string().starts_with("Error at schema: Invalid schema"));
    }

    #[test]
    fn test_pointer_segments_unescape() {
        assert_eq!(pointer_segments(""), Vec::<String>::new());
        assert_eq!(pointer_segments("/a/b~1c/d~0e"), vec!["a", "b/c", "d~e"]);
    }
}
