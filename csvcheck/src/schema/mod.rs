//! Schema document loading.
//!
//! A schema is a JSON Schema document describing one record. It is read once,
//! in JSON or YAML syntax, and shared read-only by every record check.

use serde_json::Value;
use std::path::Path;

use crate::options::{resolve_encoding, SchemaFormat, SchemaOptions};
use crate::parser::{decode_content, detect_encoding};
use crate::report::{FailureKind, ParseFailure};

/// A loaded schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    document: Value,
}

impl Schema {
    /// Wrap an already-parsed document.
    pub fn from_value(document: Value) -> Result<Self, ParseFailure> {
        match document {
            Value::Object(_) | Value::Bool(_) => Ok(Self { document }),
            _ => Err(ParseFailure::schema(
                FailureKind::InvalidSchema,
                "Schema root must be an object or a boolean",
            )),
        }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Column names declared under `properties`, in document order.
    pub fn declared_fields(&self) -> Vec<&str> {
        self.document
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Load a schema from raw bytes.
pub fn load_schema(bytes: &[u8], options: &SchemaOptions) -> Result<Schema, ParseFailure> {
    let encoding = resolve_encoding(&options.encoding)
        .map_err(|e| ParseFailure::schema(FailureKind::InvalidEncoding, e.to_string()))?
        .unwrap_or_else(|| detect_encoding(bytes));

    let text = decode_content(bytes, encoding)
        .map_err(|message| ParseFailure::schema(FailureKind::InvalidEncoding, message))?;

    let document: Value = match options.format {
        SchemaFormat::Json => serde_json::from_str(&text)
            .map_err(|e| ParseFailure::schema(FailureKind::Syntax, format!("Invalid JSON: {}", e)))?,
        SchemaFormat::Yaml => serde_yaml::from_str(&text)
            .map_err(|e| ParseFailure::schema(FailureKind::Syntax, format!("Invalid YAML: {}", e)))?,
    };

    Schema::from_value(document)
}

/// Load a schema file; the format follows the options, not the extension.
pub fn load_schema_file<P: AsRef<Path>>(path: P, options: &SchemaOptions) -> Result<Schema, ParseFailure> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        ParseFailure::schema(
            FailureKind::Io,
            format!("Cannot read file '{}': {}", path.display(), e),
        )
    })?;
    load_schema(&bytes, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: &str = r#"{
        "type": "object",
        "required": ["name", "age"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "age": { "type": "number" }
        }
    }"#;

    #[test]
    fn test_load_json_schema() {
        let schema = load_schema(RULES.as_bytes(), &SchemaOptions::default()).unwrap();
        assert_eq!(schema.document()["required"], json!(["name", "age"]));
        assert_eq!(schema.declared_fields(), vec!["name", "age"]);
    }

    #[test]
    fn test_loading_is_deterministic() {
        let first = load_schema(RULES.as_bytes(), &SchemaOptions::default()).unwrap();
        let second = load_schema(RULES.as_bytes(), &SchemaOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_yaml_schema() {
        let yaml = "type: object\nproperties:\n  age:\n    type: number\n";
        let opts = SchemaOptions {
            format: SchemaFormat::Yaml,
            ..SchemaOptions::default()
        };

        let schema = load_schema(yaml.as_bytes(), &opts).unwrap();
        assert_eq!(schema.document()["properties"]["age"]["type"], "number");
    }

    #[test]
    fn test_yaml_and_json_agree() {
        let yaml = "type: object\nrequired: [name]\n";
        let json = r#"{"type": "object", "required": ["name"]}"#;
        let yaml_opts = SchemaOptions {
            format: SchemaFormat::Yaml,
            ..SchemaOptions::default()
        };

        assert_eq!(
            load_schema(yaml.as_bytes(), &yaml_opts).unwrap(),
            load_schema(json.as_bytes(), &SchemaOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_syntax_error_is_single_schema_failure() {
        let failure = load_schema(b"{ \"type\": ", &SchemaOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Syntax);
        assert!(failure.to_string().starts_with("Error at schema: Invalid JSON"));
    }

    #[test]
    fn test_scalar_root_rejected() {
        let failure = load_schema(b"42", &SchemaOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidSchema);
    }

    #[test]
    fn test_boolean_schema_accepted() {
        assert!(load_schema(b"true", &SchemaOptions::default()).is_ok());
    }

    #[test]
    fn test_bad_encoding_bytes() {
        let failure = load_schema(&[b'{', 0xFF, b'}'], &SchemaOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidEncoding);
    }

    #[test]
    fn test_missing_file() {
        let failure = load_schema_file("/no/such/rules.json", &SchemaOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Io);
        assert!(failure.message.contains("/no/such/rules.json"));
    }
}
