//! Record validation against the embedded catalog schemas.

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};
use crate::types::RecordKind;

const AUTHOR_SCHEMA: &str = include_str!("../schemas/author.json");
const WORK_SCHEMA: &str = include_str!("../schemas/work.json");
const EDITION_SCHEMA: &str = include_str!("../schemas/edition.json");

/// Returns the embedded JSON Schema for a record kind.
pub fn schema_for(kind: RecordKind) -> Result<Value, ValidateError> {
    let raw = match kind {
        RecordKind::Author => AUTHOR_SCHEMA,
        RecordKind::Work => WORK_SCHEMA,
        RecordKind::Edition => EDITION_SCHEMA,
    };
    serde_json::from_str(raw).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })
}

/// Validate a wire document against the schema for its record kind.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with one `SchemaError` per violation, or
/// `ValidateError::InvalidSchema` if the embedded schema itself fails to
/// compile.
pub fn validate_document(kind: RecordKind, document: &Value) -> Result<(), ValidateError> {
    let schema = schema_for(kind)?;
    validate_against_schema(&schema, document)
}

/// Validate a document against an already-loaded schema.
pub fn validate_against_schema(schema: &Value, document: &Value) -> Result<(), ValidateError> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
