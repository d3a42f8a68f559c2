//! Errors raised by the snapshot engine.
//!
//! Only two conditions ever reach a caller: a stored snapshot written by a newer
//! schema than this build understands, and a strict-mode write whose envelope
//! fails validation. Everything else degrades to defaults inside the engine.

use thiserror::Error;

use crate::snapshot::ValidationReport;

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored snapshot uses a schema newer than this build can read.
    #[error("unsupported snapshot schema version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A strict write produced an envelope that does not conform to the schema.
    #[error("snapshot failed validation: {0}")]
    Validation(ValidationReport),
}

/// Failure while building a single Act. Recovered by the builder, which then
/// omits the Act instead of failing the whole envelope.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{field} has unusable shape: expected {expected}, found {found}")]
    Malformed {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to encode {field}: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    pub(crate) fn malformed(
        field: &'static str,
        expected: &'static str,
        found: &serde_json::Value,
    ) -> Self {
        Self::Malformed {
            field,
            expected,
            found: json_kind(found),
        }
    }
}

/// Human-readable name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
