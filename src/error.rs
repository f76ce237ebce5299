//! Error types for catalog lookup, document mapping, and validation.

use thiserror::Error;

/// Errors raised while talking to the catalog service.
#[derive(Debug, Error)]
pub enum ClientError {
    // Transport errors (exit code 3). Non-2xx responses land here with the
    // status preserved on `source`.
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("login accepted no session cookie from {url}")]
    LoginRejected { url: String },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("book has no identifier in a supported scheme (isbn_10, isbn_13, lccn)")]
    NoUsableIdentifier,

    #[error("book has no author to resolve")]
    NoAuthor,
}

impl ClientError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } | Self::LoginRejected { .. } => 3, // IO
            _ => 2,                                                 // Input/protocol error
        }
    }
}

/// Errors while mapping a wire document into a typed record.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is missing required field \"{field}\"")]
    MissingField { field: &'static str },

    #[error("malformed field \"{field}\": {source}")]
    MalformedField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Olid(#[from] OlidError),
}

/// A string that is not a well-formed OL identifier.
#[derive(Debug, Clone, Error)]
#[error("invalid olid \"{value}\": expected OL prefix and a W, M, or A suffix")]
pub struct OlidError {
    pub value: String,
}

/// Errors during record validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}
