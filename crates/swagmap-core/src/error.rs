//! Error types for the swagmap core library
//!
//! Resolution failures, mapping (shape) failures and validation failures are
//! kept apart so callers can translate them into protocol-level responses.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use swagmap_schemas::{LoaderError, ValidationError};
use thiserror::Error;

/// Main error type for swagmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// A `$ref` could not be resolved against the document
    #[error("Unable to resolve reference '{reference}': {reason}")]
    SchemaResolution { reference: String, reason: String },

    /// Shape mismatch while marshaling or unmarshaling
    #[error("Mapping error: {message}")]
    Mapping { message: String },

    /// A wire value failed Swagger-dialect validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Neither the status code nor `default` is declared for the operation
    #[error("Response specification matching http status_code {status_code} not found for operation {operation_id}")]
    MatchingResponseNotFound { status_code: u16, operation_id: String },

    /// A request/response collaborator does not provide an attribute
    #[error("'{attribute}' is not implemented by this collaborator")]
    NotImplemented { attribute: String },

    /// The Swagger document is structurally unusable
    #[error("Invalid spec: {message}")]
    InvalidSpec { message: String },

    /// Document loading failed
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn mapping(message: impl Into<String>) -> Self {
        Error::Mapping {
            message: message.into(),
        }
    }

    pub fn schema_resolution(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SchemaResolution {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn not_implemented(attribute: impl Into<String>) -> Self {
        Error::NotImplemented {
            attribute: attribute.into(),
        }
    }

    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Error::InvalidSpec {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// True for shape errors raised by the marshaling engines
    pub fn is_mapping(&self) -> bool {
        matches!(self, Error::Mapping { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
