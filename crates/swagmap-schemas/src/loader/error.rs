//! Error types for document loading operations
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised while reading, parsing, or bundling a Swagger document
#[derive(Error, Debug)]
pub enum LoaderError {
    /// File I/O errors
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing errors
    #[error("Failed to parse YAML file '{path}': {source}")]
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing errors
    #[error("Failed to parse JSON file '{path}': {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Unsupported file format
    #[error("Unsupported file format for '{path}'. Expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: PathBuf },

    /// An external `$ref` could not be followed
    #[error("Failed to resolve reference '{reference}' in '{source_path}': {reason}")]
    ReferenceError {
        reference: String,
        source_path: PathBuf,
        reason: String,
    },

    /// External documents nested deeper than the configured limit
    #[error("External reference chain too deep: {chain}")]
    CircularReference { chain: String },

    /// An external reference escapes the base directory
    #[error("Path traversal detected in reference '{reference}' from '{source_path}'")]
    PathTraversal {
        reference: String,
        source_path: PathBuf,
    },

    /// Document is not a Swagger 2.0 document
    #[error("Unsupported swagger version '{version}' in '{path}'")]
    UnsupportedVersion { version: String, path: PathBuf },

    /// Basic structural problems found while loading
    #[error("Invalid document '{path}': {reason}")]
    ValidationError { path: PathBuf, reason: String },
}

impl From<std::io::Error> for LoaderError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::from("<unknown>"),
            source: error,
        }
    }
}

impl LoaderError {
    /// Create an I/O error with path context
    pub fn io_error(path: PathBuf, error: std::io::Error) -> Self {
        Self::IoError {
            path,
            source: error,
        }
    }

    /// Create a YAML parsing error with path context
    pub fn yaml_parse_error(path: PathBuf, error: serde_yaml::Error) -> Self {
        Self::YamlParseError {
            path,
            source: error,
        }
    }

    /// Create a JSON parsing error with path context
    pub fn json_parse_error(path: PathBuf, error: serde_json::Error) -> Self {
        Self::JsonParseError {
            path,
            source: error,
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(path: PathBuf) -> Self {
        Self::UnsupportedFormat { path }
    }

    /// Create a reference resolution error
    pub fn reference_error(
        reference: impl Into<String>,
        source_path: PathBuf,
        reason: impl Into<String>,
    ) -> Self {
        Self::ReferenceError {
            reference: reference.into(),
            source_path,
            reason: reason.into(),
        }
    }

    /// Create an error for an over-deep chain of external documents
    pub fn circular_reference(chain: &[PathBuf]) -> Self {
        let chain_str = chain
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CircularReference { chain: chain_str }
    }

    /// Create a path traversal error
    pub fn path_traversal(reference: impl Into<String>, source_path: PathBuf) -> Self {
        Self::PathTraversal {
            reference: reference.into(),
            source_path,
        }
    }

    /// Create a structural validation error
    pub fn validation_error(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            path,
            reason: reason.into(),
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::IoError { path, .. } => Some(path),
            Self::YamlParseError { path, .. } => Some(path),
            Self::JsonParseError { path, .. } => Some(path),
            Self::UnsupportedFormat { path } => Some(path),
            Self::ReferenceError { source_path, .. } => Some(source_path),
            Self::PathTraversal { source_path, .. } => Some(source_path),
            Self::UnsupportedVersion { path, .. } => Some(path),
            Self::ValidationError { path, .. } => Some(path),
            Self::CircularReference { .. } => None,
        }
    }
}
