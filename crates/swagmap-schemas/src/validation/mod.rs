//! Validation for Swagger 2.0 values and documents
//!
//! Two validators live here:
//!
//! - [`SwaggerValidator`] checks wire values against schema fragments and
//!   parameter objects, translating the Swagger dialect onto draft 4 JSON Schema
//! - [`SwaggerDocumentValidator`] checks the structure of a whole document in
//!   one of the [`ValidationMode`]s
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

pub mod base;
pub mod document;
pub mod error;
pub mod swagger;

pub use base::{SchemaValidator, ValidationContext, ValidationHelpers, ValidationMode};
pub use document::SwaggerDocumentValidator;
pub use error::{ValidationError, ValidationErrors, ValidationResult, Violation};
pub use swagger::{translate_schema, FormatCheck, SwaggerValidator};

/// Validation configuration for batch operations
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    /// Stop at the first failing document
    pub fail_fast: bool,
    /// Maximum number of errors to collect (0 = unlimited)
    pub max_errors: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Strict,
            fail_fast: false,
            max_errors: 0,
        }
    }
}

impl ValidationConfig {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn partial() -> Self {
        Self {
            mode: ValidationMode::Partial,
            ..Self::default()
        }
    }

    pub fn basic() -> Self {
        Self {
            mode: ValidationMode::Basic,
            ..Self::default()
        }
    }

    pub fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

/// Validate several Swagger documents, one error per failing document
pub fn validate_documents_batch(
    documents: &[serde_json::Value],
    config: &ValidationConfig,
) -> Result<(), ValidationErrors> {
    let validator = SwaggerDocumentValidator::new();
    let mut errors = ValidationErrors::new();
    let context = ValidationContext::new(config.mode);

    for (i, document) in documents.iter().enumerate() {
        if let Err(error) = validator.validate_with_context(document, &context.child_index(i)) {
            errors.add(error);

            if config.fail_fast {
                break;
            }
            if config.max_errors > 0 && errors.len() >= config.max_errors {
                break;
            }
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_config_builders() {
        let strict = ValidationConfig::strict().with_fail_fast().with_max_errors(5);
        assert_eq!(strict.mode, ValidationMode::Strict);
        assert!(strict.fail_fast);
        assert_eq!(strict.max_errors, 5);

        assert_eq!(ValidationConfig::partial().mode, ValidationMode::Partial);
        assert_eq!(ValidationConfig::basic().mode, ValidationMode::Basic);
    }

    #[test]
    fn test_batch_validation() {
        let documents = vec![
            json!({"swagger": "2.0", "info": {"title": "a", "version": "1"}, "paths": {}}),
            json!({"swagger": "1.2"}),
            json!({"swagger": "2.0"}),
        ];

        let errors = validate_documents_batch(&documents, &ValidationConfig::strict()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.errors[0].path.starts_with("$[1]"));

        let errors =
            validate_documents_batch(&documents, &ValidationConfig::strict().with_fail_fast()).unwrap_err();
        assert_eq!(errors.len(), 1);

        let errors = validate_documents_batch(&documents, &ValidationConfig::basic()).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
