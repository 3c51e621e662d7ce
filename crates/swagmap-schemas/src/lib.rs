//! Swagmap Schemas - Swagger 2.0 document loading and validation
//!
//! This crate covers the document-facing side of swagmap:
//!
//! - **Loading**: YAML/JSON parsing, bundling of external `$ref` targets into
//!   the root document and an mtime-validated document cache
//! - **Value validation**: Swagger-dialect schemas (`x-nullable`, boolean
//!   `required` on parameters, per-element `enum` on arrays, `type: file`)
//!   validated through a draft 4 JSON Schema validator
//! - **Document validation**: structural rules for whole Swagger 2.0
//!   documents in Basic, Partial and Strict modes
//!
//! ## Quick Start
//!
//! ```rust
//! use swagmap_schemas::{SchemaValidator, SwaggerDocumentValidator, SwaggerValidator};
//! use serde_json::json;
//!
//! let document = json!({
//!     "swagger": "2.0",
//!     "info": {"title": "Petstore", "version": "1.0"},
//!     "paths": {},
//!     "definitions": {
//!         "Pet": {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}
//!     }
//! });
//!
//! assert!(SwaggerDocumentValidator::new().validate(&document).is_ok());
//!
//! let values = SwaggerValidator::new(&document);
//! let pet = json!({"$ref": "#/definitions/Pet"});
//! assert!(values.validate_schema_object(&pet, &json!({"name": "rex"})).is_ok());
//! assert!(values.validate_schema_object(&pet, &json!({})).is_err());
//! ```
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

pub mod loader;
pub mod validation;

pub use loader::{DocumentLoader, LoaderConfig, LoaderError, LoaderResult, BUNDLE_KEY};
pub use validation::{
    translate_schema, validate_documents_batch, FormatCheck, SchemaValidator, SwaggerDocumentValidator,
    SwaggerValidator, ValidationConfig, ValidationContext, ValidationError, ValidationErrors,
    ValidationHelpers, ValidationMode, ValidationResult, Violation,
};
