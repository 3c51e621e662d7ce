//! Swagmap Core - converting between Swagger 2.0 wire JSON and native values
//!
//! A [`Spec`] is built once from a Swagger 2.0 document. It resolves
//! references, discovers models, and caches one conversion strategy per
//! schema node, so repeated conversions of the same shape do no schema
//! walking at all.
//!
//! # Main Components
//!
//! - **Schema resolution**: `$ref` following and attribute lookup through
//!   reference chains ([`SchemaResolver`])
//! - **Formats**: a registry of named string formats with wire and native
//!   conversions ([`FormatRegistry`])
//! - **Models**: named object types with inheritance and discriminator
//!   dispatch ([`ModelDescriptor`])
//! - **Marshal / unmarshal**: memoized, recursion-safe converters
//! - **Parameters and responses**: request and response level helpers
//!   built on the above
//!
//! # Example
//!
//! ```no_run
//! use swagmap_core::{unmarshal_model, Result, Spec};
//! use serde_json::json;
//!
//! fn example(document: serde_json::Value) -> Result<()> {
//!     let spec = Spec::builder(document).build()?;
//!     let pet = unmarshal_model(&spec, "Pet", &json!({"name": "rex"}))?;
//!     println!("{}", pet.to_json());
//!     Ok(())
//! }
//! ```
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod error;
pub mod formats;
pub mod marshal;
pub mod model;
pub mod operation;
pub mod param;
pub mod request;
pub mod response;
pub mod schema;
pub mod security;
pub mod spec;
pub mod strategy;
pub mod unmarshal;
pub mod validate;
pub mod value;

// Re-export main types for convenience
pub use config::SpecConfig;
pub use error::{Error, Result};
pub use formats::{FormatRegistry, ScopedFormat, SwaggerFormat};
pub use model::{FlattenedSchema, ModelDescriptor};
pub use schema::{AdditionalProperties, Schema, SchemaNode, SchemaResolver};
pub use spec::{Spec, SpecBuilder};
pub use value::{Model, Value};

// Conversions
pub use marshal::{marshal_model, marshal_schema_object};
pub use unmarshal::{unmarshal_model, unmarshal_schema_object};
pub use validate::{collect_schema_errors, validate_param, validate_schema_object};

// Operations, parameters and responses
pub use operation::{HeaderSpec, Operation, Resource, ResponseSpec};
pub use param::{
    marshal_param, marshal_request, unmarshal_param, unmarshal_request, CollectionFormat, Param,
    ParamLocation,
};
pub use request::{IncomingRequest, OutgoingRequest, RequestData};
pub use response::{
    get_response_spec, marshal_response_body, unmarshal_response, validate_outgoing_response,
    validate_response, IncomingResponse, OutgoingResponse, ResponseData, UnmarshaledResponse,
};
pub use security::{SecurityDefinition, SecurityScheme};

pub use swagmap_schemas::{ValidationError, ValidationErrors};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
