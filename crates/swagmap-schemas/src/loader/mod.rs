//! Swagger document loading
//!
//! This module provides:
//! - YAML and JSON parsing
//! - Bundling of external `$ref` targets into the root document
//! - An mtime-validated in-memory document cache
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use swagmap_schemas::loader::DocumentLoader;
//! use std::path::Path;
//!
//! let mut loader = DocumentLoader::new();
//! let document = loader.load(Path::new("petstore.yaml"))?;
//! println!("{}", document["info"]["title"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod schema_loader;

pub use cache::{CacheConfig, CacheStats, DocumentCache};
pub use error::{LoaderError, LoaderResult};
pub use parser::{DocumentParser, Format, SWAGGER_VERSION};
pub use resolver::{ReferenceBundler, ReferenceValidator, ResolverContext, BUNDLE_KEY, SCOPE_KEY};
pub use schema_loader::{DocumentLoader, LoaderConfig};
