//! Swagger document loader combining parsing, bundling and caching
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::loader::{
    cache::{CacheConfig, CacheStats, DocumentCache},
    error::{LoaderError, LoaderResult},
    parser::{DocumentParser, Format},
    resolver::{ReferenceBundler, ResolverContext},
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for loader behavior
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub cache: CacheConfig,
    /// Maximum nesting of external documents
    pub max_resolution_depth: usize,
    /// Require `swagger: "2.0"` at the root
    pub validate_basic_structure: bool,
    /// Pull external `$ref` targets into `x-bundled`
    pub bundle_external_refs: bool,
    /// Reject external references outside the base directory
    pub restrict_to_base_dir: bool,
    /// Base directory for relative references; defaults to the document's directory
    pub base_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            max_resolution_depth: 16,
            validate_basic_structure: true,
            bundle_external_refs: true,
            restrict_to_base_dir: true,
            base_dir: None,
        }
    }
}

/// Loads Swagger documents from disk or text
#[derive(Debug)]
pub struct DocumentLoader {
    config: LoaderConfig,
    cache: DocumentCache,
    parser: Arc<DocumentParser>,
    bundler: ReferenceBundler,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        let parser = Arc::new(DocumentParser::new());
        Self {
            cache: DocumentCache::with_config(config.cache.clone()),
            bundler: ReferenceBundler::with_parser(Arc::clone(&parser)),
            parser,
            config,
        }
    }

    /// Load a document from a `.yaml`, `.yml` or `.json` file
    pub fn load(&mut self, path: &Path) -> LoaderResult<Value> {
        if let Some(cached) = self.cache.get(path)? {
            log::debug!("document cache hit for {}", path.display());
            return Ok(cached);
        }

        let document = self.parser.parse_file(path)?;
        let base_dir = self.base_dir_for(path)?;
        let document = self.prepare(document, Some(path), base_dir)?;

        self.cache.put(path, document.clone())?;
        Ok(document)
    }

    /// Load a document from text, resolving external references against `base_dir`
    ///
    /// JSON is tried before YAML.
    pub fn load_str(&mut self, content: &str, base_dir: Option<&Path>) -> LoaderResult<Value> {
        let origin = PathBuf::from("<inline>");
        let (document, _format) = self.parser.parse_with_fallback(content, &origin)?;
        let base_dir = base_dir
            .map(Path::to_path_buf)
            .or_else(|| self.config.base_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        self.prepare(document, None, base_dir)
    }

    /// Load bypassing and refreshing the cache
    pub fn reload(&mut self, path: &Path) -> LoaderResult<Value> {
        self.cache.remove(path)?;
        self.load(path)
    }

    /// Serialize a loaded document in the format implied by `path`
    pub fn write(&self, document: &Value, path: &Path) -> LoaderResult<()> {
        let format = Format::from_path(path)?;
        let text = self.parser.serialize(document, format, path)?;
        std::fs::write(path, text).map_err(|e| LoaderError::io_error(path.to_path_buf(), e))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn prepare(&mut self, document: Value, path: Option<&Path>, base_dir: PathBuf) -> LoaderResult<Value> {
        let origin = path.map(Path::to_path_buf).unwrap_or_else(|| base_dir.clone());

        if self.config.validate_basic_structure {
            self.parser.validate_basic_structure(&document, &origin)?;
        }

        if !self.config.bundle_external_refs {
            return Ok(document);
        }

        let mut context = ResolverContext::new(base_dir);
        context.max_depth = self.config.max_resolution_depth;
        context.restrict_to_base = self.config.restrict_to_base_dir;

        let bundled = self.bundler.bundle(document, path, &mut context)?;
        if self.bundler.bundled_count() > 0 {
            log::info!(
                "bundled {} external document(s) into {}",
                self.bundler.bundled_count(),
                origin.display()
            );
        }
        Ok(bundled)
    }

    fn base_dir_for(&self, path: &Path) -> LoaderResult<PathBuf> {
        if let Some(base_dir) = &self.config.base_dir {
            return Ok(base_dir.clone());
        }
        match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Ok(PathBuf::from(".")),
            Some(parent) => Ok(parent.to_path_buf()),
            None => Err(LoaderError::validation_error(
                path.to_path_buf(),
                "Cannot determine base directory",
            )),
        }
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const PETSTORE: &str = r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0"
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: ok
          schema:
            type: array
            items:
              $ref: "#/definitions/Pet"
definitions:
  Pet:
    $ref: "models.yaml#/Pet"
"##;

    #[test]
    fn test_load_with_external_definitions() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let api = dir.path().join("api.yaml");
        fs::write(&api, PETSTORE)?;
        fs::write(
            dir.path().join("models.yaml"),
            "Pet:\n  type: object\n  required: [name]\n  properties:\n    name:\n      type: string\n",
        )?;

        let mut loader = DocumentLoader::new();
        let doc = loader.load(&api)?;

        assert_eq!(doc["definitions"]["Pet"]["$ref"], "#/x-bundled/models.yaml/Pet");
        assert_eq!(
            doc.pointer("/x-bundled/models.yaml/Pet/required/0"),
            Some(&json!("name"))
        );
        Ok(())
    }

    #[test]
    fn test_cache_reuse() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let api = dir.path().join("api.json");
        fs::write(&api, r#"{"swagger": "2.0", "paths": {}}"#)?;

        let mut loader = DocumentLoader::new();
        let first = loader.load(&api)?;
        let second = loader.load(&api)?;
        assert_eq!(first, second);
        assert_eq!(loader.cache_stats().hits, 1);

        let third = loader.reload(&api)?;
        assert_eq!(first, third);
        Ok(())
    }

    #[test]
    fn test_rejects_non_swagger_document() {
        let dir = tempdir().unwrap();
        let api = dir.path().join("api.json");
        fs::write(&api, r#"{"openapi": "3.0.0"}"#).unwrap();

        let mut loader = DocumentLoader::new();
        assert!(matches!(
            loader.load(&api),
            Err(LoaderError::ValidationError { .. })
        ));

        let mut lenient = DocumentLoader::with_config(LoaderConfig {
            validate_basic_structure: false,
            ..LoaderConfig::default()
        });
        assert!(lenient.load(&api).is_ok());
    }

    #[test]
    fn test_load_str() -> LoaderResult<()> {
        let mut loader = DocumentLoader::new();
        let doc = loader.load_str(r#"{"swagger": "2.0", "paths": {}}"#, None)?;
        assert_eq!(doc["swagger"], "2.0");

        let doc = loader.load_str("swagger: '2.0'\npaths: {}\n", None)?;
        assert!(doc["paths"].is_object());
        Ok(())
    }

    #[test]
    fn test_write_round_trips_through_loader() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.yaml");
        let mut loader = DocumentLoader::new();
        let doc = json!({"swagger": "2.0", "paths": {}});

        loader.write(&doc, &out)?;
        assert_eq!(loader.load(&out)?, doc);
        Ok(())
    }
}
