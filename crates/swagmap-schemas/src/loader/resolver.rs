//! External reference bundling
//!
//! Swagger documents may split definitions across files with references
//! such as `$ref: "models/pet.yaml#/Pet"`. The bundler loads every
//! referenced file once, stores it under the root's `x-bundled` mapping and
//! rewrites each reference into a local pointer into that mapping. Local
//! references inside a bundled file are rewritten relative to the file's
//! own location, so after bundling every `$ref` in the tree is a pointer
//! into the root document.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::parser::DocumentParser;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Root key holding the bundled external documents
pub const BUNDLE_KEY: &str = "x-bundled";

/// Key recording where a bundled document came from
pub const SCOPE_KEY: &str = "x-scope";

/// Context for bundling operations
#[derive(Debug, Clone)]
pub struct ResolverContext {
    /// Base directory external references must stay within
    pub base_dir: PathBuf,
    /// Documents currently being bundled, outermost first
    pub document_stack: Vec<PathBuf>,
    /// Maximum nesting of external documents
    pub max_depth: usize,
    /// Reject references that leave `base_dir`
    pub restrict_to_base: bool,
}

impl ResolverContext {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            document_stack: Vec::new(),
            max_depth: 16,
            restrict_to_base: true,
        }
    }

    /// Enter an external document
    pub fn push_document(&mut self, path: PathBuf) -> LoaderResult<()> {
        if self.document_stack.len() >= self.max_depth {
            let mut chain = self.document_stack.clone();
            chain.push(path);
            return Err(LoaderError::circular_reference(&chain));
        }
        self.document_stack.push(path);
        Ok(())
    }

    pub fn pop_document(&mut self) -> Option<PathBuf> {
        self.document_stack.pop()
    }

    /// Check that `path` lies under the base directory
    pub fn is_safe_path(&self, path: &Path) -> bool {
        let Ok(base) = self.base_dir.canonicalize() else {
            return false;
        };
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        match full.canonicalize() {
            Ok(canonical) => canonical.starts_with(&base),
            Err(_) => full
                .parent()
                .and_then(|parent| parent.canonicalize().ok())
                .map(|parent| parent.starts_with(&base))
                .unwrap_or(false),
        }
    }
}

/// Pulls external documents into the root document
#[derive(Debug)]
pub struct ReferenceBundler {
    parser: Arc<DocumentParser>,
    keys: HashMap<PathBuf, String>,
    used_keys: HashSet<String>,
    bundled: Map<String, Value>,
    root: Option<PathBuf>,
}

impl ReferenceBundler {
    pub fn new() -> Self {
        Self::with_parser(Arc::new(DocumentParser::new()))
    }

    pub fn with_parser(parser: Arc<DocumentParser>) -> Self {
        Self {
            parser,
            keys: HashMap::new(),
            used_keys: HashSet::new(),
            bundled: Map::new(),
            root: None,
        }
    }

    /// Bundle every external reference reachable from `root`
    ///
    /// `root_path` is the file the root was read from, if any; references are
    /// resolved relative to its directory (or `context.base_dir` otherwise).
    pub fn bundle(
        &mut self,
        mut root: Value,
        root_path: Option<&Path>,
        context: &mut ResolverContext,
    ) -> LoaderResult<Value> {
        self.reset();
        self.root = root_path.and_then(|p| p.canonicalize().ok());

        let root_dir = self
            .root
            .as_ref()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| context.base_dir.clone());

        self.rewrite(&mut root, None, &root_dir, context)?;

        if !self.bundled.is_empty() {
            let bundled = std::mem::take(&mut self.bundled);
            match root.as_object_mut() {
                Some(obj) => {
                    obj.insert(BUNDLE_KEY.to_string(), Value::Object(bundled));
                }
                None => {
                    return Err(LoaderError::validation_error(
                        root_dir,
                        "Cannot bundle external references into a non-object document",
                    ))
                }
            }
        }

        Ok(root)
    }

    /// Number of external documents pulled in by the last `bundle` call
    pub fn bundled_count(&self) -> usize {
        self.keys.len()
    }

    fn reset(&mut self) {
        self.keys.clear();
        self.used_keys.clear();
        self.bundled.clear();
        self.root = None;
    }

    fn rewrite(
        &mut self,
        value: &mut Value,
        scope: Option<&str>,
        doc_dir: &Path,
        context: &mut ResolverContext,
    ) -> LoaderResult<()> {
        match value {
            Value::Object(obj) => {
                if let Some(Value::String(reference)) = obj.get_mut("$ref") {
                    *reference = self.rewrite_reference(reference, scope, doc_dir, context)?;
                }
                for (key, child) in obj.iter_mut() {
                    if key != "$ref" {
                        self.rewrite(child, scope, doc_dir, context)?;
                    }
                }
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.rewrite(item, scope, doc_dir, context)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn rewrite_reference(
        &mut self,
        reference: &str,
        scope: Option<&str>,
        doc_dir: &Path,
        context: &mut ResolverContext,
    ) -> LoaderResult<String> {
        let (file_part, pointer) = match reference.find('#') {
            Some(pos) => (&reference[..pos], &reference[pos + 1..]),
            None => (reference, ""),
        };
        ReferenceValidator::validate_json_pointer(pointer)?;

        if file_part.is_empty() {
            return Ok(match scope {
                None => reference.to_string(),
                Some(key) => format!("#/{BUNDLE_KEY}/{key}{pointer}"),
            });
        }

        if file_part.contains("://") {
            return Err(LoaderError::reference_error(
                reference,
                doc_dir.to_path_buf(),
                "Remote references are not supported",
            ));
        }

        let full = doc_dir.join(file_part);
        if context.restrict_to_base && !context.is_safe_path(&full) {
            return Err(LoaderError::path_traversal(reference, doc_dir.to_path_buf()));
        }
        let canonical = full
            .canonicalize()
            .map_err(|e| LoaderError::io_error(full.clone(), e))?;

        if self.root.as_deref() == Some(canonical.as_path()) {
            return Ok(format!("#{pointer}"));
        }

        let key = self.ensure_bundled(&canonical, context)?;
        Ok(format!("#/{BUNDLE_KEY}/{key}{pointer}"))
    }

    fn ensure_bundled(&mut self, canonical: &Path, context: &mut ResolverContext) -> LoaderResult<String> {
        if let Some(key) = self.keys.get(canonical) {
            return Ok(key.clone());
        }

        let key = self.allocate_key(canonical, &context.base_dir);
        // registered before descending so mutually referencing files terminate
        self.keys.insert(canonical.to_path_buf(), key.clone());

        context.push_document(canonical.to_path_buf())?;
        let mut document = self.parser.parse_file(canonical)?;
        let doc_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| context.base_dir.clone());
        self.rewrite(&mut document, Some(&key), &doc_dir, context)?;
        context.pop_document();

        if let Some(obj) = document.as_object_mut() {
            obj.insert(
                SCOPE_KEY.to_string(),
                Value::Array(vec![Value::String(canonical.display().to_string())]),
            );
        }

        log::debug!("bundled external document {} as '{}'", canonical.display(), key);
        self.bundled.insert(key.clone(), document);
        Ok(key)
    }

    /// Pointer-safe key derived from the path relative to the base directory
    fn allocate_key(&mut self, canonical: &Path, base_dir: &Path) -> String {
        let relative = base_dir
            .canonicalize()
            .ok()
            .and_then(|base| canonical.strip_prefix(base).ok().map(Path::to_path_buf))
            .unwrap_or_else(|| canonical.to_path_buf());

        let stem: String = relative
            .to_string_lossy()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_start_matches('_').to_string();

        let mut key = stem.clone();
        let mut suffix = 1;
        while self.used_keys.contains(&key) {
            suffix += 1;
            key = format!("{stem}_{suffix}");
        }
        self.used_keys.insert(key.clone());
        key
    }
}

impl Default for ReferenceBundler {
    fn default() -> Self {
        Self::new()
    }
}

/// Utility functions for reference validation
pub struct ReferenceValidator;

impl ReferenceValidator {
    /// Check JSON pointer syntax (empty, or `/`-prefixed with valid `~` escapes)
    pub fn validate_json_pointer(pointer: &str) -> LoaderResult<()> {
        if pointer.is_empty() {
            return Ok(());
        }

        if !pointer.starts_with('/') {
            return Err(LoaderError::validation_error(
                PathBuf::from("<pointer>"),
                format!("JSON pointer '{pointer}' must start with '/' or be empty"),
            ));
        }

        for segment in pointer.split('/').skip(1) {
            let mut chars = segment.chars().peekable();
            while let Some(ch) = chars.next() {
                if ch == '~' && chars.next_if(|c| *c == '0' || *c == '1').is_none() {
                    return Err(LoaderError::validation_error(
                        PathBuf::from("<pointer>"),
                        format!("Invalid escape sequence in JSON pointer '{pointer}'"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Collect every `$ref` string in a document
    pub fn extract_references(value: &Value) -> HashSet<String> {
        let mut references = HashSet::new();
        Self::extract_refs_recursive(value, &mut references);
        references
    }

    fn extract_refs_recursive(value: &Value, references: &mut HashSet<String>) {
        match value {
            Value::Object(obj) => {
                if let Some(Value::String(reference)) = obj.get("$ref") {
                    references.insert(reference.clone());
                }
                for val in obj.values() {
                    Self::extract_refs_recursive(val, references);
                }
            }
            Value::Array(arr) => {
                for item in arr {
                    Self::extract_refs_recursive(item, references);
                }
            }
            _ => {}
        }
    }
}
