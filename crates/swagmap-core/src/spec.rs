//! The loaded Swagger document and everything derived from it
//!
//! A [`Spec`] owns the document, the schema resolver, the model descriptors,
//! the operations and the strategy caches. It is built once and then shared
//! read-only; the caches tolerate concurrent first use.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::config::SpecConfig;
use crate::error::{Error, Result};
use crate::formats::FormatRegistry;
use crate::model::{link_subtypes, ModelDescriptor};
use crate::operation::{build_operations, group_resources, Operation, Resource};
use crate::schema::{escape_pointer_segment, is_model_shaped, Schema, SchemaNode, SchemaResolver};
use crate::security::SecurityDefinition;
use crate::strategy::{MarshalFn, MarshalStrategy, StrategyCache, UnmarshalFn, UnmarshalStrategy};
use crate::{marshal, unmarshal};
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use swagmap_schemas::{DocumentLoader, SchemaValidator, SwaggerDocumentValidator, SwaggerValidator, BUNDLE_KEY};

/// A loaded Swagger 2.0 document
pub struct Spec {
    document: Arc<Json>,
    origin_url: Option<String>,
    config: SpecConfig,
    formats: Arc<FormatRegistry>,
    resolver: SchemaResolver,
    definitions: IndexMap<String, Schema>,
    models: IndexMap<String, Arc<ModelDescriptor>>,
    operations: IndexMap<String, Arc<Operation>>,
    resources: IndexMap<String, Resource>,
    security_definitions: IndexMap<String, SecurityDefinition>,
    validator: SwaggerValidator,
    unmarshalers: StrategyCache<UnmarshalFn>,
    marshalers: StrategyCache<MarshalFn>,
    format_generation: AtomicU64,
}

impl std::fmt::Debug for Spec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spec")
            .field("origin_url", &self.origin_url)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Spec`]
#[derive(Debug)]
pub struct SpecBuilder {
    document: Json,
    origin_url: Option<String>,
    config: SpecConfig,
    formats: Option<Arc<FormatRegistry>>,
}

impl SpecBuilder {
    pub fn origin_url(mut self, url: impl Into<String>) -> Self {
        self.origin_url = Some(url.into());
        self
    }

    pub fn config(mut self, config: SpecConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific registry instead of [`FormatRegistry::shared`]
    pub fn formats(mut self, formats: Arc<FormatRegistry>) -> Self {
        self.formats = Some(formats);
        self
    }

    pub fn build(self) -> Result<Spec> {
        let SpecBuilder {
            document,
            origin_url,
            config,
            formats,
        } = self;

        if config.validate_swagger_spec {
            SwaggerDocumentValidator::new().validate(&document)?;
        } else if !document.is_object() {
            return Err(Error::invalid_spec("Swagger document must be an object"));
        }

        let document = Arc::new(document);
        let mut resolver = SchemaResolver::new(document.clone());
        let tagged = model_pointers(&document);
        for (pointer, name) in &tagged {
            resolver.tag_model(pointer.clone(), name.clone());
        }

        let mut definitions = IndexMap::new();
        if let Some(Json::Object(entries)) = document.get("definitions") {
            for name in entries.keys() {
                let reference = format!("#/definitions/{}", escape_pointer_segment(name));
                definitions.insert(name.clone(), resolver.resolve_ref(&reference)?);
            }
        }

        let mut descriptors: IndexMap<String, ModelDescriptor> = IndexMap::new();
        for (pointer, tag) in &tagged {
            let schema = resolver.resolve_ref(&format!("#{pointer}"))?;
            let name = schema.model_name.clone().unwrap_or_else(|| tag.clone());
            if descriptors.contains_key(&name) {
                tracing::warn!(model = %name, pointer = %pointer, "duplicate model name, keeping the first");
                continue;
            }
            let descriptor = ModelDescriptor::build(&resolver, &name, &schema)?;
            descriptors.insert(name, descriptor);
        }
        link_subtypes(&mut descriptors);
        let models = descriptors
            .into_iter()
            .map(|(name, descriptor)| (name, Arc::new(descriptor)))
            .collect();

        let mut security_definitions = IndexMap::new();
        if let Some(Json::Object(entries)) = document.get("securityDefinitions") {
            for (name, definition) in entries {
                security_definitions.insert(name.clone(), SecurityDefinition::from_json(name, definition)?);
            }
        }

        let operations = build_operations(&resolver, &document)?;
        let resources = group_resources(&operations);

        let formats = formats.unwrap_or_else(FormatRegistry::shared);
        let format_generation = AtomicU64::new(formats.generation());
        let spec = Spec {
            validator: SwaggerValidator::new(&document),
            document,
            origin_url,
            config,
            formats,
            resolver,
            definitions,
            models,
            operations,
            resources,
            security_definitions,
            unmarshalers: StrategyCache::new(),
            marshalers: StrategyCache::new(),
            format_generation,
        };
        tracing::debug!(
            models = spec.models.len(),
            operations = spec.operations.len(),
            "spec built"
        );
        Ok(spec)
    }
}

impl Spec {
    pub fn builder(document: Json) -> SpecBuilder {
        SpecBuilder {
            document,
            origin_url: None,
            config: SpecConfig::default(),
            formats: None,
        }
    }

    /// Load a YAML or JSON document from disk, bundling external references
    pub fn from_path(path: impl AsRef<Path>, config: SpecConfig) -> Result<Spec> {
        let path = path.as_ref();
        let document = DocumentLoader::new().load(path)?;
        Spec::builder(document)
            .origin_url(path.display().to_string())
            .config(config)
            .build()
    }

    pub fn document(&self) -> &Json {
        &self.document
    }

    pub fn origin_url(&self) -> Option<&str> {
        self.origin_url.as_deref()
    }

    pub fn config(&self) -> &SpecConfig {
        &self.config
    }

    pub fn formats(&self) -> &Arc<FormatRegistry> {
        &self.formats
    }

    pub fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    /// Follow references until an inline node is reached
    pub fn deref(&self, schema: &Schema) -> Result<Schema> {
        self.resolver.deref(schema)
    }

    pub fn resolve_ref(&self, reference: &str) -> Result<Schema> {
        self.resolver.resolve_ref(reference)
    }

    /// Raw `attribute` of the dereferenced node
    pub fn resolve(&self, schema: &Schema, attribute: &str) -> Result<Option<Json>> {
        self.resolver.resolve(schema, attribute)
    }

    pub fn is_nullable(&self, schema: &Schema) -> Result<bool> {
        self.resolver.is_nullable(schema)
    }

    /// Parse an ad-hoc schema fragment; `$ref`s resolve against this document
    pub fn schema(&self, fragment: &Json) -> Result<Schema> {
        SchemaNode::parse(fragment, None)
    }

    pub fn definition(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    pub fn definitions(&self) -> &IndexMap<String, Schema> {
        &self.definitions
    }

    pub fn model(&self, name: &str) -> Option<&Arc<ModelDescriptor>> {
        self.models.get(name)
    }

    pub fn models(&self) -> &IndexMap<String, Arc<ModelDescriptor>> {
        &self.models
    }

    pub fn operation(&self, operation_id: &str) -> Option<&Arc<Operation>> {
        self.operations.get(operation_id)
    }

    pub fn operations(&self) -> &IndexMap<String, Arc<Operation>> {
        &self.operations
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn resources(&self) -> &IndexMap<String, Resource> {
        &self.resources
    }

    pub fn security_definition(&self, name: &str) -> Option<&SecurityDefinition> {
        self.security_definitions.get(name)
    }

    pub fn security_definitions(&self) -> &IndexMap<String, SecurityDefinition> {
        &self.security_definitions
    }

    /// Value validator with the registry's current string formats
    pub fn validator(&self) -> &SwaggerValidator {
        self.validator
            .sync_formats(self.formats.generation(), || self.formats.string_format_checks());
        &self.validator
    }

    /// Drop cached strategies when the format registry changed
    pub(crate) fn sync_formats(&self) {
        let current = self.formats.generation();
        if self.format_generation.swap(current, Ordering::SeqCst) != current {
            tracing::debug!(generation = current, "format registry changed, dropping strategies");
            self.unmarshalers.clear();
            self.marshalers.clear();
        }
    }

    /// Memoized unmarshaling strategy for `(schema, nullable)`
    pub fn unmarshal_strategy(&self, schema: &Schema, nullable: bool) -> Result<UnmarshalStrategy> {
        self.unmarshalers.get_or_build(
            schema,
            nullable,
            || unmarshal::build_strategy(self, schema, nullable),
            || unmarshal::deferred_strategy(schema.clone(), nullable),
        )
    }

    /// Memoized marshaling strategy for `(schema, nullable)`
    pub fn marshal_strategy(&self, schema: &Schema, nullable: bool) -> Result<MarshalStrategy> {
        self.marshalers.get_or_build(
            schema,
            nullable,
            || marshal::build_strategy(self, schema, nullable),
            || marshal::deferred_strategy(schema.clone(), nullable),
        )
    }

    /// Number of cached (unmarshal, marshal) strategies
    pub fn cached_strategies(&self) -> (usize, usize) {
        (self.unmarshalers.len(), self.marshalers.len())
    }
}

/// Pointers of every node to tag as a model, in document order
fn model_pointers(document: &Json) -> Vec<(String, String)> {
    let mut tagged: Vec<(String, String)> = Vec::new();
    let mut push = |pointer: String, name: String| {
        if !tagged.iter().any(|(p, _)| *p == pointer) {
            tagged.push((pointer, name));
        }
    };

    if let Some(Json::Object(definitions)) = document.get("definitions") {
        for (name, definition) in definitions {
            if definition.get("$ref").is_none() && is_model_shaped(definition) {
                push(format!("/definitions/{}", escape_pointer_segment(name)), name.clone());
            }
        }
        // a definition that only points elsewhere names its target, unless
        // the target is already a model under its own name
        for (name, definition) in definitions {
            if let Some(target) = definition
                .get("$ref")
                .and_then(Json::as_str)
                .and_then(|r| r.strip_prefix('#'))
            {
                if document.pointer(target).is_some_and(is_model_shaped) {
                    push(target.to_string(), name.clone());
                }
            }
        }
    }

    if let Some(Json::Object(bundled)) = document.get(BUNDLE_KEY) {
        for (key, file) in bundled {
            let file_pointer = format!("/{BUNDLE_KEY}/{}", escape_pointer_segment(key));
            let Some(entries) = file.as_object() else {
                continue;
            };
            for (name, entry) in entries {
                if name == "definitions" {
                    for (def_name, definition) in entry.as_object().into_iter().flatten() {
                        if is_model_shaped(definition) {
                            push(
                                format!("{file_pointer}/definitions/{}", escape_pointer_segment(def_name)),
                                def_name.clone(),
                            );
                        }
                    }
                } else if is_model_shaped(entry) {
                    push(format!("{file_pointer}/{}", escape_pointer_segment(name)), name.clone());
                }
            }
        }
    }

    let mut explicit = Vec::new();
    collect_x_models(document, String::new(), &mut explicit);
    for (pointer, name) in explicit {
        push(pointer, name);
    }
    tagged
}

fn collect_x_models(node: &Json, pointer: String, found: &mut Vec<(String, String)>) {
    match node {
        Json::Object(map) => {
            if let Some(name) = map.get("x-model").and_then(Json::as_str) {
                found.push((pointer.clone(), name.to_string()));
            }
            for (key, child) in map {
                // `enum` and `default` hold values, not schemas
                if key == "enum" || key == "default" || key == "example" {
                    continue;
                }
                collect_x_models(child, format!("{pointer}/{}", escape_pointer_segment(key)), found);
            }
        }
        Json::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_x_models(child, format!("{pointer}/{index}"), found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Json {
        json!({
            "swagger": "2.0",
            "info": {"title": "Petstore", "version": "1.0"},
            "paths": {
                "/pets": {
                    "get": {
                        "operationId": "listPets",
                        "responses": {
                            "200": {
                                "description": "ok",
                                "schema": {
                                    "type": "object",
                                    "x-model": "PetPage",
                                    "properties": {
                                        "items": {"type": "array", "items": {"$ref": "#/definitions/Pet"}}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "discriminator": "petType",
                    "required": ["name", "petType"],
                    "properties": {"name": {"type": "string"}, "petType": {"type": "string"}}
                },
                "Dog": {"allOf": [{"$ref": "#/definitions/Pet"}, {"properties": {"bark": {"type": "boolean"}}}]},
                "Name": {"type": "string"},
                "Alias": {"$ref": "#/definitions/Pet"}
            }
        })
    }

    #[test]
    fn test_build_tags_models() {
        let spec = Spec::builder(document()).build().unwrap();

        let names: Vec<&String> = spec.models().keys().collect();
        assert_eq!(names, ["Pet", "Dog", "PetPage"]);
        assert_eq!(spec.model("Pet").unwrap().subtypes, ["Dog"]);
        assert_eq!(spec.model("Dog").unwrap().inherits_from, ["Pet"]);
        assert!(spec.model("Name").is_none());
        assert_eq!(spec.definitions().len(), 4);
        assert!(spec.operation("listPets").is_some());
    }

    #[test]
    fn test_alias_before_target_keeps_target_name() {
        let spec = Spec::builder(json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "definitions": {
                "Animal": {"$ref": "#/definitions/Pet"},
                "Pet": {
                    "type": "object",
                    "discriminator": "type",
                    "properties": {"type": {"type": "string"}, "name": {"type": "string"}}
                }
            }
        }))
        .build()
        .unwrap();

        let names: Vec<&String> = spec.models().keys().collect();
        assert_eq!(names, ["Pet"]);

        let pet = crate::unmarshal::unmarshal_model(&spec, "Pet", &json!({"type": "Pet", "name": "rex"})).unwrap();
        assert_eq!(pet.as_model().map(|m| m.name()), Some("Pet"));

        let animal = spec.definition("Animal").unwrap();
        let via_alias = crate::unmarshal::unmarshal_schema_object(&spec, animal, &json!({"type": "Pet"})).unwrap();
        assert_eq!(via_alias.as_model().map(|m| m.name()), Some("Pet"));
    }

    #[test]
    fn test_definition_nodes_are_shared() {
        let spec = Spec::builder(document()).build().unwrap();
        let pet = spec.definition("Pet").unwrap();
        let via_alias = spec.deref(spec.definition("Alias").unwrap()).unwrap();
        assert!(Arc::ptr_eq(pet, &via_alias));
        assert!(Arc::ptr_eq(&spec.model("Pet").unwrap().schema, pet));
    }

    #[test]
    fn test_document_validation_is_configurable() {
        let broken = json!({"swagger": "2.0", "paths": {}});
        assert!(matches!(Spec::builder(broken.clone()).build(), Err(Error::Validation(_))));

        let config = SpecConfig {
            validate_swagger_spec: false,
            ..SpecConfig::default()
        };
        assert!(Spec::builder(broken).config(config.clone()).build().is_ok());
        assert!(matches!(
            Spec::builder(json!([])).config(config).build(),
            Err(Error::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_validator_picks_up_registered_formats() {
        let formats = Arc::new(FormatRegistry::with_builtins());
        let spec = Spec::builder(document()).formats(formats.clone()).build().unwrap();
        let schema = json!({"type": "string", "format": "even"});

        assert!(spec.validator().validate_schema_object(&schema, &json!("odd")).is_ok());
        let _guard = crate::formats::ScopedFormat::register(
            formats,
            crate::formats::SwaggerFormat::new(
                "even",
                |v| Ok(v.to_json()),
                |j| Ok(j.into()),
                "even length",
            )
            .with_validator(|s| s.len() % 2 == 0),
        );
        assert!(spec.validator().validate_schema_object(&schema, &json!("odd")).is_err());
    }

    #[test]
    fn test_model_pointers_cover_bundled_files() {
        let document = json!({
            "definitions": {"Pet": {"$ref": "#/x-bundled/models_pet.yaml/Pet"}},
            "x-bundled": {
                "models_pet.yaml": {
                    "Pet": {"type": "object"},
                    "Tag": {"type": "object"},
                    "definitions": {"Owner": {"type": "object"}}
                }
            }
        });
        let pointers = model_pointers(&document);
        assert_eq!(
            pointers,
            [
                ("/x-bundled/models_pet.yaml/Pet".to_string(), "Pet".to_string()),
                ("/x-bundled/models_pet.yaml/Tag".to_string(), "Tag".to_string()),
                ("/x-bundled/models_pet.yaml/definitions/Owner".to_string(), "Owner".to_string()),
            ]
        );
    }
}
