//! Schema nodes and `$ref` resolution
//!
//! A [`SchemaNode`] is the parsed form of one Swagger schema fragment.
//! Nodes are shared behind [`Schema`] (`Arc<SchemaNode>`), and the address of
//! the allocation is the node's identity: strategy caches key on it.
//!
//! References are never expanded during parsing. [`SchemaResolver`] resolves
//! them lazily and interns the target node per pointer, so every `$ref` to the
//! same pointer yields the same `Arc` and recursive schemas stay finite.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared handle to a parsed schema node
pub type Schema = Arc<SchemaNode>;

/// Upper bound on chained `$ref` hops before giving up
const MAX_REFERENCE_HOPS: usize = 64;

/// `additionalProperties` policy of an object schema
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    /// Absent or `true`
    #[default]
    Allowed,
    /// `false`
    Denied,
    Schema(Schema),
}

/// One parsed schema fragment
#[derive(Debug, Default)]
pub struct SchemaNode {
    /// Set when the fragment is a `{"$ref": ...}`
    pub reference: Option<String>,
    pub schema_type: Option<String>,
    pub format: Option<String>,
    pub items: Option<Schema>,
    pub properties: IndexMap<String, Schema>,
    pub required: Vec<String>,
    pub additional_properties: AdditionalProperties,
    pub all_of: Vec<Schema>,
    pub discriminator: Option<String>,
    pub default: Option<Json>,
    pub x_nullable: Option<bool>,
    pub enum_values: Option<Vec<Json>>,
    /// Model name when the node is tagged as a model
    pub model_name: Option<String>,
    /// The fragment as written, handed to the validator
    pub raw: Json,
}

impl SchemaNode {
    /// Parse a fragment
    ///
    /// `model_hint` names the model when the fragment is a definition; an
    /// explicit `x-model` always takes precedence.
    pub fn parse(json: &Json, model_hint: Option<&str>) -> Result<Schema> {
        let Some(object) = json.as_object() else {
            return Err(Error::mapping(format!(
                "Schema must be an object, found {json}"
            )));
        };

        if let Some(reference) = object.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| Error::mapping(format!("$ref must be a string, found {reference}")))?;
            return Ok(Arc::new(SchemaNode {
                reference: Some(reference.to_string()),
                x_nullable: object.get("x-nullable").and_then(Json::as_bool),
                raw: json.clone(),
                ..SchemaNode::default()
            }));
        }

        let schema_type = match object.get("type") {
            None => None,
            Some(Json::String(t)) => Some(t.clone()),
            Some(other) => {
                return Err(Error::mapping(format!("Unknown type: {other}")));
            }
        };

        let items = object
            .get("items")
            .map(|items| SchemaNode::parse(items, None))
            .transpose()?;

        let mut properties = IndexMap::new();
        if let Some(Json::Object(props)) = object.get("properties") {
            for (name, prop) in props {
                properties.insert(name.clone(), SchemaNode::parse(prop, None)?);
            }
        }

        // parameter objects carry a boolean `required`
        let required = match object.get("required") {
            Some(Json::Array(names)) => names
                .iter()
                .filter_map(Json::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let additional_properties = match object.get("additionalProperties") {
            None | Some(Json::Bool(true)) => AdditionalProperties::Allowed,
            Some(Json::Bool(false)) => AdditionalProperties::Denied,
            Some(schema) => AdditionalProperties::Schema(SchemaNode::parse(schema, None)?),
        };

        let all_of = match object.get("allOf") {
            None => Vec::new(),
            Some(Json::Array(members)) => members
                .iter()
                .map(|member| SchemaNode::parse(member, None))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::mapping(format!("allOf must be a list, found {other}")));
            }
        };

        let model_name = match object.get("x-model").and_then(Json::as_str) {
            Some(name) => Some(name.to_string()),
            None => model_hint
                .filter(|_| is_model_shaped(json))
                .map(str::to_string),
        };

        Ok(Arc::new(SchemaNode {
            reference: None,
            schema_type,
            format: object.get("format").and_then(Json::as_str).map(str::to_string),
            items,
            properties,
            required,
            additional_properties,
            all_of,
            discriminator: object
                .get("discriminator")
                .and_then(Json::as_str)
                .map(str::to_string),
            default: object.get("default").cloned(),
            x_nullable: object.get("x-nullable").and_then(Json::as_bool),
            enum_values: object.get("enum").and_then(Json::as_array).cloned(),
            model_name,
            raw: json.clone(),
        }))
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn is_model(&self) -> bool {
        self.model_name.is_some()
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }

    /// Short description used in mapping error messages
    pub fn describe(&self) -> String {
        if let Some(reference) = &self.reference {
            return reference.clone();
        }
        if let Some(name) = &self.model_name {
            return name.clone();
        }
        match &self.schema_type {
            Some(t) => t.clone(),
            None => "schema".to_string(),
        }
    }
}

/// True when a definition should be tagged as a model
pub fn is_model_shaped(json: &Json) -> bool {
    match json.get("type") {
        Some(Json::String(t)) => t == "object",
        None => json.get("allOf").is_some(),
        _ => false,
    }
}

/// Resolves `$ref` strings against one document, interning nodes by pointer
#[derive(Debug)]
pub struct SchemaResolver {
    document: Arc<Json>,
    /// Model name per JSON pointer (without the leading `#`)
    model_pointers: HashMap<String, String>,
    nodes: RwLock<HashMap<String, Schema>>,
}

impl SchemaResolver {
    pub fn new(document: Arc<Json>) -> Self {
        Self {
            document,
            model_pointers: HashMap::new(),
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Declare that the node at `pointer` is the model `name`
    pub fn tag_model(&mut self, pointer: impl Into<String>, name: impl Into<String>) {
        self.model_pointers.entry(pointer.into()).or_insert_with(|| name.into());
    }

    pub fn document(&self) -> &Json {
        &self.document
    }

    /// Model name tagged at a pointer, if any
    pub fn model_at(&self, pointer: &str) -> Option<&str> {
        self.model_pointers.get(pointer).map(String::as_str)
    }

    /// Resolve one `$ref`; the same reference always yields the same node
    pub fn resolve_ref(&self, reference: &str) -> Result<Schema> {
        if let Some(node) = self.read_nodes()?.get(reference) {
            return Ok(node.clone());
        }

        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(Error::schema_resolution(
                reference,
                "only references local to the document can be resolved",
            ));
        };
        let target = self
            .document
            .pointer(pointer)
            .ok_or_else(|| Error::schema_resolution(reference, "no such node in the document"))?;
        let node = SchemaNode::parse(target, self.model_at(pointer)).map_err(|e| {
            Error::schema_resolution(reference, format!("target is not a schema: {e}"))
        })?;

        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| Error::internal("schema node table poisoned"))?;
        Ok(nodes.entry(reference.to_string()).or_insert(node).clone())
    }

    /// Follow references until an inline node is reached
    pub fn deref(&self, schema: &Schema) -> Result<Schema> {
        let mut current = schema.clone();
        let mut hops = 0;
        while let Some(reference) = current.reference.clone() {
            hops += 1;
            if hops > MAX_REFERENCE_HOPS {
                return Err(Error::schema_resolution(reference, "reference chain does not terminate"));
            }
            current = self.resolve_ref(&reference)?;
        }
        Ok(current)
    }

    /// Raw value of `attribute` on the dereferenced node
    pub fn resolve(&self, schema: &Schema, attribute: &str) -> Result<Option<Json>> {
        Ok(self.deref(schema)?.raw.get(attribute).cloned())
    }

    /// Nullability of a node: `x-nullable` on the reference site wins, then
    /// on the target
    pub fn is_nullable(&self, schema: &Schema) -> Result<bool> {
        if let Some(flag) = schema.x_nullable {
            return Ok(flag);
        }
        Ok(self.deref(schema)?.x_nullable.unwrap_or(false))
    }

    /// Number of interned reference targets
    pub fn interned(&self) -> usize {
        self.nodes.read().map(|nodes| nodes.len()).unwrap_or(0)
    }

    fn read_nodes(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Schema>>> {
        self.nodes
            .read()
            .map_err(|_| Error::internal("schema node table poisoned"))
    }
}

/// Escape a key for use as a JSON pointer segment
pub fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
