//! Model descriptors
//!
//! A model is a schema node tagged with a name (a definition that is an
//! object or an `allOf` composition, or any node carrying `x-model`). Its
//! descriptor holds the shape flattened across the whole `allOf` hierarchy.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::schema::{AdditionalProperties, Schema, SchemaResolver};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::sync::Arc;

/// Properties and required names merged across an `allOf` hierarchy
#[derive(Debug, Clone, Default)]
pub struct FlattenedSchema {
    pub properties: IndexMap<String, Schema>,
    pub required: IndexSet<String>,
    /// Model names reached through `$ref` members of `allOf`, nearest first
    pub inherits_from: Vec<String>,
}

impl FlattenedSchema {
    pub fn is_required(&self, property: &str) -> bool {
        self.required.contains(property)
    }
}

/// Flatten a node's `allOf` chain depth-first
///
/// The node's own properties come first, then each member in order. The
/// first declaration of a property name wins.
pub fn flatten(resolver: &SchemaResolver, schema: &Schema) -> Result<FlattenedSchema> {
    let mut flattened = FlattenedSchema::default();
    let mut visited = HashSet::new();
    let node = resolver.deref(schema)?;
    collect(resolver, &node, &mut flattened, &mut visited)?;
    Ok(flattened)
}

fn collect(
    resolver: &SchemaResolver,
    node: &Schema,
    flattened: &mut FlattenedSchema,
    visited: &mut HashSet<usize>,
) -> Result<()> {
    if !visited.insert(Arc::as_ptr(node) as usize) {
        return Ok(());
    }

    for (name, property) in &node.properties {
        if !flattened.properties.contains_key(name) {
            flattened.properties.insert(name.clone(), property.clone());
        }
    }
    flattened.required.extend(node.required.iter().cloned());

    for member in &node.all_of {
        let target = resolver.deref(member)?;
        if member.is_reference() {
            if let Some(name) = &target.model_name {
                if !flattened.inherits_from.contains(name) {
                    flattened.inherits_from.push(name.clone());
                }
            }
        }
        if target.schema_type.as_deref().is_some_and(|t| t != "object") {
            return Err(Error::mapping(format!(
                "allOf member {} is not an object schema",
                member.describe()
            )));
        }
        collect(resolver, &target, flattened, visited)?;
    }
    Ok(())
}

/// The shape of one named model
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub name: String,
    /// The tagged node
    pub schema: Schema,
    pub properties: IndexMap<String, Schema>,
    pub required: IndexSet<String>,
    pub additional_properties: AdditionalProperties,
    pub discriminator: Option<String>,
    pub inherits_from: Vec<String>,
    /// Models whose ancestry includes this one
    pub subtypes: Vec<String>,
}

impl ModelDescriptor {
    /// Build the descriptor for the model `name` tagged on `schema`
    pub fn build(resolver: &SchemaResolver, name: &str, schema: &Schema) -> Result<Self> {
        let node = resolver.deref(schema)?;
        let flattened = flatten(resolver, &node)?;
        tracing::debug!(
            model = name,
            properties = flattened.properties.len(),
            parents = ?flattened.inherits_from,
            "built model descriptor"
        );
        Ok(Self {
            name: name.to_string(),
            additional_properties: node.additional_properties.clone(),
            discriminator: node.discriminator.clone(),
            schema: node,
            properties: flattened.properties,
            required: flattened.required,
            inherits_from: flattened.inherits_from,
            subtypes: Vec::new(),
        })
    }

    pub fn inherits(&self, ancestor: &str) -> bool {
        self.inherits_from.iter().any(|name| name == ancestor)
    }

    /// Model selected by a discriminator value, if it is this model or one
    /// of its subtypes
    pub fn subtype_for<'a>(&'a self, value: &'a str) -> Option<&'a str> {
        if value == self.name || self.subtypes.iter().any(|name| name == value) {
            Some(value)
        } else {
            None
        }
    }
}

/// Fill in `subtypes` by scanning every model's ancestry
pub fn link_subtypes(models: &mut IndexMap<String, ModelDescriptor>) {
    let ancestry: Vec<(String, Vec<String>)> = models
        .values()
        .map(|model| (model.name.clone(), model.inherits_from.clone()))
        .collect();
    for (name, parents) in ancestry {
        for parent in parents {
            if let Some(model) = models.get_mut(&parent) {
                if !model.subtypes.contains(&name) {
                    model.subtypes.push(name.clone());
                }
            }
        }
    }
}
