//! Native to wire conversion
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::model::flatten;
use crate::schema::{AdditionalProperties, Schema};
use crate::spec::Spec;
use crate::strategy::MarshalStrategy;
use crate::unmarshal::select_subtype;
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use std::sync::Arc;

/// Marshal a native value through `schema`
pub fn marshal_schema_object(spec: &Spec, schema: &Schema, value: &Value) -> Result<Json> {
    spec.sync_formats();
    let strategy = spec.marshal_strategy(schema, true)?;
    strategy(spec, value)
}

/// Marshal a value of the named model
pub fn marshal_model(spec: &Spec, model_name: &str, value: &Value) -> Result<Json> {
    let model = spec
        .model(model_name)
        .ok_or_else(|| Error::mapping(format!("Unknown model {model_name}")))?;
    marshal_schema_object(spec, &model.schema, value)
}

pub(crate) fn deferred_strategy(schema: Schema, nullable: bool) -> MarshalStrategy {
    Arc::new(move |spec: &Spec, value: &Value| {
        let strategy = spec.marshal_strategy(&schema, nullable)?;
        strategy(spec, value)
    })
}

pub(crate) fn build_strategy(spec: &Spec, schema: &Schema, nullable: bool) -> Result<MarshalStrategy> {
    let node = spec.deref(schema)?;
    if !Arc::ptr_eq(&node, schema) {
        return spec.marshal_strategy(&node, nullable);
    }
    tracing::debug!(schema = %node.describe(), nullable, "building marshal strategy");

    let schema_type = node.schema_type.as_deref().or_else(|| {
        let object_like = node.is_model() || !node.all_of.is_empty() || spec.config().default_type_to_object;
        object_like.then_some("object")
    });

    let inner = match schema_type {
        None | Some("file") => identity(),
        Some("array") => array_strategy(spec, &node)?,
        Some("object") => object_strategy(spec, &node, nullable)?,
        Some("integer" | "number" | "string" | "boolean" | "null") => primitive_strategy(spec, &node),
        Some(other) => return Err(Error::mapping(format!("Unknown type: {other}"))),
    };
    Ok(with_null_handling(inner, &node, nullable))
}

fn with_null_handling(inner: MarshalStrategy, node: &Schema, nullable: bool) -> MarshalStrategy {
    let default = node.default.clone().filter(|d| !d.is_null());
    let description = node.describe();
    Arc::new(move |spec: &Spec, value: &Value| {
        if !value.is_null() {
            return inner(spec, value);
        }
        match &default {
            // defaults are written in wire form already
            Some(default) => Ok(default.clone()),
            None if nullable => Ok(Json::Null),
            None => Err(Error::mapping(format!("Spec {description} is a required value"))),
        }
    })
}

fn identity() -> MarshalStrategy {
    Arc::new(|_: &Spec, value: &Value| Ok(value.to_json()))
}

fn primitive_strategy(spec: &Spec, node: &Schema) -> MarshalStrategy {
    match node.format.as_deref().and_then(|name| spec.formats().get(name)) {
        Some(format) => Arc::new(move |_: &Spec, value: &Value| format.to_wire(value)),
        None => identity(),
    }
}

fn array_strategy(spec: &Spec, node: &Schema) -> Result<MarshalStrategy> {
    let items = match &node.items {
        Some(items) => Some(spec.marshal_strategy(items, spec.is_nullable(items)?)?),
        None => None,
    };
    let type_name = node.describe();
    Ok(Arc::new(move |spec: &Spec, value: &Value| {
        let Value::Array(elements) = value else {
            return Err(Error::mapping(format!(
                "Expected list like type for {type_name}: {}",
                value.to_json()
            )));
        };
        match &items {
            Some(items) => elements
                .iter()
                .map(|element| items(spec, element))
                .collect::<Result<Vec<_>>>()
                .map(Json::Array),
            None => Ok(Json::Array(elements.iter().map(Value::to_json).collect())),
        }
    }))
}

struct PropertyStrategy {
    strategy: MarshalStrategy,
    /// `x-nullable`: an explicit null is written out
    emits_null: bool,
}

fn object_strategy(spec: &Spec, node: &Schema, nullable: bool) -> Result<MarshalStrategy> {
    let flattened = flatten(spec.resolver(), node)?;

    let mut properties = IndexMap::new();
    for (name, property) in &flattened.properties {
        let x_nullable = spec.is_nullable(property)?;
        let property_nullable = x_nullable || !flattened.is_required(name);
        properties.insert(
            name.clone(),
            PropertyStrategy {
                strategy: spec.marshal_strategy(property, property_nullable)?,
                emits_null: x_nullable,
            },
        );
    }

    let additional = match &node.additional_properties {
        AdditionalProperties::Allowed => AdditionalPolicy::PassThrough,
        AdditionalProperties::Denied => AdditionalPolicy::Reject,
        AdditionalProperties::Schema(schema) => {
            AdditionalPolicy::Marshal(spec.marshal_strategy(schema, true)?)
        }
    };

    let model_name = node.model_name.clone();
    let discriminator = node.discriminator.clone();
    let type_name = node.describe();

    Ok(Arc::new(move |spec: &Spec, value: &Value| {
        let fields = match value {
            Value::Object(map) => map.clone(),
            Value::Model(model) => match model.to_object() {
                Value::Object(map) => map,
                _ => IndexMap::new(),
            },
            other => {
                return Err(Error::mapping(format!(
                    "Expected dict like type for {type_name}: {}",
                    other.to_json()
                )));
            }
        };

        if let Some(field) = &discriminator {
            let mut selector = Map::new();
            let tag = match (fields.get(field), value) {
                (Some(Value::String(tag)), _) => Some(tag.clone()),
                (_, Value::Model(model)) => Some(model.name().to_string()),
                _ => None,
            };
            if let Some(tag) = tag {
                selector.insert(field.clone(), Json::String(tag));
            }
            if let Some(subtype) = select_subtype(spec, model_name.as_deref(), field, &selector)? {
                let strategy = spec.marshal_strategy(&subtype, nullable)?;
                return strategy(spec, value);
            }
        }

        let mut wire = Map::new();
        for (key, field_value) in &fields {
            match properties.get(key) {
                Some(property) => {
                    if field_value.is_null() && !property.emits_null {
                        continue;
                    }
                    wire.insert(key.clone(), (property.strategy)(spec, field_value)?);
                }
                None => {
                    let converted = match &additional {
                        AdditionalPolicy::PassThrough => field_value.to_json(),
                        AdditionalPolicy::Marshal(strategy) => strategy(spec, field_value)?,
                        AdditionalPolicy::Reject => {
                            return Err(Error::mapping(format!(
                                "Additional property {key} is not allowed by {type_name}"
                            )));
                        }
                    };
                    wire.insert(key.clone(), converted);
                }
            }
        }
        Ok(Json::Object(wire))
    }))
}

enum AdditionalPolicy {
    PassThrough,
    Reject,
    Marshal(MarshalStrategy),
}
