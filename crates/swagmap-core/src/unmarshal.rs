//! Wire to native conversion
//!
//! Strategies are built once per `(node, nullable)` and cached on the
//! [`Spec`]. Every strategy is wrapped in null handling: a wire `null`
//! becomes the schema default, else `null` when nullable, else a mapping
//! error.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::model::flatten;
use crate::schema::{AdditionalProperties, Schema};
use crate::spec::Spec;
use crate::strategy::UnmarshalStrategy;
use crate::value::{Model, Value};
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::sync::Arc;

/// Unmarshal a wire value through `schema`
///
/// The top level is nullable: a `null` input yields the default or `null`.
pub fn unmarshal_schema_object(spec: &Spec, schema: &Schema, value: &Json) -> Result<Value> {
    spec.sync_formats();
    let strategy = spec.unmarshal_strategy(schema, true)?;
    strategy(spec, value)
}

/// Unmarshal a value of the named model
pub fn unmarshal_model(spec: &Spec, model_name: &str, value: &Json) -> Result<Value> {
    let model = spec
        .model(model_name)
        .ok_or_else(|| Error::mapping(format!("Unknown model {model_name}")))?;
    unmarshal_schema_object(spec, &model.schema, value)
}

/// Stand-in for a strategy still under construction
pub(crate) fn deferred_strategy(schema: Schema, nullable: bool) -> UnmarshalStrategy {
    Arc::new(move |spec: &Spec, value: &Json| {
        let strategy = spec.unmarshal_strategy(&schema, nullable)?;
        strategy(spec, value)
    })
}

pub(crate) fn build_strategy(spec: &Spec, schema: &Schema, nullable: bool) -> Result<UnmarshalStrategy> {
    let node = spec.deref(schema)?;
    if !Arc::ptr_eq(&node, schema) {
        // references share the target's strategy
        return spec.unmarshal_strategy(&node, nullable);
    }
    tracing::debug!(schema = %node.describe(), nullable, "building unmarshal strategy");

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

fn with_null_handling(inner: UnmarshalStrategy, node: &Schema, nullable: bool) -> UnmarshalStrategy {
    let default = node.default.clone().filter(|d| !d.is_null());
    let description = node.describe();
    Arc::new(move |spec: &Spec, value: &Json| {
        if !value.is_null() {
            return inner(spec, value);
        }
        match &default {
            Some(default) => inner(spec, default),
            None if nullable => Ok(Value::Null),
            None => Err(Error::mapping(format!("Spec {description} is a required value"))),
        }
    })
}

fn identity() -> UnmarshalStrategy {
    Arc::new(|_: &Spec, value: &Json| Value::from_wire(value))
}

fn primitive_strategy(spec: &Spec, node: &Schema) -> UnmarshalStrategy {
    match node.format.as_deref().and_then(|name| spec.formats().get(name)) {
        Some(format) => Arc::new(move |_: &Spec, value: &Json| format.to_native(value)),
        None => identity(),
    }
}

fn array_strategy(spec: &Spec, node: &Schema) -> Result<UnmarshalStrategy> {
    let items = match &node.items {
        Some(items) => Some(spec.unmarshal_strategy(items, spec.is_nullable(items)?)?),
        None => None,
    };
    let type_name = node.describe();
    Ok(Arc::new(move |spec: &Spec, value: &Json| {
        let Json::Array(elements) = value else {
            return Err(Error::mapping(format!(
                "Expected list like type for {type_name}: {value}"
            )));
        };
        match &items {
            Some(items) => elements
                .iter()
                .map(|element| items(spec, element))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            None => Ok(Value::Array(elements.iter().map(Value::from).collect())),
        }
    }))
}

struct PropertyStrategy {
    strategy: UnmarshalStrategy,
    default: Option<Json>,
}

fn object_strategy(spec: &Spec, node: &Schema, nullable: bool) -> Result<UnmarshalStrategy> {
    let flattened = flatten(spec.resolver(), node)?;

    let mut properties = IndexMap::new();
    for (name, property) in &flattened.properties {
        let property_nullable = spec.is_nullable(property)? || !flattened.is_required(name);
        properties.insert(
            name.clone(),
            PropertyStrategy {
                strategy: spec.unmarshal_strategy(property, property_nullable)?,
                default: spec.resolve(property, "default")?,
            },
        );
    }

    // additionalProperties: false is not enforced here
    let additional = match &node.additional_properties {
        AdditionalProperties::Schema(schema) => Some(spec.unmarshal_strategy(schema, true)?),
        AdditionalProperties::Allowed | AdditionalProperties::Denied => None,
    };

    let model_name = node.model_name.clone();
    let discriminator = node.discriminator.clone();
    let type_name = node.describe();

    Ok(Arc::new(move |spec: &Spec, value: &Json| {
        let Json::Object(input) = value else {
            return Err(Error::mapping(format!(
                "Expected dict like type for {type_name}: {value}"
            )));
        };

        if let Some(field) = &discriminator {
            if let Some(subtype) = select_subtype(spec, model_name.as_deref(), field, input)? {
                let strategy = spec.unmarshal_strategy(&subtype, nullable)?;
                return strategy(spec, value);
            }
        }

        let mut declared = IndexMap::new();
        let mut extra = IndexMap::new();
        for (key, raw) in input {
            match properties.get(key) {
                Some(property) => {
                    declared.insert(key.clone(), (property.strategy)(spec, raw)?);
                }
                None => {
                    let converted = match &additional {
                        Some(strategy) => strategy(spec, raw)?,
                        None => Value::from_wire(raw)?,
                    };
                    extra.insert(key.clone(), converted);
                }
            }
        }

        if spec.config().include_missing_properties {
            for (name, property) in &properties {
                if declared.contains_key(name) {
                    continue;
                }
                let filled = match &property.default {
                    Some(default) => (property.strategy)(spec, default)?,
                    None => Value::Null,
                };
                declared.insert(name.clone(), filled);
            }
        }

        match &model_name {
            Some(name) if spec.config().use_models => {
                let mut model = Model::new(name.clone());
                for (key, value) in declared {
                    model.set(key, value);
                }
                for (key, value) in extra {
                    model.set_additional(key, value);
                }
                Ok(Value::Model(model))
            }
            _ => {
                declared.extend(extra);
                Ok(Value::Object(declared))
            }
        }
    }))
}

/// Schema of the model named by the discriminator field, when it is not the
/// current model
pub(crate) fn select_subtype(
    spec: &Spec,
    current: Option<&str>,
    field: &str,
    input: &serde_json::Map<String, Json>,
) -> Result<Option<Schema>> {
    let Some(value) = input.get(field).and_then(Json::as_str) else {
        return Ok(None);
    };
    if current == Some(value) {
        return Ok(None);
    }
    let Some(target) = spec.model(value) else {
        return Err(Error::mapping(format!(
            "Unknown model {value} for discriminator {field}"
        )));
    };
    if let Some(current) = current.and_then(|name| spec.model(name)) {
        if current.subtype_for(value).is_none() {
            return Err(Error::mapping(format!(
                "Model {value} is not a subtype of {}",
                current.name
            )));
        }
    }
    Ok(Some(target.schema.clone()))
}
