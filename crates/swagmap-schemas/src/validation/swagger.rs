//! Swagger-dialect validation on top of a draft 4 JSON Schema validator
//!
//! Swagger 2.0 schemas are almost draft 4 JSON Schema. The differences are
//! bridged by rewriting each schema before it is compiled:
//!
//! - `x-nullable: true` widens `type` (and `enum`) to admit `null`
//! - a non-array `required` (the boolean of a parameter) is dropped
//! - `type: file` is dropped, any instance is accepted
//! - `enum` on an array schema constrains each element, not the array
//! - `x-scope` annotations are dropped
//!
//! `$ref` pointers are resolved against the whole document: the translated
//! `definitions`, `responses` and `x-bundled` sections of the root are
//! embedded next to the schema being compiled, so fragments taken from
//! anywhere in the document validate with the same pointers.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::{ValidationError, ValidationErrors, ValidationResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A string-format predicate handed to the JSON Schema validator
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Keys of a parameter object that are not schema keywords
const PARAMETER_ONLY_KEYS: &[&str] = &[
    "name",
    "in",
    "description",
    "required",
    "collectionFormat",
    "allowEmptyValue",
    "x-example",
];

/// Root sections embedded into every compiled schema
const ROOT_SECTIONS: &[&str] = &["definitions", "responses", "x-bundled"];

struct FormatSet {
    generation: u64,
    checks: Vec<(String, FormatCheck)>,
}

/// Validates wire values against Swagger schema fragments of one document
pub struct SwaggerValidator {
    root_sections: Map<String, Value>,
    formats: RwLock<FormatSet>,
    compiled: RwLock<HashMap<String, Arc<jsonschema::Validator>>>,
}

impl std::fmt::Debug for SwaggerValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwaggerValidator")
            .field("root_sections", &self.root_sections.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SwaggerValidator {
    /// Prepare a validator for fragments of `document`
    pub fn new(document: &Value) -> Self {
        let mut root_sections = Map::new();
        for section in ROOT_SECTIONS {
            let Some(Value::Object(entries)) = document.get(*section) else {
                continue;
            };
            let translated = match *section {
                "definitions" => translate_schema_map(entries),
                "responses" => entries
                    .iter()
                    .map(|(name, response)| (name.clone(), translate_response(response)))
                    .collect(),
                _ => entries
                    .iter()
                    .map(|(key, bundled)| (key.clone(), translate_bundled(bundled)))
                    .collect(),
            };
            root_sections.insert((*section).to_string(), Value::Object(translated));
        }

        Self {
            root_sections,
            formats: RwLock::new(FormatSet {
                generation: 0,
                checks: Vec::new(),
            }),
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Install string-format checks, replacing any previous set
    pub fn with_formats(self, checks: Vec<(String, FormatCheck)>) -> Self {
        if let Ok(mut formats) = self.formats.write() {
            formats.checks = checks;
        }
        if let Ok(mut compiled) = self.compiled.write() {
            compiled.clear();
        }
        self
    }

    /// Replace the format checks when `generation` differs from the installed one
    ///
    /// Compiled validators embed their format checks, so a change drops them.
    pub fn sync_formats<F>(&self, generation: u64, checks: F)
    where
        F: FnOnce() -> Vec<(String, FormatCheck)>,
    {
        if let Ok(current) = self.formats.read() {
            if current.generation == generation {
                return;
            }
        }
        if let Ok(mut current) = self.formats.write() {
            if current.generation != generation {
                current.generation = generation;
                current.checks = checks();
                if let Ok(mut compiled) = self.compiled.write() {
                    compiled.clear();
                }
            }
        }
    }

    /// Validate `instance` against a schema fragment, stopping at the first failure
    pub fn validate_schema_object(&self, schema: &Value, instance: &Value) -> ValidationResult<()> {
        self.collect_schema_errors(schema, instance)?.into_first()
    }

    /// Validate `instance` against a schema fragment, collecting every failure
    ///
    /// The outer error reports a schema that could not be compiled.
    pub fn collect_schema_errors(
        &self,
        schema: &Value,
        instance: &Value,
    ) -> ValidationResult<ValidationErrors> {
        let validator = self.compiled_for(schema)?;
        let errors = validator
            .iter_errors(instance)
            .map(|error| {
                let path = error.instance_path.to_string();
                ValidationError::new(if path.is_empty() { "/".to_string() } else { path }, error.to_string())
                    .at_schema_path(error.schema_path.to_string())
                    .with_instance(error.instance.clone().into_owned())
            })
            .collect::<Vec<_>>();
        Ok(ValidationErrors::from(errors))
    }

    /// Validate a parameter value against its parameter object
    ///
    /// `instance` is `None` when the parameter was not supplied. A missing
    /// required parameter yields a single "is a required parameter" error; a
    /// missing optional parameter is not validated at all.
    pub fn validate_param(&self, param: &Value, instance: Option<&Value>) -> ValidationResult<()> {
        let name = param.get("name").and_then(Value::as_str).unwrap_or("<unnamed>");
        let required = param.get("required").and_then(Value::as_bool).unwrap_or(false);

        let instance = match instance {
            Some(value) if !value.is_null() => value,
            _ if required => {
                return Err(ValidationError::with_violations(
                    name,
                    format!("{name} is a required parameter"),
                    vec![ValidationError::create_violation("required", "a value", "nothing")],
                ))
            }
            _ => return Ok(()),
        };

        let location = param.get("in").and_then(Value::as_str).unwrap_or_default();
        let result = if location == "body" {
            match param.get("schema") {
                Some(schema) => self.validate_schema_object(schema, instance),
                None => Ok(()),
            }
        } else {
            self.validate_schema_object(&param_schema(param), instance)
        };

        result.map_err(|mut error| {
            error.message = format!("{name}: {}", error.message);
            error
        })
    }

    /// Number of compiled schemas held
    pub fn compiled_count(&self) -> usize {
        self.compiled.read().map(|c| c.len()).unwrap_or(0)
    }

    fn compiled_for(&self, schema: &Value) -> ValidationResult<Arc<jsonschema::Validator>> {
        let key = schema.to_string();
        if let Ok(compiled) = self.compiled.read() {
            if let Some(validator) = compiled.get(&key) {
                return Ok(Arc::clone(validator));
            }
        }

        let wrapper = self.wrap(schema);
        let mut options = jsonschema::draft4::options().should_validate_formats(true);
        if let Ok(formats) = self.formats.read() {
            for (name, check) in &formats.checks {
                let check = Arc::clone(check);
                options = options.with_format(name.clone(), move |s: &str| check(s));
            }
        }

        let validator = options.build(&wrapper).map_err(|e| {
            ValidationError::new("$", format!("Invalid schema: {e}")).with_instance(schema.clone())
        })?;
        let validator = Arc::new(validator);

        if let Ok(mut compiled) = self.compiled.write() {
            compiled
                .entry(key)
                .or_insert_with(|| Arc::clone(&validator));
        }
        Ok(validator)
    }

    fn wrap(&self, schema: &Value) -> Value {
        let translated = translate_schema(schema);
        let mut wrapper = match translated {
            Value::Object(obj) if !obj.contains_key("$ref") => obj,
            // the embedded sections must not be siblings of a `$ref`
            other => {
                let mut obj = Map::new();
                obj.insert("allOf".to_string(), Value::Array(vec![other]));
                obj
            }
        };
        for (section, entries) in &self.root_sections {
            wrapper
                .entry(section.clone())
                .or_insert_with(|| entries.clone());
        }
        Value::Object(wrapper)
    }
}

/// Schema view of a non-body parameter
fn param_schema(param: &Value) -> Value {
    match param {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(key, _)| !PARAMETER_ONLY_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Rewrite one Swagger schema into draft 4
pub fn translate_schema(schema: &Value) -> Value {
    let Value::Object(obj) = schema else {
        return schema.clone();
    };

    let nullable = obj.get("x-nullable").and_then(Value::as_bool).unwrap_or(false);
    let mut out = Map::new();

    for (key, value) in obj {
        match key.as_str() {
            "x-scope" | "x-nullable" => {}
            "required" if !value.is_array() => {}
            "type" if value.as_str() == Some("file") => {}
            "properties" | "patternProperties" | "definitions" => match value {
                Value::Object(entries) => {
                    out.insert(key.clone(), Value::Object(translate_schema_map(entries)));
                }
                other => {
                    out.insert(key.clone(), other.clone());
                }
            },
            "items" => {
                let items = match value {
                    Value::Array(list) => Value::Array(list.iter().map(translate_schema).collect()),
                    other => translate_schema(other),
                };
                out.insert(key.clone(), items);
            }
            "additionalProperties" | "not" => {
                out.insert(key.clone(), translate_schema(value));
            }
            "allOf" | "anyOf" | "oneOf" => {
                let members = match value {
                    Value::Array(list) => Value::Array(list.iter().map(translate_schema).collect()),
                    other => other.clone(),
                };
                out.insert(key.clone(), members);
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    if out.get("type").and_then(Value::as_str) == Some("array") {
        if let Some(choices) = out.remove("enum") {
            let mut items = match out.remove("items") {
                Some(Value::Object(items)) => items,
                _ => Map::new(),
            };
            items.insert("enum".to_string(), choices);
            out.insert("items".to_string(), Value::Object(items));
        }
    }

    if nullable {
        return widen_to_null(out);
    }
    Value::Object(out)
}

fn widen_to_null(mut out: Map<String, Value>) -> Value {
    if out.contains_key("$ref") {
        // siblings of `$ref` are ignored by draft 4
        let mut wrapper = Map::new();
        wrapper.insert(
            "anyOf".to_string(),
            Value::Array(vec![
                serde_json::json!({"type": "null"}),
                Value::Object(out),
            ]),
        );
        return Value::Object(wrapper);
    }

    match out.get_mut("type") {
        Some(Value::String(single)) => {
            let single = std::mem::take(single);
            out.insert(
                "type".to_string(),
                Value::Array(vec![Value::String(single), Value::String("null".to_string())]),
            );
        }
        Some(Value::Array(types)) => {
            if !types.iter().any(|t| t == "null") {
                types.push(Value::String("null".to_string()));
            }
        }
        _ => {}
    }

    if let Some(Value::Array(choices)) = out.get_mut("enum") {
        if !choices.contains(&Value::Null) {
            choices.push(Value::Null);
        }
    }

    if out.contains_key("allOf") {
        let members = out.remove("allOf");
        let mut wrapper = Map::new();
        let mut composed = Map::new();
        if let Some(members) = members {
            composed.insert("allOf".to_string(), members);
        }
        wrapper.insert(
            "anyOf".to_string(),
            Value::Array(vec![serde_json::json!({"type": "null"}), Value::Object(composed)]),
        );
        for (key, value) in out {
            wrapper.insert(key, value);
        }
        return Value::Object(wrapper);
    }

    Value::Object(out)
}

fn translate_schema_map(entries: &Map<String, Value>) -> Map<String, Value> {
    entries
        .iter()
        .map(|(name, schema)| (name.clone(), translate_schema(schema)))
        .collect()
}

fn translate_response(response: &Value) -> Value {
    let Value::Object(obj) = response else {
        return response.clone();
    };
    let mut out = obj.clone();
    if let Some(schema) = obj.get("schema") {
        out.insert("schema".to_string(), translate_schema(schema));
    }
    Value::Object(out)
}

/// External documents may be plain schema maps or partial Swagger documents
fn translate_bundled(document: &Value) -> Value {
    let Value::Object(obj) = document else {
        return document.clone();
    };
    let translated = obj
        .iter()
        .map(|(key, value)| {
            let value = match (key.as_str(), value) {
                ("definitions", Value::Object(entries)) => Value::Object(translate_schema_map(entries)),
                ("responses", Value::Object(entries)) => Value::Object(
                    entries
                        .iter()
                        .map(|(name, response)| (name.clone(), translate_response(response)))
                        .collect(),
                ),
                ("x-scope", other) | ("parameters", other) | ("paths", other) => other.clone(),
                (_, other) => translate_schema(other),
            };
            (key.clone(), value)
        })
        .collect();
    Value::Object(translated)
}
