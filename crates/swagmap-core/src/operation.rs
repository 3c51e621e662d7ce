//! Operations and resources
//!
//! Every method under `paths` becomes an [`Operation`]. Operations are
//! grouped into [`Resource`]s by their first tag, or by the first path
//! segment when untagged.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::param::Param;
use crate::schema::{Schema, SchemaNode, SchemaResolver};
use crate::spec::Spec;
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::sync::Arc;

pub const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

/// A header declared on a response
#[derive(Debug, Clone)]
pub struct HeaderSpec {
    pub name: String,
    pub schema: Schema,
    pub raw: Json,
}

/// One entry of an operation's `responses`
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    /// Status code or `default`
    pub status: String,
    pub description: Option<String>,
    pub schema: Option<Schema>,
    pub headers: IndexMap<String, HeaderSpec>,
}

impl ResponseSpec {
    fn from_json(resolver: &SchemaResolver, status: &str, json: &Json) -> Result<Self> {
        let json = match json.get("$ref").and_then(Json::as_str) {
            Some(reference) => reference
                .strip_prefix('#')
                .and_then(|pointer| resolver.document().pointer(pointer))
                .ok_or_else(|| Error::schema_resolution(reference, "no such response"))?,
            None => json,
        };

        let mut headers = IndexMap::new();
        if let Some(Json::Object(declared)) = json.get("headers") {
            for (name, header) in declared {
                headers.insert(
                    name.clone(),
                    HeaderSpec {
                        name: name.clone(),
                        schema: SchemaNode::parse(header, None)?,
                        raw: header.clone(),
                    },
                );
            }
        }

        Ok(Self {
            status: status.to_string(),
            description: json.get("description").and_then(Json::as_str).map(str::to_string),
            schema: json.get("schema").map(|s| SchemaNode::parse(s, None)).transpose()?,
            headers,
        })
    }
}

/// One HTTP method on one path
#[derive(Debug, Clone)]
pub struct Operation {
    pub path_name: String,
    /// Lower case
    pub http_method: String,
    pub operation_id: String,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub deprecated: bool,
    /// Path-level parameters overridden by operation-level ones
    pub params: IndexMap<String, Param>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub responses: IndexMap<String, ResponseSpec>,
    /// Alternative requirement sets: scheme name to scopes
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

impl Operation {
    /// Optional string parameters for every apiKey scheme this operation
    /// accepts
    pub fn security_params(&self, spec: &Spec) -> Result<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();
        for requirement in &self.security {
            for scheme in requirement.keys() {
                let definition = spec.security_definition(scheme).ok_or_else(|| {
                    Error::invalid_spec(format!(
                        "{} requires unknown security definition {scheme}",
                        self.operation_id
                    ))
                })?;
                let Some(raw) = definition.api_key_parameter() else {
                    continue;
                };
                let param = Param::from_json(spec.resolver(), &raw)?;
                if !params.iter().any(|p| p.name == param.name && p.location == param.location) {
                    params.push(param);
                }
            }
        }
        Ok(params)
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }
}

/// Operations sharing a tag or leading path segment
#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub name: String,
    pub operations: IndexMap<String, Arc<Operation>>,
}

impl Resource {
    pub fn operation(&self, operation_id: &str) -> Option<&Arc<Operation>> {
        self.operations.get(operation_id)
    }
}

/// Build every operation of the document, keyed by operation id
pub fn build_operations(resolver: &SchemaResolver, document: &Json) -> Result<IndexMap<String, Arc<Operation>>> {
    let mut operations = IndexMap::new();
    let Some(Json::Object(paths)) = document.get("paths") else {
        return Ok(operations);
    };

    let global_consumes = string_list(document.get("consumes"));
    let global_produces = string_list(document.get("produces"));
    let global_security = security_requirements(document.get("security"));

    for (path_name, path_item) in paths {
        if path_name.starts_with("x-") {
            continue;
        }
        let path_params = params_of(resolver, path_item.get("parameters"))?;

        for method in HTTP_METHODS {
            let Some(raw) = path_item.get(*method) else {
                continue;
            };

            let mut params = path_params.clone();
            for param in params_of(resolver, raw.get("parameters"))? {
                params.retain(|p: &Param| !(p.name == param.name && p.location == param.location));
                params.push(param);
            }

            let operation_id = match raw.get("operationId").and_then(Json::as_str) {
                Some(id) => id.to_string(),
                None => synthesize_operation_id(method, path_name)?,
            };

            let mut responses = IndexMap::new();
            if let Some(Json::Object(declared)) = raw.get("responses") {
                for (status, response) in declared {
                    if status.starts_with("x-") {
                        continue;
                    }
                    responses.insert(status.clone(), ResponseSpec::from_json(resolver, status, response)?);
                }
            }

            let operation = Operation {
                path_name: path_name.clone(),
                http_method: method.to_string(),
                tags: string_list(raw.get("tags")),
                summary: raw.get("summary").and_then(Json::as_str).map(str::to_string),
                deprecated: raw.get("deprecated").and_then(Json::as_bool).unwrap_or(false),
                params: params.into_iter().map(|p| (p.name.clone(), p)).collect(),
                consumes: raw
                    .get("consumes")
                    .map(|c| string_list(Some(c)))
                    .unwrap_or_else(|| global_consumes.clone()),
                produces: raw
                    .get("produces")
                    .map(|p| string_list(Some(p)))
                    .unwrap_or_else(|| global_produces.clone()),
                responses,
                security: raw
                    .get("security")
                    .map(|s| security_requirements(Some(s)))
                    .unwrap_or_else(|| global_security.clone()),
                operation_id,
            };

            if operations.contains_key(&operation.operation_id) {
                tracing::warn!(
                    operation_id = %operation.operation_id,
                    path = %path_name,
                    method = method,
                    "duplicate operationId, keeping the first"
                );
                continue;
            }
            operations.insert(operation.operation_id.clone(), Arc::new(operation));
        }
    }
    Ok(operations)
}

/// Group operations by first tag, else by first path segment
pub fn group_resources(operations: &IndexMap<String, Arc<Operation>>) -> IndexMap<String, Resource> {
    let mut resources: IndexMap<String, Resource> = IndexMap::new();
    for (operation_id, operation) in operations {
        let name = match operation.tags.first() {
            Some(tag) => tag.clone(),
            None => operation
                .path_name
                .split('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or("_")
                .to_string(),
        };
        let resource = resources.entry(name.clone()).or_insert_with(|| Resource {
            name,
            operations: IndexMap::new(),
        });
        resource.operations.insert(operation_id.clone(), operation.clone());
    }
    resources
}

fn params_of(resolver: &SchemaResolver, list: Option<&Json>) -> Result<Vec<Param>> {
    match list {
        None => Ok(Vec::new()),
        Some(Json::Array(items)) => items.iter().map(|p| Param::from_json(resolver, p)).collect(),
        Some(other) => Err(Error::invalid_spec(format!("parameters must be a list, found {other}"))),
    }
}

/// `<method>_<path>` reduced to an identifier
fn synthesize_operation_id(method: &str, path_name: &str) -> Result<String> {
    let pattern = regex::Regex::new(r"[^A-Za-z0-9]+")
        .map_err(|e| Error::internal(format!("invalid identifier pattern: {e}")))?;
    let raw = format!("{method}_{path_name}");
    Ok(pattern.replace_all(&raw, "_").trim_matches('_').to_string())
}

fn string_list(value: Option<&Json>) -> Vec<String> {
    value
        .and_then(Json::as_array)
        .map(|items| items.iter().filter_map(Json::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn security_requirements(value: Option<&Json>) -> Vec<IndexMap<String, Vec<String>>> {
    value
        .and_then(Json::as_array)
        .map(|sets| {
            sets.iter()
                .filter_map(Json::as_object)
                .map(|set| {
                    set.iter()
                        .map(|(scheme, scopes)| (scheme.clone(), string_list(Some(scopes))))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default()
}
