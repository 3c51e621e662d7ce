//! Operation parameters: reading them off requests and writing them onto
//! outgoing ones
//!
//! Non-body parameters travel as text. Reading one means fetching the raw
//! text by location, substituting the default, splitting collection formats,
//! casting to the declared primitive type, validating and finally
//! unmarshaling. Writing runs the same steps backwards.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::request::{find_header, IncomingRequest, OutgoingRequest};
use crate::schema::{Schema, SchemaNode, SchemaResolver};
use crate::spec::Spec;
use crate::validate::validate_param;
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::fmt;
use url::Url;

/// Where a parameter travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    FormData,
    Body,
}

impl ParamLocation {
    pub fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "formData" => Some(Self::FormData),
            "body" => Some(Self::Body),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::FormData => "formData",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of array values as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionFormat {
    #[default]
    Csv,
    Ssv,
    Tsv,
    Pipes,
    /// One query or form pair per element
    Multi,
}

impl CollectionFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format {
            "csv" => Some(Self::Csv),
            "ssv" => Some(Self::Ssv),
            "tsv" => Some(Self::Tsv),
            "pipes" => Some(Self::Pipes),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }

    /// Separator, `multi` falls back to a comma when text is required
    pub fn separator(&self) -> char {
        match self {
            Self::Csv | Self::Multi => ',',
            Self::Ssv => ' ',
            Self::Tsv => '\t',
            Self::Pipes => '|',
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        text.split(self.separator()).map(str::to_string).collect()
    }

    pub fn join<S: AsRef<str>>(&self, parts: &[S]) -> String {
        let separator = self.separator().to_string();
        parts
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(&separator)
    }
}

/// One operation parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    pub collection_format: CollectionFormat,
    pub allow_empty_value: bool,
    /// `schema` of a body parameter, the parameter object itself otherwise
    pub schema: Schema,
    /// The parameter object with references expanded
    pub raw: Json,
}

impl Param {
    /// Parse a parameter object, following a `$ref` to `#/parameters/...`
    pub fn from_json(resolver: &SchemaResolver, json: &Json) -> Result<Param> {
        let raw = expand_reference(resolver, json)?;
        let name = raw
            .get("name")
            .and_then(Json::as_str)
            .ok_or_else(|| Error::invalid_spec(format!("parameter without a name: {raw}")))?
            .to_string();
        let location = raw
            .get("in")
            .and_then(Json::as_str)
            .and_then(ParamLocation::parse)
            .ok_or_else(|| Error::invalid_spec(format!("parameter {name} has no valid 'in'")))?;

        let schema = if location == ParamLocation::Body {
            let body = raw
                .get("schema")
                .ok_or_else(|| Error::invalid_spec(format!("body parameter {name} has no schema")))?;
            SchemaNode::parse(body, None)?
        } else {
            SchemaNode::parse(&raw, None)?
        };

        let collection_format = match raw.get("collectionFormat").and_then(Json::as_str) {
            None => CollectionFormat::default(),
            Some(format) => CollectionFormat::parse(format).ok_or_else(|| {
                Error::invalid_spec(format!("parameter {name} has unknown collectionFormat {format}"))
            })?,
        };

        Ok(Param {
            required: raw.get("required").and_then(Json::as_bool).unwrap_or(false),
            description: raw.get("description").and_then(Json::as_str).map(str::to_string),
            allow_empty_value: raw
                .get("allowEmptyValue")
                .and_then(Json::as_bool)
                .unwrap_or(false),
            name,
            location,
            collection_format,
            schema,
            raw,
        })
    }

    /// Declared `type` (absent for body parameters)
    pub fn param_type(&self) -> Option<&str> {
        match self.location {
            ParamLocation::Body => None,
            _ => self.schema.schema_type.as_deref(),
        }
    }

    pub fn default(&self) -> Option<&Json> {
        match self.location {
            ParamLocation::Body => None,
            _ => self.schema.default.as_ref(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.param_type() == Some("file")
    }

    fn is_array(&self) -> bool {
        self.param_type() == Some("array")
    }

    fn items_type(&self) -> Option<&str> {
        self.schema.items.as_ref()?.schema_type.as_deref()
    }
}

fn expand_reference(resolver: &SchemaResolver, json: &Json) -> Result<Json> {
    let mut current = json;
    for _ in 0..16 {
        let Some(reference) = current.get("$ref").and_then(Json::as_str) else {
            return Ok(current.clone());
        };
        current = reference
            .strip_prefix('#')
            .and_then(|pointer| resolver.document().pointer(pointer))
            .ok_or_else(|| Error::schema_resolution(reference, "no such parameter"))?;
    }
    Err(Error::schema_resolution(
        json.get("$ref").and_then(Json::as_str).unwrap_or_default(),
        "parameter reference chain does not terminate",
    ))
}

/// Read, validate and unmarshal one parameter from a request
pub fn unmarshal_param(spec: &Spec, param: &Param, request: &dyn IncomingRequest) -> Result<Value> {
    if param.is_file() {
        let file = request.files()?.get(&param.name).cloned();
        if file.is_none() && param.required && spec.config().validate_requests {
            validate_param(spec, param, None)?;
        }
        return Ok(file.map(Value::Bytes).unwrap_or(Value::Null));
    }

    let raw = prepare(param, raw_value(param, request)?);
    if spec.config().validate_requests {
        validate_param(spec, param, raw.as_ref())?;
    }
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };

    spec.sync_formats();
    let strategy = spec.unmarshal_strategy(&param.schema, !param.required)?;
    strategy(spec, &raw)
}

/// Unmarshal every parameter of `operation`, keyed by name
pub fn unmarshal_request(
    spec: &Spec,
    request: &dyn IncomingRequest,
    operation: &Operation,
) -> Result<IndexMap<String, Value>> {
    let mut values = IndexMap::new();
    for (name, param) in &operation.params {
        values.insert(name.clone(), unmarshal_param(spec, param, request)?);
    }
    Ok(values)
}

fn raw_value(param: &Param, request: &dyn IncomingRequest) -> Result<Option<Json>> {
    let name = &param.name;
    Ok(match param.location {
        ParamLocation::Path => request.path()?.get(name).cloned().map(Json::String),
        ParamLocation::Query => repeated_value(param, request.query()?.get(name)),
        ParamLocation::Header => find_header(request.headers()?, name).cloned().map(Json::String),
        ParamLocation::FormData => repeated_value(param, request.form()?.get(name)),
        ParamLocation::Body => Some(request.json()?).filter(|body| !body.is_null()),
    })
}

fn repeated_value(param: &Param, values: Option<&Vec<String>>) -> Option<Json> {
    let values = values.filter(|values| !values.is_empty())?;
    if param.is_array() && param.collection_format == CollectionFormat::Multi {
        return Some(Json::Array(values.iter().cloned().map(Json::String).collect()));
    }
    values.first().cloned().map(Json::String)
}

/// Empty-string, default, collection-format and casting rules
fn prepare(param: &Param, raw: Option<Json>) -> Option<Json> {
    if param.location == ParamLocation::Body {
        return raw;
    }

    let raw = raw.filter(|value| {
        !(value.as_str() == Some("") && param.param_type() != Some("string") && !param.allow_empty_value)
    });
    let raw = raw.or_else(|| param.default().cloned())?;

    if param.is_array() {
        let elements = match raw {
            Json::String(text) if text.is_empty() => Vec::new(),
            Json::String(text) => param
                .collection_format
                .split(&text)
                .into_iter()
                .map(Json::String)
                .collect(),
            Json::Array(elements) => elements,
            other => return Some(other),
        };
        let items_type = param.items_type();
        return Some(Json::Array(
            elements
                .into_iter()
                .map(|element| cast(items_type, element))
                .collect(),
        ));
    }
    Some(cast(param.param_type(), raw))
}

/// Cast text to the declared primitive type; uncastable text is left for
/// the validator to report
pub fn cast(param_type: Option<&str>, value: Json) -> Json {
    let Json::String(text) = &value else {
        return value;
    };
    let cast = match param_type {
        Some("integer") => text.trim().parse::<i64>().ok().map(Json::from),
        Some("number") => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Json::Number),
        Some("boolean") => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Json::Bool(true)),
            "false" => Some(Json::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    cast.unwrap_or(value)
}

/// Marshal, validate and encode one parameter onto `request`
pub fn marshal_param(spec: &Spec, param: &Param, value: &Value, request: &mut OutgoingRequest) -> Result<()> {
    if param.is_file() {
        let content = match value {
            Value::Bytes(bytes) => Some(bytes.clone()),
            Value::String(text) => Some(text.clone().into_bytes()),
            Value::Null => None,
            other => {
                return Err(Error::mapping(format!(
                    "Expected file content for {}, found {}",
                    param.name,
                    other.type_name()
                )))
            }
        };
        match content {
            Some(content) => {
                request.files.insert(param.name.clone(), content);
            }
            None if spec.config().validate_requests => validate_param(spec, param, None)?,
            None => {}
        }
        return Ok(());
    }

    spec.sync_formats();
    let strategy = spec.marshal_strategy(&param.schema, !param.required)?;
    let wire = Some(strategy(spec, value)?).filter(|wire| !wire.is_null());
    if spec.config().validate_requests {
        validate_param(spec, param, wire.as_ref())?;
    }
    let Some(wire) = wire else {
        return Ok(());
    };

    let name = param.name.clone();
    match param.location {
        ParamLocation::Path => {
            let encoded = encode_path_segment(&to_text(&wire, param.collection_format))?;
            request.path = request.path.replace(&format!("{{{name}}}"), &encoded);
        }
        ParamLocation::Query | ParamLocation::FormData => {
            let pairs = if param.location == ParamLocation::Query {
                &mut request.query
            } else {
                &mut request.form
            };
            match (&wire, param.collection_format) {
                (Json::Array(elements), CollectionFormat::Multi) => {
                    pairs.extend(elements.iter().map(|e| (name.clone(), scalar_text(e))));
                }
                _ => pairs.push((name, to_text(&wire, param.collection_format))),
            }
        }
        ParamLocation::Header => {
            request.headers.insert(name, to_text(&wire, param.collection_format));
        }
        ParamLocation::Body => {
            request.json = Some(wire);
            if request.header("Content-Type").is_none() {
                request
                    .headers
                    .insert("Content-Type".to_string(), "application/json".to_string());
            }
        }
    }
    Ok(())
}

/// Assemble a request for `operation` from parameter values keyed by name
pub fn marshal_request(
    spec: &Spec,
    operation: &Operation,
    values: &IndexMap<String, Value>,
) -> Result<OutgoingRequest> {
    if let Some(unexpected) = values.keys().find(|name| operation.param(name).is_none()) {
        return Err(Error::mapping(format!(
            "{} does not take a parameter named {unexpected}",
            operation.operation_id
        )));
    }

    let mut request = OutgoingRequest::new(operation.http_method.to_uppercase(), operation.path_name.clone());
    for (name, param) in &operation.params {
        let value = values.get(name).cloned().unwrap_or_default();
        marshal_param(spec, param, &value, &mut request)?;
    }
    Ok(request)
}

fn scalar_text(value: &Json) -> String {
    match value {
        Json::String(text) => text.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_text(value: &Json, format: CollectionFormat) -> String {
    match value {
        Json::Array(elements) => {
            let parts: Vec<String> = elements.iter().map(scalar_text).collect();
            format.join(&parts)
        }
        other => scalar_text(other),
    }
}

/// Percent-encode text as one path segment
fn encode_path_segment(text: &str) -> Result<String> {
    let mut url = Url::parse("http://localhost/").map_err(|e| Error::internal(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::internal("base URL cannot hold path segments"))?;
        segments.pop_if_empty().push(text);
    }
    Ok(url.path().trim_start_matches('/').to_string())
}
