//! Responses: picking the declared response, validating and unmarshaling
//! what came back, marshaling what goes out
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::marshal::marshal_schema_object;
use crate::operation::{Operation, ResponseSpec};
use crate::param::cast;
use crate::request::find_header;
use crate::spec::Spec;
use crate::unmarshal::unmarshal_schema_object;
use crate::validate::validate_schema_object;
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::Value as Json;
use swagmap_schemas::ValidationError;

/// Read access to a response received by a client
pub trait IncomingResponse {
    fn status_code(&self) -> Result<u16> {
        Err(Error::not_implemented("status_code"))
    }

    fn headers(&self) -> Result<&IndexMap<String, String>> {
        Err(Error::not_implemented("headers"))
    }

    fn content_type(&self) -> Result<Option<String>> {
        Ok(find_header(self.headers()?, "content-type").cloned())
    }

    fn json(&self) -> Result<Json> {
        Err(Error::not_implemented("json"))
    }

    fn text(&self) -> Result<String> {
        Err(Error::not_implemented("text"))
    }
}

/// Read access to a response a server is about to send
pub trait OutgoingResponse {
    fn status_code(&self) -> Result<u16> {
        Err(Error::not_implemented("status_code"))
    }

    fn headers(&self) -> Result<&IndexMap<String, String>> {
        Err(Error::not_implemented("headers"))
    }

    fn content_type(&self) -> Result<Option<String>> {
        Ok(find_header(self.headers()?, "content-type").cloned())
    }

    fn json(&self) -> Result<Json> {
        Err(Error::not_implemented("json"))
    }

    fn text(&self) -> Result<String> {
        Err(Error::not_implemented("text"))
    }
}

/// A plain in-memory response usable on either side
#[derive(Debug, Clone, Default)]
pub struct ResponseData {
    pub status_code: u16,
    pub headers: IndexMap<String, String>,
    pub body: Option<Json>,
    pub text: Option<String>,
}

impl ResponseData {
    pub fn json(status_code: u16, body: Json) -> Self {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: Some(body),
            text: None,
        }
    }

    pub fn text(status_code: u16, content_type: &str, text: impl Into<String>) -> Self {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body: None,
            text: Some(text.into()),
        }
    }

    pub fn empty(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    fn body_json(&self) -> Result<Json> {
        match (&self.body, &self.text) {
            (Some(body), _) => Ok(body.clone()),
            (None, Some(text)) => Ok(serde_json::from_str(text)?),
            (None, None) => Ok(Json::Null),
        }
    }

    fn body_text(&self) -> String {
        match (&self.text, &self.body) {
            (Some(text), _) => text.clone(),
            (None, Some(body)) => body.to_string(),
            (None, None) => String::new(),
        }
    }
}

impl IncomingResponse for ResponseData {
    fn status_code(&self) -> Result<u16> {
        Ok(self.status_code)
    }

    fn headers(&self) -> Result<&IndexMap<String, String>> {
        Ok(&self.headers)
    }

    fn json(&self) -> Result<Json> {
        self.body_json()
    }

    fn text(&self) -> Result<String> {
        Ok(self.body_text())
    }
}

impl OutgoingResponse for ResponseData {
    fn status_code(&self) -> Result<u16> {
        Ok(self.status_code)
    }

    fn headers(&self) -> Result<&IndexMap<String, String>> {
        Ok(&self.headers)
    }

    fn json(&self) -> Result<Json> {
        self.body_json()
    }

    fn text(&self) -> Result<String> {
        Ok(self.body_text())
    }
}

/// The outcome of [`unmarshal_response`]
#[derive(Debug, Clone, PartialEq)]
pub struct UnmarshaledResponse {
    pub status_code: u16,
    pub result: Value,
    pub headers: IndexMap<String, Value>,
}

/// The declared response for a status: exact match, else `default`
pub fn get_response_spec(status_code: u16, operation: &Operation) -> Result<&ResponseSpec> {
    operation
        .responses
        .get(&status_code.to_string())
        .or_else(|| operation.responses.get("default"))
        .ok_or_else(|| Error::MatchingResponseNotFound {
            status_code,
            operation_id: operation.operation_id.clone(),
        })
}

/// Unified view over both response traits
struct ResponseView {
    status_code: u16,
    headers: IndexMap<String, String>,
    content_type: Option<String>,
}

fn is_json(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(content_type) => {
            let media = media_type(content_type);
            media == "application/json" || media.ends_with("+json")
        }
    }
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Validate, then unmarshal the body and declared headers
pub fn unmarshal_response(
    spec: &Spec,
    response: &dyn IncomingResponse,
    operation: &Operation,
) -> Result<UnmarshaledResponse> {
    let status_code = response.status_code()?;
    let response_spec = get_response_spec(status_code, operation)?;
    let view = ResponseView {
        status_code,
        headers: response.headers()?.clone(),
        content_type: response.content_type()?,
    };
    let body = || response.json();

    if spec.config().validate_responses {
        check_response(spec, operation, response_spec, &view, &body)?;
    }

    let result = match &response_spec.schema {
        None => Value::Null,
        Some(schema) if is_json(view.content_type.as_deref()) => {
            unmarshal_schema_object(spec, schema, &response.json()?)?
        }
        Some(_) => Value::String(response.text()?),
    };

    let mut headers = IndexMap::new();
    for (name, header) in &response_spec.headers {
        let Some(raw) = find_header(&view.headers, name) else {
            continue;
        };
        let raw = cast(header.schema.schema_type.as_deref(), Json::String(raw.clone()));
        headers.insert(name.clone(), unmarshal_schema_object(spec, &header.schema, &raw)?);
    }

    Ok(UnmarshaledResponse {
        status_code: view.status_code,
        result,
        headers,
    })
}

/// Validate a received response against its declaration
pub fn validate_response(spec: &Spec, response: &dyn IncomingResponse, operation: &Operation) -> Result<()> {
    let status_code = response.status_code()?;
    let response_spec = get_response_spec(status_code, operation)?;
    let view = ResponseView {
        status_code,
        headers: response.headers()?.clone(),
        content_type: response.content_type()?,
    };
    check_response(spec, operation, response_spec, &view, &|| response.json())
}

/// Validate a response a server is about to send
pub fn validate_outgoing_response(
    spec: &Spec,
    response: &dyn OutgoingResponse,
    operation: &Operation,
) -> Result<()> {
    let status_code = response.status_code()?;
    let response_spec = get_response_spec(status_code, operation)?;
    let view = ResponseView {
        status_code,
        headers: response.headers()?.clone(),
        content_type: response.content_type()?,
    };
    check_response(spec, operation, response_spec, &view, &|| response.json())
}

fn check_response(
    spec: &Spec,
    operation: &Operation,
    response_spec: &ResponseSpec,
    view: &ResponseView,
    body: &dyn Fn() -> Result<Json>,
) -> Result<()> {
    if let Some(schema) = &response_spec.schema {
        if let Some(content_type) = &view.content_type {
            let media = media_type(content_type);
            let declared = !operation.produces.is_empty();
            if declared && !operation.produces.iter().any(|p| media_type(p) == media) {
                return Err(ValidationError::with_violations(
                    "content-type",
                    format!(
                        "Content-Type {content_type} is not one of {:?} for {}",
                        operation.produces, operation.operation_id
                    ),
                    vec![ValidationError::create_violation(
                        "produces",
                        operation.produces.join(", "),
                        content_type.clone(),
                    )],
                )
                .into());
            }
        }
        if is_json(view.content_type.as_deref()) {
            validate_schema_object(spec, schema, &body()?)?;
        }
    }

    for (name, header) in &response_spec.headers {
        if let Some(raw) = find_header(&view.headers, name) {
            let value = cast(header.schema.schema_type.as_deref(), Json::String(raw.clone()));
            spec.validator()
                .validate_schema_object(&header.raw, &value)
                .map_err(|mut e| {
                    e.message = format!("header {name}: {}", e.message);
                    e
                })?;
        }
    }
    Ok(())
}

/// Marshal a server-side result for the response declared at `status_code`
pub fn marshal_response_body(spec: &Spec, operation: &Operation, status_code: u16, value: &Value) -> Result<Json> {
    let response_spec = get_response_spec(status_code, operation)?;
    match &response_spec.schema {
        Some(schema) => marshal_schema_object(spec, schema, value),
        None => Ok(Json::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Model;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spec() -> Spec {
        Spec::builder(json!({
            "swagger": "2.0",
            "info": {"title": "Petstore", "version": "1.0"},
            "produces": ["application/json"],
            "paths": {
                "/pets/{petId}": {
                    "get": {
                        "operationId": "getPet",
                        "parameters": [{"name": "petId", "in": "path", "required": true, "type": "integer"}],
                        "responses": {
                            "200": {
                                "description": "ok",
                                "schema": {"$ref": "#/definitions/Pet"},
                                "headers": {"X-Rate-Limit": {"type": "integer"}}
                            },
                            "default": {"description": "error", "schema": {"$ref": "#/definitions/Error"}}
                        }
                    }
                },
                "/health": {
                    "get": {"operationId": "health", "responses": {"204": {"description": "no content"}}}
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}, "born": {"type": "string", "format": "date"}}
                },
                "Error": {"type": "object", "properties": {"message": {"type": "string"}}}
            }
        }))
        .build()
        .unwrap()
    }

    #[test]
    fn test_response_spec_lookup() {
        let spec = spec();
        let get_pet = spec.operation("getPet").unwrap();
        assert_eq!(get_response_spec(200, get_pet).unwrap().status, "200");
        assert_eq!(get_response_spec(500, get_pet).unwrap().status, "default");

        let health = spec.operation("health").unwrap();
        match get_response_spec(200, health) {
            Err(Error::MatchingResponseNotFound { status_code, operation_id }) => {
                assert_eq!(status_code, 200);
                assert_eq!(operation_id, "health");
            }
            other => panic!("expected MatchingResponseNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_unmarshal_response() {
        let spec = spec();
        let get_pet = spec.operation("getPet").unwrap();
        let response = ResponseData::json(200, json!({"name": "rex", "born": "2020-02-02"}))
            .with_header("x-rate-limit", "10");

        let unmarshaled = unmarshal_response(&spec, &response, get_pet).unwrap();
        assert_eq!(unmarshaled.status_code, 200);
        let pet = unmarshaled.result.as_model().unwrap();
        assert_eq!(pet.name(), "Pet");
        assert!(matches!(pet.get("born"), Some(Value::Date(_))));
        assert_eq!(unmarshaled.headers["X-Rate-Limit"], Value::Integer(10));

        let error = ResponseData::json(500, json!({"message": "boom"}));
        let unmarshaled = unmarshal_response(&spec, &error, get_pet).unwrap();
        assert_eq!(unmarshaled.result.as_model().unwrap().name(), "Error");

        let empty = unmarshal_response(&spec, &ResponseData::empty(204), spec.operation("health").unwrap()).unwrap();
        assert_eq!(empty.result, Value::Null);
    }

    #[test]
    fn test_validate_response() {
        let spec = spec();
        let get_pet = spec.operation("getPet").unwrap();

        let invalid = ResponseData::json(200, json!({"born": "2020-02-02"}));
        assert!(validate_response(&spec, &invalid, get_pet).unwrap_err().is_validation());
        assert!(unmarshal_response(&spec, &invalid, get_pet).is_err());

        let wrong_type = ResponseData::text(200, "text/html", "<p>hi</p>");
        let err = validate_response(&spec, &wrong_type, get_pet).unwrap_err();
        assert!(err.to_string().contains("text/html"));

        let bad_header = ResponseData::json(200, json!({"name": "rex"})).with_header("X-Rate-Limit", "lots");
        assert!(validate_response(&spec, &bad_header, get_pet).is_err());

        let charset = ResponseData::json(200, json!({"name": "rex"}))
            .with_header("Content-Type", "application/json; charset=utf-8");
        assert!(validate_outgoing_response(&spec, &charset, get_pet).is_ok());
    }

    #[test]
    fn test_response_validation_can_be_disabled() {
        let mut document = spec().document().clone();
        document["definitions"]["Pet"]["required"] = json!(["name", "tag"]);
        let config = crate::config::SpecConfig {
            validate_responses: false,
            ..Default::default()
        };
        let spec = Spec::builder(document).config(config).build().unwrap();
        let response = ResponseData::json(200, json!({"name": "rex"}));
        assert!(unmarshal_response(&spec, &response, spec.operation("getPet").unwrap()).is_ok());
    }

    #[test]
    fn test_marshal_response_body() {
        let spec = spec();
        let get_pet = spec.operation("getPet").unwrap();
        let pet = Model::new("Pet").with("name", "rex").with("born", Value::Null);
        assert_eq!(
            marshal_response_body(&spec, get_pet, 200, &Value::Model(pet)).unwrap(),
            json!({"name": "rex"})
        );
        assert_eq!(
            marshal_response_body(&spec, spec.operation("health").unwrap(), 204, &Value::Null).unwrap(),
            Json::Null
        );
    }
}
