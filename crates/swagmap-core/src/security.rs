//! Security definitions
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::param::ParamLocation;
use indexmap::IndexMap;
use serde_json::{json, Value as Json};

/// The scheme of one `securityDefinitions` entry
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityScheme {
    Basic,
    ApiKey {
        /// Header or query parameter name
        name: String,
        location: ParamLocation,
    },
    OAuth2 {
        flow: String,
        authorization_url: Option<String>,
        token_url: Option<String>,
        scopes: IndexMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityDefinition {
    pub name: String,
    pub scheme: SecurityScheme,
    pub description: Option<String>,
}

impl SecurityDefinition {
    pub fn from_json(name: &str, json: &Json) -> Result<Self> {
        let field = |key: &str| json.get(key).and_then(Json::as_str).map(str::to_string);
        let scheme = match json.get("type").and_then(Json::as_str) {
            Some("basic") => SecurityScheme::Basic,
            Some("apiKey") => {
                let key_name = field("name").ok_or_else(|| {
                    Error::invalid_spec(format!("apiKey security definition {name} has no name"))
                })?;
                let location = match json.get("in").and_then(Json::as_str) {
                    Some("header") => ParamLocation::Header,
                    Some("query") => ParamLocation::Query,
                    other => {
                        return Err(Error::invalid_spec(format!(
                            "apiKey security definition {name} must be in header or query, found {other:?}"
                        )))
                    }
                };
                SecurityScheme::ApiKey {
                    name: key_name,
                    location,
                }
            }
            Some("oauth2") => SecurityScheme::OAuth2 {
                flow: field("flow").unwrap_or_default(),
                authorization_url: field("authorizationUrl"),
                token_url: field("tokenUrl"),
                scopes: json
                    .get("scopes")
                    .and_then(Json::as_object)
                    .map(|scopes| {
                        scopes
                            .iter()
                            .map(|(scope, text)| (scope.clone(), text.as_str().unwrap_or_default().to_string()))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            other => {
                return Err(Error::invalid_spec(format!(
                    "security definition {name} has unsupported type {other:?}"
                )))
            }
        };
        Ok(Self {
            name: name.to_string(),
            scheme,
            description: field("description"),
        })
    }

    /// Parameter object carrying an API key, if this is an apiKey scheme
    pub fn api_key_parameter(&self) -> Option<Json> {
        match &self.scheme {
            SecurityScheme::ApiKey { name, location } => Some(json!({
                "name": name,
                "in": location.as_str(),
                "type": "string",
                "required": false,
            })),
            _ => None,
        }
    }
}
