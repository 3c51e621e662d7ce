//! Request collaborators
//!
//! The HTTP layer is not part of this crate. Incoming requests are read
//! through [`IncomingRequest`]; every accessor has a default that fails
//! with [`Error::NotImplemented`], so an adapter only provides what its
//! framework exposes. Outgoing requests are assembled into
//! [`OutgoingRequest`].
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value as Json;

/// Read access to a server-side request
pub trait IncomingRequest {
    /// Path template values by name
    fn path(&self) -> Result<&IndexMap<String, String>> {
        Err(Error::not_implemented("path"))
    }

    /// Query values by name, in arrival order
    fn query(&self) -> Result<&IndexMap<String, Vec<String>>> {
        Err(Error::not_implemented("query"))
    }

    fn headers(&self) -> Result<&IndexMap<String, String>> {
        Err(Error::not_implemented("headers"))
    }

    /// Form fields by name
    fn form(&self) -> Result<&IndexMap<String, Vec<String>>> {
        Err(Error::not_implemented("form"))
    }

    /// Uploaded files by field name
    fn files(&self) -> Result<&IndexMap<String, Vec<u8>>> {
        Err(Error::not_implemented("files"))
    }

    /// The decoded JSON body
    fn json(&self) -> Result<Json> {
        Err(Error::not_implemented("json"))
    }
}

/// Case-insensitive header lookup
pub fn find_header<'a>(headers: &'a IndexMap<String, String>, name: &str) -> Option<&'a String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// A plain in-memory request, handy for tests and simple adapters
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    pub path: IndexMap<String, String>,
    pub query: IndexMap<String, Vec<String>>,
    pub headers: IndexMap<String, String>,
    pub form: IndexMap<String, Vec<String>>,
    pub files: IndexMap<String, Vec<u8>>,
    pub body: Option<Json>,
}

impl RequestData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(name.into(), content.into());
        self
    }

    pub fn with_body(mut self, body: Json) -> Self {
        self.body = Some(body);
        self
    }
}

impl IncomingRequest for RequestData {
    fn path(&self) -> Result<&IndexMap<String, String>> {
        Ok(&self.path)
    }

    fn query(&self) -> Result<&IndexMap<String, Vec<String>>> {
        Ok(&self.query)
    }

    fn headers(&self) -> Result<&IndexMap<String, String>> {
        Ok(&self.headers)
    }

    fn form(&self) -> Result<&IndexMap<String, Vec<String>>> {
        Ok(&self.form)
    }

    fn files(&self) -> Result<&IndexMap<String, Vec<u8>>> {
        Ok(&self.files)
    }

    fn json(&self) -> Result<Json> {
        Ok(self.body.clone().unwrap_or(Json::Null))
    }
}

/// A client-side request being assembled from parameter values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingRequest {
    pub method: String,
    /// Path template, `{name}` segments replaced as parameters are marshaled
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: IndexMap<String, String>,
    pub form: Vec<(String, String)>,
    pub files: IndexMap<String, Vec<u8>>,
    pub json: Option<Json>,
}

impl OutgoingRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Query values for one name
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        find_header(&self.headers, name)
    }
}
