//! Native values produced by unmarshaling and consumed by marshaling
//!
//! [`Value`] mirrors JSON with a few extra variants for formatted
//! primitives (bytes, dates, timestamps) and [`Model`] instances.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::{self, Error};

/// A native value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Model(Model),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Value::Model(model) => Some(model),
            _ => None,
        }
    }

    /// Look up a key on an object or a model
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            Value::Model(model) => model.get(key),
            _ => None,
        }
    }

    /// Short type name used in mapping error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Model(_) => "model",
        }
    }

    /// Convert untyped wire JSON, rejecting integers that do not fit `i64`
    pub fn from_wire(json: &Json) -> error::Result<Self> {
        Ok(match json {
            Json::Number(n) if n.is_u64() && n.as_i64().is_none() => {
                return Err(Error::mapping(format!("{n} is out of range for integer")));
            }
            Json::Array(items) => Value::Array(
                items.iter().map(Value::from_wire).collect::<error::Result<_>>()?,
            ),
            Json::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_wire(v)?)))
                    .collect::<error::Result<_>>()?,
            ),
            other => Value::from(other),
        })
    }

    /// Plain JSON rendering, used on pass-through paths
    ///
    /// Dates render as ISO-8601, bytes as (lossy) UTF-8 text and models as
    /// the merge of declared and additional properties.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(n) => Json::from(*n),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(bytes) => Json::String(String::from_utf8_lossy(bytes).into_owned()),
            Value::Date(date) => Json::String(date.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Json::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Model(model) => model.to_object().to_json(),
        }
    }
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            Json::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from(&json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<Model> for Value {
    fn from(model: Model) -> Self {
        Value::Model(model)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// An instance of a named model
///
/// Declared properties and undeclared (additional) ones are kept apart;
/// equality compares the name and both property sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    name: String,
    properties: IndexMap<String, Value>,
    additional_properties: IndexMap<String, Value>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style property setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared property first, then the additional bucket
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .get(key)
            .or_else(|| self.additional_properties.get(key))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.additional_properties.shift_remove(&key);
        self.properties.insert(key, value.into());
    }

    pub fn set_additional(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.additional_properties.insert(key.into(), value.into());
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn additional_properties(&self) -> &IndexMap<String, Value> {
        &self.additional_properties
    }

    /// Merge declared and additional properties into a plain object
    pub fn to_object(&self) -> Value {
        let mut merged = self.properties.clone();
        for (key, value) in &self.additional_properties {
            merged.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion() {
        let json = json!({"a": [1, 2.5, "x", null, true]});
        let value = Value::from(&json);
        assert_eq!(
            value.get("a").and_then(Value::as_array).map(Vec::len),
            Some(5)
        );
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_from_wire_rejects_oversized_integers() {
        let big = json!({"ids": [1, u64::MAX]});
        let err = Value::from_wire(&big).unwrap_err();
        assert!(err.is_mapping());
        assert!(err.to_string().contains("18446744073709551615"));

        let ok = json!({"ids": [1, i64::MAX, 2.5]});
        assert_eq!(Value::from_wire(&ok).unwrap(), Value::from(&ok));
    }

    #[test]
    fn test_formatted_values_render_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_json(), json!("2024-02-29"));

        let dt = DateTime::parse_from_rfc3339("2024-02-29T10:30:00+02:00").unwrap();
        assert_eq!(Value::DateTime(dt).to_json(), json!("2024-02-29T10:30:00+02:00"));
    }

    #[test]
    fn test_model_equality_and_access() {
        let mut rex = Model::new("Pet").with("name", "rex");
        rex.set_additional("color", "brown");
        let same = {
            let mut m = Model::new("Pet").with("name", "rex");
            m.set_additional("color", "brown");
            m
        };
        assert_eq!(rex, same);
        assert_eq!(rex.get("color"), Some(&Value::from("brown")));

        rex.set("color", "black");
        assert!(rex.additional_properties().is_empty());
        assert_eq!(rex.to_object().to_json(), json!({"name": "rex", "color": "black"}));
        assert_ne!(rex, same);
    }
}
