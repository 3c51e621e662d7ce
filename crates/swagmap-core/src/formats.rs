//! Named formats: wire/native conversions for primitive schemas
//!
//! A [`FormatRegistry`] maps a `format` string (`int32`, `date`, ...) to a
//! [`SwaggerFormat`] holding the two conversion functions and an optional
//! string validator. One registry is shared by every spec built without an
//! explicit one ([`FormatRegistry::shared`]). Every mutation bumps a
//! generation counter so specs can drop cached strategies and validators
//! that captured the previous entries.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use swagmap_schemas::FormatCheck;

pub type ToWire = Arc<dyn Fn(&Value) -> Result<Json> + Send + Sync>;
pub type ToNative = Arc<dyn Fn(&Json) -> Result<Value> + Send + Sync>;

/// A named wire/native conversion pair
#[derive(Clone)]
pub struct SwaggerFormat {
    pub name: String,
    pub to_wire: ToWire,
    pub to_native: ToNative,
    /// Checks the wire string during validation
    pub validate: Option<FormatCheck>,
    pub description: String,
}

impl fmt::Debug for SwaggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwaggerFormat")
            .field("name", &self.name)
            .field("validates", &self.validate.is_some())
            .field("description", &self.description)
            .finish()
    }
}

impl SwaggerFormat {
    pub fn new<W, N>(name: impl Into<String>, to_wire: W, to_native: N, description: impl Into<String>) -> Self
    where
        W: Fn(&Value) -> Result<Json> + Send + Sync + 'static,
        N: Fn(&Json) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            to_wire: Arc::new(to_wire),
            to_native: Arc::new(to_native),
            validate: None,
            description: description.into(),
        }
    }

    pub fn with_validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(check));
        self
    }

    pub fn to_wire(&self, value: &Value) -> Result<Json> {
        (self.to_wire)(value)
    }

    pub fn to_native(&self, value: &Json) -> Result<Value> {
        (self.to_native)(value)
    }
}

/// Registry of formats
#[derive(Debug)]
pub struct FormatRegistry {
    formats: RwLock<HashMap<String, Arc<SwaggerFormat>>>,
    generation: AtomicU64,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self {
            formats: RwLock::new(HashMap::new()),
            // starts above zero so a fresh consumer always syncs once
            generation: AtomicU64::new(1),
        }
    }
}

impl FormatRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `int32`, `int64`, `float`, `double`, `byte`,
    /// `date` and `date-time`
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for format in builtin_formats() {
            registry.register(format);
        }
        registry
    }

    /// Process-wide registry with the builtins
    pub fn shared() -> Arc<FormatRegistry> {
        static SHARED: OnceLock<Arc<FormatRegistry>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(FormatRegistry::with_builtins()))
            .clone()
    }

    /// Add or overwrite a format, returning the entry it replaced
    pub fn register(&self, format: SwaggerFormat) -> Option<Arc<SwaggerFormat>> {
        let previous = match self.formats.write() {
            Ok(mut formats) => formats.insert(format.name.clone(), Arc::new(format)),
            Err(poisoned) => {
                let mut formats = poisoned.into_inner();
                formats.insert(format.name.clone(), Arc::new(format))
            }
        };
        self.generation.fetch_add(1, Ordering::SeqCst);
        previous
    }

    /// Remove a format, returning it
    pub fn unregister(&self, name: &str) -> Option<Arc<SwaggerFormat>> {
        let removed = match self.formats.write() {
            Ok(mut formats) => formats.remove(name),
            Err(poisoned) => poisoned.into_inner().remove(name),
        };
        if removed.is_some() {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    fn lookup(&self, name: &str) -> Option<Arc<SwaggerFormat>> {
        match self.formats.read() {
            Ok(formats) => formats.get(name).cloned(),
            Err(poisoned) => poisoned.into_inner().get(name).cloned(),
        }
    }

    /// Look up a format; unknown names are logged and yield `None`
    pub fn get(&self, name: &str) -> Option<Arc<SwaggerFormat>> {
        let format = self.lookup(name);
        if format.is_none() {
            tracing::warn!(format = name, "unknown format, values pass through unchanged");
        }
        format
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.formats.read() {
            Ok(formats) => formats.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        names.sort();
        names
    }

    /// Changes on every register and every effective unregister
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// String validators for the validation adapter
    pub fn string_format_checks(&self) -> Vec<(String, FormatCheck)> {
        let formats = match self.formats.read() {
            Ok(formats) => formats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        formats
            .into_iter()
            .filter_map(|(name, format)| format.validate.clone().map(|check| (name, check)))
            .collect()
    }

    /// Convert a native value to the wire; null values and missing or
    /// unknown formats pass through
    pub fn to_wire(&self, format: Option<&str>, value: &Value) -> Result<Json> {
        match format.filter(|_| !value.is_null()).and_then(|name| self.get(name)) {
            Some(format) => format.to_wire(value),
            None => Ok(value.to_json()),
        }
    }

    /// Convert a wire value to native; null values and missing or unknown
    /// formats pass through
    pub fn to_native(&self, format: Option<&str>, value: &Json) -> Result<Value> {
        match format.filter(|_| !value.is_null()).and_then(|name| self.get(name)) {
            Some(format) => format.to_native(value),
            None => Value::from_wire(value),
        }
    }
}

/// Registers a format for the lifetime of the guard
///
/// On drop the previous entry is restored, or the name removed when there
/// was none.
#[derive(Debug)]
pub struct ScopedFormat {
    registry: Arc<FormatRegistry>,
    name: String,
    previous: Option<Arc<SwaggerFormat>>,
}

impl ScopedFormat {
    pub fn register(registry: Arc<FormatRegistry>, format: SwaggerFormat) -> Self {
        let name = format.name.clone();
        let previous = registry.register(format);
        Self {
            registry,
            name,
            previous,
        }
    }
}

impl Drop for ScopedFormat {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                self.registry.register(SwaggerFormat::clone(&previous));
            }
            None => {
                self.registry.unregister(&self.name);
            }
        }
    }
}

fn builtin_formats() -> Vec<SwaggerFormat> {
    vec![
        SwaggerFormat::new(
            "int32",
            |v| integer_to_wire(v, "int32", i32::MIN.into(), i32::MAX.into()),
            |j| integer_to_native(j, "int32", i32::MIN.into(), i32::MAX.into()),
            "Signed 32 bits",
        ),
        SwaggerFormat::new(
            "int64",
            |v| integer_to_wire(v, "int64", i64::MIN, i64::MAX),
            |j| integer_to_native(j, "int64", i64::MIN, i64::MAX),
            "Signed 64 bits",
        ),
        SwaggerFormat::new("float", float_to_wire, float_to_native, "Single precision float"),
        SwaggerFormat::new("double", float_to_wire, float_to_native, "Double precision float"),
        SwaggerFormat::new("byte", byte_to_wire, byte_to_native, "Byte string")
            .with_validator(|_| true),
        SwaggerFormat::new("date", date_to_wire, date_to_native, "Calendar date (ISO-8601)")
            .with_validator(|s| parse_date(s).is_some()),
        SwaggerFormat::new(
            "date-time",
            date_time_to_wire,
            date_time_to_native,
            "Date and time (ISO-8601)",
        )
        .with_validator(|s| parse_date_time(s).is_some()),
    ]
}

fn integer_to_wire(value: &Value, format: &str, min: i64, max: i64) -> Result<Json> {
    match value {
        Value::Integer(n) if (min..=max).contains(n) => Ok(Json::from(*n)),
        Value::Integer(n) => Err(Error::mapping(format!("{n} is out of range for {format}"))),
        Value::Float(f) if f.fract() == 0.0 && *f >= min as f64 && *f <= max as f64 => {
            Ok(Json::from(*f as i64))
        }
        other => Err(Error::mapping(format!(
            "Expected integer for format {format}, found {}",
            other.type_name()
        ))),
    }
}

fn integer_to_native(value: &Json, format: &str, min: i64, max: i64) -> Result<Value> {
    match value.as_i64() {
        Some(n) if (min..=max).contains(&n) => Ok(Value::Integer(n)),
        Some(n) => Err(Error::mapping(format!("{n} is out of range for {format}"))),
        None => Err(Error::mapping(format!(
            "Expected integer for format {format}, found {value}"
        ))),
    }
}

fn float_to_wire(value: &Value) -> Result<Json> {
    let n = value
        .as_f64()
        .ok_or_else(|| Error::mapping(format!("Expected number, found {}", value.type_name())))?;
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .ok_or_else(|| Error::mapping(format!("{n} cannot be represented on the wire")))
}

fn float_to_native(value: &Json) -> Result<Value> {
    value
        .as_f64()
        .map(Value::Float)
        .ok_or_else(|| Error::mapping(format!("Expected number, found {value}")))
}

fn byte_to_wire(value: &Value) -> Result<Json> {
    match value {
        Value::Bytes(bytes) => String::from_utf8(bytes.clone())
            .map(Json::String)
            .map_err(|_| Error::mapping("byte value is not valid UTF-8")),
        Value::String(s) => Ok(Json::String(s.clone())),
        other => Err(Error::mapping(format!("Expected bytes, found {}", other.type_name()))),
    }
}

fn byte_to_native(value: &Json) -> Result<Value> {
    match value {
        Json::String(s) => Ok(Value::Bytes(s.clone().into_bytes())),
        other => Err(Error::mapping(format!("Expected string for format byte, found {other}"))),
    }
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Tolerant timestamp parsing: RFC 3339, naive date-time (taken as UTC) or
/// a bare date (midnight UTC)
pub(crate) fn parse_date_time(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))?;
    Some(Utc.from_utc_datetime(&naive).fixed_offset())
}

fn date_to_wire(value: &Value) -> Result<Json> {
    match value {
        Value::Date(date) => Ok(Json::String(date.format("%Y-%m-%d").to_string())),
        Value::DateTime(dt) => Ok(Json::String(dt.date_naive().format("%Y-%m-%d").to_string())),
        Value::String(s) => Ok(Json::String(s.clone())),
        other => Err(Error::mapping(format!("Expected date, found {}", other.type_name()))),
    }
}

fn date_to_native(value: &Json) -> Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::mapping(format!("Expected date string, found {value}")))?;
    parse_date(text)
        .map(Value::Date)
        .ok_or_else(|| Error::mapping(format!("'{text}' is not a valid date")))
}

fn date_time_to_wire(value: &Value) -> Result<Json> {
    match value {
        Value::DateTime(dt) => Ok(Json::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))),
        Value::Date(date) => {
            let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
            let dt = Utc.from_utc_datetime(&midnight).fixed_offset();
            Ok(Json::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)))
        }
        Value::String(s) => Ok(Json::String(s.clone())),
        other => Err(Error::mapping(format!("Expected date-time, found {}", other.type_name()))),
    }
}

fn date_time_to_native(value: &Json) -> Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::mapping(format!("Expected date-time string, found {value}")))?;
    parse_date_time(text)
        .map(Value::DateTime)
        .ok_or_else(|| Error::mapping(format!("'{text}' is not a valid date-time")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = FormatRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            ["byte", "date", "date-time", "double", "float", "int32", "int64"]
        );
        assert!(registry.get("uuid").is_none());
    }

    #[test]
    fn test_int32_rejects_out_of_range() {
        let registry = FormatRegistry::with_builtins();
        assert_eq!(
            registry.to_native(Some("int32"), &json!(2147483647)).unwrap(),
            Value::Integer(2147483647)
        );
        assert!(registry.to_native(Some("int32"), &json!(2147483648i64)).is_err());
        assert!(registry.to_wire(Some("int32"), &Value::Integer(-2147483649)).is_err());
        assert_eq!(
            registry.to_wire(Some("int64"), &Value::Integer(2147483648)).unwrap(),
            json!(2147483648i64)
        );
    }

    #[test]
    fn test_byte_is_a_passthrough() {
        let registry = FormatRegistry::with_builtins();
        let native = registry.to_native(Some("byte"), &json!("aGVsbG8=")).unwrap();
        assert_eq!(native, Value::Bytes(b"aGVsbG8=".to_vec()));
        assert_eq!(registry.to_wire(Some("byte"), &native).unwrap(), json!("aGVsbG8="));
    }

    #[test]
    fn test_date_time_is_tolerant() {
        let registry = FormatRegistry::with_builtins();
        let full = registry
            .to_native(Some("date-time"), &json!("2024-01-02T03:04:05Z"))
            .unwrap();
        let date_only = registry.to_native(Some("date-time"), &json!("2024-01-02")).unwrap();
        assert!(matches!(full, Value::DateTime(_)));
        assert_eq!(
            registry.to_wire(Some("date-time"), &date_only).unwrap(),
            json!("2024-01-02T00:00:00+00:00")
        );
        assert!(registry.to_native(Some("date-time"), &json!("yesterday")).is_err());
    }

    #[test]
    fn test_null_unknown_and_absent_formats_pass_through() {
        let registry = FormatRegistry::with_builtins();
        assert_eq!(registry.to_native(Some("date"), &Json::Null).unwrap(), Value::Null);
        assert_eq!(registry.to_native(Some("uuid"), &json!("abc")).unwrap(), Value::from("abc"));
        assert_eq!(registry.to_wire(None, &Value::Integer(3)).unwrap(), json!(3));
    }

    #[test]
    fn test_generation_and_scoped_registration() {
        let registry = Arc::new(FormatRegistry::with_builtins());
        let start = registry.generation();
        assert!(start >= 1);

        {
            let _guard = ScopedFormat::register(
                registry.clone(),
                SwaggerFormat::new(
                    "upper",
                    |v| Ok(json!(v.as_str().unwrap_or_default().to_uppercase())),
                    |j| Ok(Value::from(j.as_str().unwrap_or_default().to_lowercase())),
                    "Upper-case text",
                )
                .with_validator(|s| s.chars().all(|c| !c.is_lowercase())),
            );
            assert!(registry.contains("upper"));
            assert!(registry.generation() > start);
            assert!(registry
                .string_format_checks()
                .iter()
                .any(|(name, _)| name == "upper"));
        }
        assert!(!registry.contains("upper"));

        let before = registry.generation();
        {
            let _guard = ScopedFormat::register(
                registry.clone(),
                SwaggerFormat::new("date", |_| Ok(json!("fixed")), |_| Ok(Value::Null), "override"),
            );
            assert_eq!(
                registry.to_wire(Some("date"), &Value::Integer(1)).unwrap(),
                json!("fixed")
            );
        }
        assert_eq!(registry.get("date").unwrap().description, "Calendar date (ISO-8601)");
        assert!(registry.generation() > before);
        assert!(registry.unregister("missing").is_none());
    }

    proptest! {
        #[test]
        fn date_survives_round_trip(days in 0i64..200_000) {
            let registry = FormatRegistry::with_builtins();
            let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + chrono::Duration::days(days);
            let wire = registry.to_wire(Some("date"), &Value::Date(date)).unwrap();
            prop_assert_eq!(registry.to_native(Some("date"), &wire).unwrap(), Value::Date(date));
        }

        #[test]
        fn date_time_survives_round_trip(secs in 0i64..4_000_000_000, offset_minutes in -720i32..=720) {
            let registry = FormatRegistry::with_builtins();
            let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
            let dt = offset.timestamp_opt(secs, 0).unwrap();
            let wire = registry.to_wire(Some("date-time"), &Value::DateTime(dt)).unwrap();
            prop_assert_eq!(registry.to_native(Some("date-time"), &wire).unwrap(), Value::DateTime(dt));
        }

        #[test]
        fn int32_round_trip(n in any::<i32>()) {
            let registry = FormatRegistry::with_builtins();
            let wire = registry.to_wire(Some("int32"), &Value::Integer(n.into())).unwrap();
            prop_assert_eq!(registry.to_native(Some("int32"), &wire).unwrap(), Value::Integer(n.into()));
        }
    }
}
