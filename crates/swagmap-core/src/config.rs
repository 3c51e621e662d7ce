//! Per-spec configuration
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

const KNOWN_KEYS: &[&str] = &[
    "validate_responses",
    "validate_requests",
    "validate_swagger_spec",
    "use_models",
    "include_missing_properties",
    "default_type_to_object",
];

/// Options recognized by a loaded [`Spec`](crate::Spec)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    /// Validate response bodies and headers before unmarshaling
    pub validate_responses: bool,
    /// Validate request parameters
    pub validate_requests: bool,
    /// Run the document rules at build time
    pub validate_swagger_spec: bool,
    /// Produce [`Model`](crate::Model) instances for model-tagged schemas
    pub use_models: bool,
    /// Backfill absent declared properties with their default (or null)
    pub include_missing_properties: bool,
    /// Treat schemas without `type` as objects
    pub default_type_to_object: bool,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            validate_responses: true,
            validate_requests: true,
            validate_swagger_spec: true,
            use_models: true,
            include_missing_properties: true,
            default_type_to_object: false,
        }
    }
}

impl SpecConfig {
    /// Build from a JSON map, ignoring unknown keys with a warning
    pub fn from_json(map: &Json) -> Result<Self> {
        let Some(object) = map.as_object() else {
            return Err(Error::configuration("spec configuration must be a mapping"));
        };
        for key in object.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "ignoring unknown spec configuration option");
            }
        }
        serde_json::from_value(map.clone())
            .map_err(|e| Error::configuration(format!("invalid spec configuration: {e}")))
    }

    /// Apply `SWAGMAP_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        let overrides: [(&str, &mut bool); 4] = [
            ("SWAGMAP_VALIDATE_REQUESTS", &mut self.validate_requests),
            ("SWAGMAP_VALIDATE_RESPONSES", &mut self.validate_responses),
            ("SWAGMAP_VALIDATE_SWAGGER_SPEC", &mut self.validate_swagger_spec),
            ("SWAGMAP_USE_MODELS", &mut self.use_models),
        ];
        for (name, slot) in overrides {
            if let Ok(raw) = std::env::var(name) {
                match parse_flag(&raw) {
                    Some(flag) => *slot = flag,
                    None => tracing::warn!(variable = name, value = %raw, "ignoring non-boolean override"),
                }
            }
        }
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = SpecConfig::default();
        assert!(config.validate_requests && config.validate_responses);
        assert!(config.use_models && config.include_missing_properties);
        assert!(!config.default_type_to_object);
    }

    #[test]
    fn test_from_json_partial_and_unknown() {
        let config = SpecConfig::from_json(&json!({"use_models": false, "bogus": 1})).unwrap();
        assert!(!config.use_models);
        assert!(config.validate_swagger_spec);

        assert!(SpecConfig::from_json(&json!([])).is_err());
        assert!(SpecConfig::from_json(&json!({"use_models": "maybe"})).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("sometimes"), None);
    }
}
