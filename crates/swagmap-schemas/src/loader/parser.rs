//! Document parsing for YAML and JSON formats
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use serde_json::Value;
use std::path::Path;

/// The only document version this crate loads
pub const SWAGGER_VERSION: &str = "2.0";

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl Format {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> LoaderResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(LoaderError::unsupported_format(path.to_path_buf())),
        }
    }
}

/// Parser turning YAML or JSON text into a `serde_json::Value` tree
#[derive(Debug, Default)]
pub struct DocumentParser;

impl DocumentParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a file, detecting format from its extension
    pub fn parse_file(&self, path: &Path) -> LoaderResult<Value> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoaderError::io_error(path.to_path_buf(), e))?;

        self.parse_content(&content, format, path)
    }

    /// Parse content with an explicit format
    pub fn parse_content(&self, content: &str, format: Format, path: &Path) -> LoaderResult<Value> {
        match format {
            Format::Yaml => self.parse_yaml(content, path),
            Format::Json => self.parse_json(content, path),
        }
    }

    /// Parse YAML content
    pub fn parse_yaml(&self, content: &str, path: &Path) -> LoaderResult<Value> {
        let yaml_value: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| LoaderError::yaml_parse_error(path.to_path_buf(), e))?;

        // Swagger documents are JSON-compatible; YAML-only constructs fail here
        serde_json::to_value(yaml_value)
            .map_err(|e| LoaderError::json_parse_error(path.to_path_buf(), e))
    }

    /// Parse JSON content
    pub fn parse_json(&self, content: &str, path: &Path) -> LoaderResult<Value> {
        serde_json::from_str(content).map_err(|e| LoaderError::json_parse_error(path.to_path_buf(), e))
    }

    /// Parse content whose format is unknown, trying JSON before YAML
    pub fn parse_with_fallback(&self, content: &str, path: &Path) -> LoaderResult<(Value, Format)> {
        if let Ok(format) = Format::from_path(path) {
            if let Ok(value) = self.parse_content(content, format, path) {
                return Ok((value, format));
            }
        }

        if let Ok(value) = self.parse_json(content, path) {
            return Ok((value, Format::Json));
        }

        if let Ok(value) = self.parse_yaml(content, path) {
            return Ok((value, Format::Yaml));
        }

        Err(LoaderError::unsupported_format(path.to_path_buf()))
    }

    /// Check the root of a Swagger document: an object declaring `swagger: "2.0"`
    pub fn validate_basic_structure(&self, value: &Value, path: &Path) -> LoaderResult<()> {
        let obj = value.as_object().ok_or_else(|| {
            LoaderError::validation_error(
                path.to_path_buf(),
                "Document must be a JSON object at the root level",
            )
        })?;

        match obj.get("swagger") {
            None => Err(LoaderError::validation_error(
                path.to_path_buf(),
                "Document must contain a 'swagger' field",
            )),
            Some(Value::String(version)) if version == SWAGGER_VERSION => Ok(()),
            Some(other) => Err(LoaderError::UnsupportedVersion {
                version: other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
                path: path.to_path_buf(),
            }),
        }
    }

    /// Serialize a value back to text
    pub fn serialize(&self, value: &Value, format: Format, path: &Path) -> LoaderResult<String> {
        match format {
            Format::Json => serde_json::to_string_pretty(value)
                .map_err(|e| LoaderError::json_parse_error(path.to_path_buf(), e)),
            Format::Yaml => serde_yaml::to_string(value)
                .map_err(|e| LoaderError::yaml_parse_error(path.to_path_buf(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path(Path::new("api.yaml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("api.YML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("api.json")).unwrap(), Format::Json);

        assert!(Format::from_path(Path::new("api.txt")).is_err());
        assert!(Format::from_path(Path::new("api")).is_err());
    }

    #[test]
    fn test_yaml_parsing() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("api.yaml");
        fs::write(
            &file_path,
            r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0"
paths: {}
definitions:
  Pet:
    type: object
    properties:
      name:
        type: string
"##,
        )?;

        let result = DocumentParser::new().parse_file(&file_path)?;
        assert_eq!(result["swagger"], "2.0");
        assert_eq!(result["definitions"]["Pet"]["properties"]["name"]["type"], "string");
        Ok(())
    }

    #[test]
    fn test_json_parsing() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("api.json");
        fs::write(&file_path, r#"{"swagger": "2.0", "paths": {}}"#)?;

        let result = DocumentParser::new().parse_file(&file_path)?;
        assert_eq!(result["swagger"], "2.0");
        Ok(())
    }

    #[test]
    fn test_basic_validation() {
        let parser = DocumentParser::new();
        let path = Path::new("api.yaml");

        assert!(parser
            .validate_basic_structure(&json!({"swagger": "2.0", "paths": {}}), path)
            .is_ok());
        assert!(parser.validate_basic_structure(&json!("not an object"), path).is_err());
        assert!(parser.validate_basic_structure(&json!({"paths": {}}), path).is_err());
        assert!(matches!(
            parser.validate_basic_structure(&json!({"openapi": "3.0.0", "swagger": "3.0"}), path),
            Err(LoaderError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_fallback_parsing() -> LoaderResult<()> {
        let parser = DocumentParser::new();

        let (value, format) =
            parser.parse_with_fallback(r#"{"swagger": "2.0"}"#, Path::new("unknown.txt"))?;
        assert_eq!(format, Format::Json);
        assert_eq!(value["swagger"], "2.0");

        let (value, format) =
            parser.parse_with_fallback("swagger: '2.0'\nbasePath: /v1", Path::new("unknown.txt"))?;
        assert_eq!(format, Format::Yaml);
        assert_eq!(value["basePath"], "/v1");
        Ok(())
    }

    #[test]
    fn test_serialization() -> LoaderResult<()> {
        let parser = DocumentParser::new();
        let value = json!({"swagger": "2.0", "schemes": ["https"]});
        let path = Path::new("api.json");

        let json_str = parser.serialize(&value, Format::Json, path)?;
        assert!(json_str.contains("\"swagger\": \"2.0\""));

        let yaml_str = parser.serialize(&value, Format::Yaml, path)?;
        assert!(yaml_str.contains("swagger: '2.0'"));
        Ok(())
    }
}
