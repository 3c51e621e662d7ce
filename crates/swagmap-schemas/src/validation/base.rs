//! Validator trait, validation context and shared rule helpers
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::{ValidationError, ValidationErrors, ValidationResult};
use serde_json::Value;

/// How much of a rule set to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every rule, including cross-document consistency checks
    Strict,
    /// Structural rules without cross-document consistency checks
    Partial,
    /// Root-level shape only
    Basic,
}

/// Location and mode of an in-progress validation
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub path: String,
    pub mode: ValidationMode,
}

impl ValidationContext {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            path: "$".to_string(),
            mode,
        }
    }

    /// Child context for an object member
    pub fn child<P: AsRef<str>>(&self, path_segment: P) -> Self {
        let segment = path_segment.as_ref();
        // path keys such as "/pets/{id}" are quoted to keep the path readable
        let segment = if segment.contains(['.', '/', '{', '[']) {
            format!("['{segment}']")
        } else {
            format!(".{segment}")
        };

        Self {
            path: format!("{}{}", self.path, segment),
            mode: self.mode,
        }
    }

    /// Child context for an array element
    pub fn child_index(&self, index: usize) -> Self {
        Self {
            path: format!("{}[{}]", self.path, index),
            mode: self.mode,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.mode == ValidationMode::Strict
    }
}

/// A validator over some input type, run in one of the [`ValidationMode`]s
pub trait SchemaValidator {
    type Input;

    /// Validate with every rule
    fn validate(&self, input: &Self::Input) -> ValidationResult<()> {
        let context = ValidationContext::new(ValidationMode::Strict);
        self.validate_with_context(input, &context)
    }

    fn validate_with_context(
        &self,
        input: &Self::Input,
        context: &ValidationContext,
    ) -> ValidationResult<()>;

    fn validate_partial(&self, input: &Self::Input) -> ValidationResult<()> {
        let context = ValidationContext::new(ValidationMode::Partial);
        self.validate_with_context(input, &context)
    }

    fn validate_basic(&self, input: &Self::Input) -> ValidationResult<()> {
        let context = ValidationContext::new(ValidationMode::Basic);
        self.validate_with_context(input, &context)
    }

    /// Collect failures without stopping at the first one
    fn collect_errors(&self, input: &Self::Input) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Err(error) = self.validate(input) {
            errors.add(error);
        }
        errors
    }
}

/// Helpers for rules shared by the document validators
pub struct ValidationHelpers;

impl ValidationHelpers {
    /// Require a member to be present
    pub fn validate_required_field(
        parent: &Value,
        field_name: &str,
        context: &ValidationContext,
    ) -> ValidationResult<()> {
        match parent.get(field_name) {
            Some(_) => Ok(()),
            None => Err(ValidationError::with_violations(
                &context.path,
                format!("Missing required field '{field_name}'"),
                vec![ValidationError::create_violation(
                    "required_field",
                    format!("'{field_name}' to be present"),
                    "field is missing",
                )],
            )),
        }
    }

    /// Require a member, when present, to be a JSON object
    pub fn validate_object_field(
        parent: &Value,
        field_name: &str,
        context: &ValidationContext,
    ) -> ValidationResult<()> {
        match parent.get(field_name) {
            None | Some(Value::Object(_)) => Ok(()),
            Some(other) => Err(ValidationError::with_violations(
                &context.child(field_name).path,
                format!("'{field_name}' must be an object"),
                vec![ValidationError::create_violation(
                    "object_field",
                    "object",
                    Self::type_name(other),
                )],
            )),
        }
    }

    /// Require a string to be one of a fixed set
    pub fn validate_enum_value(
        value: &str,
        allowed_values: &[&str],
        field_name: &str,
        context: &ValidationContext,
    ) -> ValidationResult<()> {
        if allowed_values.contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::with_violations(
                &context.path,
                format!("Invalid value for {field_name}: {value}"),
                vec![ValidationError::create_violation(
                    "enum_value",
                    format!("one of: {}", allowed_values.join(", ")),
                    value,
                )],
            ))
        }
    }

    /// Require a path template to begin with `/`
    pub fn validate_path_template(path: &str, context: &ValidationContext) -> ValidationResult<()> {
        if path.starts_with('/') {
            Ok(())
        } else {
            Err(ValidationError::with_violations(
                &context.path,
                format!("Path '{path}' must begin with '/'"),
                vec![ValidationError::create_violation(
                    "path_template",
                    "path beginning with '/'",
                    path,
                )],
            ))
        }
    }

    /// Require a local `$ref` to point at an existing node of `document`
    pub fn validate_local_reference(
        document: &Value,
        reference: &str,
        context: &ValidationContext,
    ) -> ValidationResult<()> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(ValidationError::with_violations(
                &context.path,
                format!("Reference '{reference}' is not local to the document"),
                vec![ValidationError::create_violation(
                    "local_reference",
                    "reference beginning with '#'",
                    reference,
                )],
            ));
        };

        if document.pointer(pointer).is_some() {
            Ok(())
        } else {
            Err(ValidationError::with_violations(
                &context.path,
                format!("Unresolvable reference '{reference}'"),
                vec![ValidationError::create_violation(
                    "local_reference",
                    "existing target",
                    reference,
                )],
            ))
        }
    }

    /// JSON type name used in violation messages
    pub fn type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_context_child() {
        let context = ValidationContext::new(ValidationMode::Strict);
        let child = context.child("info");
        assert_eq!(child.path, "$.info");
        assert_eq!(child.child("title").path, "$.info.title");
    }

    #[test]
    fn test_path_segments_are_quoted() {
        let context = ValidationContext::new(ValidationMode::Strict).child("paths");
        assert_eq!(context.child("/pets/{id}").path, "$.paths['/pets/{id}']");
        assert_eq!(context.child("/pets").child("get").child_index(0).path, "$.paths['/pets'].get[0]");
    }

    #[test]
    fn test_required_and_object_fields() {
        let context = ValidationContext::new(ValidationMode::Strict);
        let doc = json!({"info": {"title": "t"}, "paths": []});

        assert!(ValidationHelpers::validate_required_field(&doc, "info", &context).is_ok());
        assert!(ValidationHelpers::validate_required_field(&doc, "definitions", &context).is_err());
        assert!(ValidationHelpers::validate_object_field(&doc, "info", &context).is_ok());

        let err = ValidationHelpers::validate_object_field(&doc, "paths", &context).unwrap_err();
        assert_eq!(err.path, "$.paths");
        assert_eq!(err.schema_violations[0].actual, "array");
    }

    #[test]
    fn test_enum_and_path_template() {
        let context = ValidationContext::new(ValidationMode::Strict);
        let locations = ["query", "header", "path", "formData", "body"];
        assert!(ValidationHelpers::validate_enum_value("query", &locations, "in", &context).is_ok());
        assert!(ValidationHelpers::validate_enum_value("cookie", &locations, "in", &context).is_err());

        assert!(ValidationHelpers::validate_path_template("/pets", &context).is_ok());
        assert!(ValidationHelpers::validate_path_template("pets", &context).is_err());
    }

    #[test]
    fn test_local_reference() {
        let context = ValidationContext::new(ValidationMode::Strict);
        let doc = json!({"definitions": {"Pet": {"type": "object"}}});

        assert!(ValidationHelpers::validate_local_reference(&doc, "#/definitions/Pet", &context).is_ok());
        assert!(ValidationHelpers::validate_local_reference(&doc, "#/definitions/Cat", &context).is_err());
        assert!(ValidationHelpers::validate_local_reference(&doc, "other.yaml#/Pet", &context).is_err());
    }
}
