//! Validation of wire values against schema nodes
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::param::Param;
use crate::schema::Schema;
use crate::spec::Spec;
use serde_json::Value as Json;
use swagmap_schemas::ValidationErrors;

/// Validate a wire value against a schema fragment of `spec`
pub fn validate_schema_object(spec: &Spec, schema: &Schema, value: &Json) -> Result<()> {
    spec.validator().validate_schema_object(&schema.raw, value)?;
    Ok(())
}

/// Every violation of `value` against `schema`
pub fn collect_schema_errors(spec: &Spec, schema: &Schema, value: &Json) -> Result<ValidationErrors> {
    Ok(spec.validator().collect_schema_errors(&schema.raw, value)?)
}

/// Validate a parameter's wire value; `None` means the parameter is unset
pub fn validate_param(spec: &Spec, param: &Param, value: Option<&Json>) -> Result<()> {
    spec.validator().validate_param(&param.raw, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn spec() -> Spec {
        Spec::builder(json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string"},
                        "status": {"type": "string", "enum": ["available", "sold"], "x-nullable": true}
                    }
                }
            }
        }))
        .build()
        .unwrap()
    }

    #[test]
    fn test_references_resolve_against_the_document() {
        let spec = spec();
        let pet = spec.schema(&json!({"$ref": "#/definitions/Pet"})).unwrap();

        assert!(validate_schema_object(&spec, &pet, &json!({"name": "rex"})).is_ok());
        match validate_schema_object(&spec, &pet, &json!({"name": 1})) {
            Err(Error::Validation(e)) => assert_eq!(e.path, "/name"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_nullable_enum_accepts_null() {
        let spec = spec();
        let pet = spec.definition("Pet").unwrap().clone();
        assert!(validate_schema_object(&spec, &pet, &json!({"name": "rex", "status": null})).is_ok());
        assert!(validate_schema_object(&spec, &pet, &json!({"name": "rex", "status": "lost"})).is_err());
        assert_eq!(collect_schema_errors(&spec, &pet, &json!({"status": "lost"})).unwrap().len(), 2);
    }

    #[test]
    fn test_registered_date_format_is_checked() {
        let spec = spec();
        let date = spec.schema(&json!({"type": "string", "format": "date"})).unwrap();
        assert!(validate_schema_object(&spec, &date, &json!("2024-01-31")).is_ok());
        assert!(validate_schema_object(&spec, &date, &json!("2024-02-31")).is_err());
    }
}
