//! Structural rules for whole Swagger 2.0 documents
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::loader::ReferenceValidator;
use crate::validation::base::{SchemaValidator, ValidationContext, ValidationHelpers, ValidationMode};
use crate::validation::error::{ValidationError, ValidationErrors, ValidationResult};
use serde_json::Value;
use std::collections::HashMap;

const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];
const PARAM_LOCATIONS: &[&str] = &["query", "header", "path", "formData", "body"];

/// Validates the shape of a Swagger 2.0 document
///
/// - **Basic**: root object with `swagger: "2.0"`
/// - **Partial**: plus `info`, `paths`, parameter and response structure, `$ref` targets
/// - **Strict**: plus unique `operationId`s
#[derive(Debug, Default, Clone, Copy)]
pub struct SwaggerDocumentValidator;

impl SwaggerDocumentValidator {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, doc: &Value, ctx: &ValidationContext, errors: &mut ValidationErrors) {
        if !doc.is_object() {
            errors.add(ValidationError::with_violations(
                &ctx.path,
                "Swagger document must be an object",
                vec![ValidationError::create_violation(
                    "root_type",
                    "object",
                    ValidationHelpers::type_name(doc),
                )],
            ));
            return;
        }

        match doc.get("swagger") {
            Some(Value::String(version)) if version == crate::loader::SWAGGER_VERSION => {}
            other => errors.add(ValidationError::with_violations(
                &ctx.child("swagger").path,
                "Unsupported or missing swagger version",
                vec![ValidationError::create_violation(
                    "swagger_version",
                    "\"2.0\"",
                    other.map(Value::to_string).unwrap_or_else(|| "nothing".to_string()),
                )],
            )),
        }

        if ctx.mode == ValidationMode::Basic {
            return;
        }

        self.check_info(doc, ctx, errors);
        for section in ["definitions", "parameters", "responses", "securityDefinitions"] {
            if let Err(e) = ValidationHelpers::validate_object_field(doc, section, ctx) {
                errors.add(e);
            }
        }
        self.check_definitions(doc, &ctx.child("definitions"), errors);
        if let Some(Value::Object(params)) = doc.get("parameters") {
            let params_ctx = ctx.child("parameters");
            for (name, param) in params {
                self.check_parameter(param, &params_ctx.child(name), errors);
            }
        }
        self.check_paths(doc, ctx, errors);
        self.check_references(doc, ctx, errors);
    }

    fn check_info(&self, doc: &Value, ctx: &ValidationContext, errors: &mut ValidationErrors) {
        if let Err(e) = ValidationHelpers::validate_required_field(doc, "info", ctx) {
            errors.add(e);
            return;
        }
        let info_ctx = ctx.child("info");
        let info = &doc["info"];
        for field in ["title", "version"] {
            if let Err(e) = ValidationHelpers::validate_required_field(info, field, &info_ctx) {
                errors.add(e);
            }
        }
    }

    fn check_definitions(&self, doc: &Value, ctx: &ValidationContext, errors: &mut ValidationErrors) {
        let Some(Value::Object(definitions)) = doc.get("definitions") else {
            return;
        };
        for (name, definition) in definitions {
            if !definition.is_object() {
                errors.add(ValidationError::with_violations(
                    &ctx.child(name).path,
                    format!("Definition '{name}' must be a schema object"),
                    vec![ValidationError::create_violation(
                        "definition_type",
                        "object",
                        ValidationHelpers::type_name(definition),
                    )],
                ));
            }
        }
    }

    fn check_paths(&self, doc: &Value, ctx: &ValidationContext, errors: &mut ValidationErrors) {
        if let Err(e) = ValidationHelpers::validate_required_field(doc, "paths", ctx) {
            errors.add(e);
            return;
        }
        let paths_ctx = ctx.child("paths");
        let Some(paths) = doc["paths"].as_object() else {
            if let Err(e) = ValidationHelpers::validate_object_field(doc, "paths", ctx) {
                errors.add(e);
            }
            return;
        };

        let mut operation_ids: HashMap<&str, String> = HashMap::new();

        for (path_name, path_item) in paths {
            let path_ctx = paths_ctx.child(path_name);
            if path_name.starts_with("x-") {
                continue;
            }
            if let Err(e) = ValidationHelpers::validate_path_template(path_name, &path_ctx) {
                errors.add(e);
            }
            self.check_parameter_list(path_item.get("parameters"), &path_ctx.child("parameters"), errors);

            for method in HTTP_METHODS {
                let Some(operation) = path_item.get(*method) else {
                    continue;
                };
                let op_ctx = path_ctx.child(method);
                self.check_parameter_list(operation.get("parameters"), &op_ctx.child("parameters"), errors);

                match operation.get("responses") {
                    Some(Value::Object(responses)) if !responses.is_empty() => {}
                    _ => errors.add(ValidationError::with_violations(
                        &op_ctx.child("responses").path,
                        "Operation must declare at least one response",
                        vec![ValidationError::create_violation(
                            "operation_responses",
                            "non-empty responses object",
                            "nothing",
                        )],
                    )),
                }

                if ctx.is_strict() {
                    if let Some(id) = operation.get("operationId").and_then(Value::as_str) {
                        if let Some(first) = operation_ids.insert(id, op_ctx.path.clone()) {
                            errors.add(ValidationError::with_violations(
                                &op_ctx.child("operationId").path,
                                format!("Duplicate operationId '{id}'"),
                                vec![ValidationError::create_violation(
                                    "unique_operation_id",
                                    "unique operationId",
                                    format!("also used at {first}"),
                                )],
                            ));
                        }
                    }
                }
            }
        }
    }

    fn check_parameter_list(&self, params: Option<&Value>, ctx: &ValidationContext, errors: &mut ValidationErrors) {
        match params {
            None => {}
            Some(Value::Array(list)) => {
                for (index, param) in list.iter().enumerate() {
                    // references are checked by check_references
                    if param.get("$ref").is_none() {
                        self.check_parameter(param, &ctx.child_index(index), errors);
                    }
                }
            }
            Some(other) => errors.add(ValidationError::with_violations(
                &ctx.path,
                "Parameters must be a list",
                vec![ValidationError::create_violation(
                    "parameter_list",
                    "array",
                    ValidationHelpers::type_name(other),
                )],
            )),
        }
    }

    fn check_parameter(&self, param: &Value, ctx: &ValidationContext, errors: &mut ValidationErrors) {
        for field in ["name", "in"] {
            if let Err(e) = ValidationHelpers::validate_required_field(param, field, ctx) {
                errors.add(e);
            }
        }
        let Some(location) = param.get("in").and_then(Value::as_str) else {
            return;
        };
        if let Err(e) = ValidationHelpers::validate_enum_value(location, PARAM_LOCATIONS, "in", &ctx.child("in")) {
            errors.add(e);
            return;
        }

        let result = if location == "body" {
            ValidationHelpers::validate_required_field(param, "schema", ctx)
        } else {
            ValidationHelpers::validate_required_field(param, "type", ctx)
        };
        if let Err(e) = result {
            errors.add(e);
        }

        if location == "path" && param.get("required").and_then(Value::as_bool) != Some(true) {
            errors.add(ValidationError::with_violations(
                &ctx.child("required").path,
                "Path parameters must be required",
                vec![ValidationError::create_violation("path_required", "true", "false")],
            ));
        }
    }

    fn check_references(&self, doc: &Value, ctx: &ValidationContext, errors: &mut ValidationErrors) {
        let mut references: Vec<String> = ReferenceValidator::extract_references(doc).into_iter().collect();
        references.sort();
        for reference in references {
            if let Err(e) = ValidationHelpers::validate_local_reference(doc, &reference, ctx) {
                errors.add(e);
            }
        }
    }
}

impl SchemaValidator for SwaggerDocumentValidator {
    type Input = Value;

    fn validate_with_context(&self, input: &Value, context: &ValidationContext) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        self.check(input, context, &mut errors);
        errors.into_first()
    }

    fn collect_errors(&self, input: &Value) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        self.check(input, &ValidationContext::new(ValidationMode::Strict), &mut errors);
        errors
    }
}
