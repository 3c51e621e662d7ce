//! Integration tests: multi-file documents loaded, bundled and validated

use serde_json::json;
use std::fs;
use std::path::Path;
use swagmap_schemas::{
    DocumentLoader, LoaderConfig, LoaderError, SchemaValidator, SwaggerDocumentValidator,
    SwaggerValidator,
};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn petstore(dir: &Path) {
    write(
        dir,
        "api.yaml",
        r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
basePath: /v1
paths:
  /pets:
    get:
      operationId: listPets
      parameters:
        - name: status
          in: query
          type: array
          collectionFormat: csv
          items:
            type: string
          enum: [available, pending, sold]
      responses:
        "200":
          description: pets
          schema:
            type: array
            items:
              $ref: "models/pet.yaml#/Pet"
definitions:
  Error:
    type: object
    required: [code]
    properties:
      code:
        type: integer
        format: int32
"##,
    );
    write(
        dir,
        "models/pet.yaml",
        r##"
Pet:
  type: object
  required: [name]
  properties:
    name:
      type: string
    category:
      $ref: "#/Category"
    nickname:
      type: string
      x-nullable: true
Category:
  type: object
  properties:
    id:
      type: integer
"##,
    );
}

#[test]
fn bundled_document_passes_document_rules() {
    let dir = tempdir().unwrap();
    petstore(dir.path());

    let mut loader = DocumentLoader::new();
    let document = loader.load(&dir.path().join("api.yaml")).unwrap();

    assert!(document["x-bundled"]["models_pet.yaml"].is_object());
    let errors = SwaggerDocumentValidator::new().collect_errors(&document);
    assert!(errors.is_empty(), "unexpected errors: {errors}");
}

#[test]
fn bundled_schemas_validate_values() {
    let dir = tempdir().unwrap();
    petstore(dir.path());

    let document = DocumentLoader::new()
        .load(&dir.path().join("api.yaml"))
        .unwrap();
    let validator = SwaggerValidator::new(&document);
    let response_schema = &document["paths"]["/pets"]["get"]["responses"]["200"]["schema"];

    let good = json!([
        {"name": "rex", "category": {"id": 1}, "nickname": null},
        {"name": "tom"}
    ]);
    assert!(validator.validate_schema_object(response_schema, &good).is_ok());

    let bad = json!([{"name": "rex", "category": {"id": "one"}}]);
    let err = validator
        .validate_schema_object(response_schema, &bad)
        .unwrap_err();
    assert_eq!(err.path, "/0/category/id");
}

#[test]
fn multi_value_parameter_enum_applies_per_element() {
    let dir = tempdir().unwrap();
    petstore(dir.path());

    let document = DocumentLoader::new()
        .load(&dir.path().join("api.yaml"))
        .unwrap();
    let validator = SwaggerValidator::new(&document);
    let param = &document["paths"]["/pets"]["get"]["parameters"][0];

    assert!(validator
        .validate_param(param, Some(&json!(["available", "sold"])))
        .is_ok());
    assert!(validator.validate_param(param, Some(&json!(["gone"]))).is_err());
    assert!(validator.validate_param(param, None).is_ok());
}

#[test]
fn bundling_can_be_disabled() {
    let dir = tempdir().unwrap();
    petstore(dir.path());

    let mut loader = DocumentLoader::with_config(LoaderConfig {
        bundle_external_refs: false,
        ..LoaderConfig::default()
    });
    let document = loader.load(&dir.path().join("api.yaml")).unwrap();
    assert!(document.get("x-bundled").is_none());

    // the external reference is left in place and reported as non-local
    let errors = SwaggerDocumentValidator::new().collect_errors(&document);
    assert_eq!(errors.len(), 1);
}

#[test]
fn missing_external_file_is_a_loader_error() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "api.json",
        r#"{"swagger": "2.0", "definitions": {"Pet": {"$ref": "missing.json#/Pet"}}}"#,
    );

    let result = DocumentLoader::new().load(&dir.path().join("api.json"));
    assert!(matches!(result, Err(LoaderError::IoError { .. })));
}
