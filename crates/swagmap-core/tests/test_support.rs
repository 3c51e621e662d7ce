//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use swagmap_core::{Spec, SpecConfig};

/// A petstore document exercising models, inheritance, formats and every
/// parameter location
pub fn petstore_document() -> Value {
    json!({
        "swagger": "2.0",
        "info": {"title": "Petstore", "version": "1.0.0"},
        "basePath": "/v1",
        "consumes": ["application/json"],
        "produces": ["application/json"],
        "securityDefinitions": {
            "api_key": {"type": "apiKey", "name": "X-Api-Key", "in": "header"}
        },
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "tags": ["pets"],
                    "parameters": [
                        {"name": "limit", "in": "query", "type": "integer", "format": "int32", "default": 20},
                        {
                            "name": "tags",
                            "in": "query",
                            "type": "array",
                            "items": {"type": "string"},
                            "collectionFormat": "pipes"
                        },
                        {"name": "since", "in": "query", "type": "string", "format": "date"}
                    ],
                    "responses": {
                        "200": {
                            "description": "pets",
                            "schema": {"type": "array", "items": {"$ref": "#/definitions/Pet"}},
                            "headers": {"X-Next": {"type": "string"}}
                        }
                    }
                },
                "post": {
                    "operationId": "addPet",
                    "tags": ["pets"],
                    "security": [{"api_key": []}],
                    "parameters": [
                        {"name": "body", "in": "body", "required": true, "schema": {"$ref": "#/definitions/Pet"}}
                    ],
                    "responses": {
                        "201": {"description": "created", "schema": {"$ref": "#/definitions/Pet"}},
                        "default": {"description": "error", "schema": {"$ref": "#/definitions/Error"}}
                    }
                }
            },
            "/pets/{petId}": {
                "parameters": [
                    {"name": "petId", "in": "path", "required": true, "type": "string"}
                ],
                "get": {
                    "operationId": "getPet",
                    "tags": ["pets"],
                    "parameters": [
                        {"name": "X-Request-Id", "in": "header", "required": true, "type": "string"}
                    ],
                    "responses": {
                        "200": {"description": "pet", "schema": {"$ref": "#/definitions/Pet"}},
                        "404": {"description": "missing"}
                    }
                }
            }
        },
        "definitions": {
            "Pet": {
                "type": "object",
                "required": ["name", "petType"],
                "discriminator": "petType",
                "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "name": {"type": "string"},
                    "petType": {"type": "string"},
                    "birthday": {"type": "string", "format": "date"},
                    "owner": {"$ref": "#/definitions/Person"}
                }
            },
            "Dog": {
                "allOf": [
                    {"$ref": "#/definitions/Pet"},
                    {
                        "type": "object",
                        "properties": {"barks": {"type": "boolean", "default": true}}
                    }
                ]
            },
            "Cat": {
                "allOf": [
                    {"$ref": "#/definitions/Pet"},
                    {"type": "object", "properties": {"lives": {"type": "integer"}}}
                ]
            },
            "Person": {
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "seen": {"type": "string", "format": "date-time", "x-nullable": true},
                    "friends": {"type": "array", "items": {"$ref": "#/definitions/Person"}}
                }
            },
            "Error": {
                "type": "object",
                "properties": {"code": {"type": "integer"}, "message": {"type": "string"}}
            }
        }
    })
}

pub fn petstore() -> Spec {
    Spec::builder(petstore_document())
        .build()
        .expect("petstore document should build")
}

pub fn petstore_with(config: SpecConfig) -> Spec {
    Spec::builder(petstore_document())
        .config(config)
        .build()
        .expect("petstore document should build")
}
