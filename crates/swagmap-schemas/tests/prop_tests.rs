//! Property-based tests for the Swagger dialect translation
//!
//! These tests check the translation invariants over generated schemas
//! and instances rather than fixed examples.

use proptest::prelude::*;
use serde_json::{json, Value};
use swagmap_schemas::{translate_schema, SwaggerValidator};

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 10, 5, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            proptest::collection::hash_map("[a-z_]{1,10}", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn primitive_type_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("string"), Just("integer"), Just("number"), Just("boolean")]
}

proptest! {
    #[test]
    fn nullable_schemas_accept_null(type_name in primitive_type_strategy()) {
        let validator = SwaggerValidator::new(&json!({}));
        let schema = json!({"type": type_name, "x-nullable": true});
        prop_assert!(validator.validate_schema_object(&schema, &Value::Null).is_ok());

        let strict = json!({"type": type_name});
        prop_assert!(validator.validate_schema_object(&strict, &Value::Null).is_err());
    }

    #[test]
    fn file_and_untyped_schemas_accept_anything(instance in json_value_strategy()) {
        let validator = SwaggerValidator::new(&json!({}));
        let file = json!({"type": "file"});
        let untyped = json!({});
        prop_assert!(validator.validate_schema_object(&file, &instance).is_ok());
        prop_assert!(validator.validate_schema_object(&untyped, &instance).is_ok());
    }

    #[test]
    fn array_enum_checks_each_element(
        choices in proptest::collection::btree_set("[a-z]{1,6}", 1..5),
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let choices: Vec<String> = choices.into_iter().collect();
        let instance: Vec<String> = picks.iter().map(|i| choices[i.index(choices.len())].clone()).collect();

        let validator = SwaggerValidator::new(&json!({}));
        let schema = json!({"type": "array", "items": {"type": "string"}, "enum": choices});
        prop_assert!(validator.validate_schema_object(&schema, &json!(instance)).is_ok());

        let mut with_stranger = instance.clone();
        with_stranger.push("UNLISTED".to_string());
        prop_assert!(validator.validate_schema_object(&schema, &json!(with_stranger)).is_err());
    }

    #[test]
    fn translation_is_idempotent(instance in json_value_strategy()) {
        let schema = json!({
            "type": "object",
            "x-nullable": true,
            "properties": {"a": {"type": "array", "items": {"type": "string"}, "enum": ["x"]}},
            "default": instance
        });
        let once = translate_schema(&schema);
        prop_assert_eq!(translate_schema(&once), once);
    }
}
