//! End-to-end request and response flows against a petstore document

mod test_support;

use chrono::NaiveDate;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::json;
use swagmap_core::{
    marshal_model, marshal_request, marshal_response_body, unmarshal_model, unmarshal_request,
    unmarshal_response, Error, Model, RequestData, ResponseData, SpecConfig, Value,
};

#[test]
fn test_spec_discovers_models_and_operations() {
    let spec = test_support::petstore();

    let names: Vec<&str> = spec.models().keys().map(String::as_str).collect();
    assert_eq!(names, ["Pet", "Dog", "Cat", "Person", "Error"]);
    assert!(spec.model("Dog").unwrap().inherits("Pet"));
    assert!(spec.model("Pet").unwrap().subtype_for("Cat").is_some());

    let ids: Vec<&str> = spec.operations().keys().map(String::as_str).collect();
    assert_eq!(ids, ["listPets", "addPet", "getPet"]);
    assert_eq!(spec.resource("pets").unwrap().operations.len(), 3);

    let get_pet = spec.operation("getPet").unwrap();
    let params: Vec<&str> = get_pet.params.keys().map(String::as_str).collect();
    assert_eq!(params, ["petId", "X-Request-Id"]);
}

#[test]
fn test_server_side_query_parameters() {
    let spec = test_support::petstore();
    let list_pets = spec.operation("listPets").unwrap();

    let request = RequestData::new()
        .with_query("tags", "small|brown")
        .with_query("since", "2024-01-02");
    let values = unmarshal_request(&spec, &request, list_pets).unwrap();

    assert_eq!(values["limit"], Value::Integer(20));
    assert_eq!(
        values["tags"],
        Value::Array(vec![Value::from("small"), Value::from("brown")])
    );
    assert_eq!(
        values["since"],
        Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
    );
}

#[test]
fn test_server_side_rejects_bad_requests() {
    let spec = test_support::petstore();
    let get_pet = spec.operation("getPet").unwrap();

    let missing_header = RequestData::new().with_path("petId", "rex");
    let err = unmarshal_request(&spec, &missing_header, get_pet).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("X-Request-Id"));

    let list_pets = spec.operation("listPets").unwrap();
    let out_of_range = RequestData::new().with_query("limit", "99999999999");
    assert!(unmarshal_request(&spec, &out_of_range, list_pets).is_err());
}

#[test]
fn test_body_dispatches_on_discriminator() {
    let spec = test_support::petstore();
    let add_pet = spec.operation("addPet").unwrap();

    let request = RequestData::new().with_body(json!({
        "name": "rex",
        "petType": "Dog",
        "owner": {"name": "ann", "friends": [{"name": "bob"}]}
    }));
    let values = unmarshal_request(&spec, &request, add_pet).unwrap();
    let dog = values["body"].as_model().unwrap();

    assert_eq!(dog.name(), "Dog");
    assert_eq!(dog.get("barks"), Some(&Value::Bool(true)));
    assert_eq!(dog.get("id"), Some(&Value::Null));

    let owner = dog.get("owner").and_then(Value::as_model).unwrap();
    assert_eq!(owner.name(), "Person");
    let friends = owner.get("friends").and_then(Value::as_array).unwrap();
    assert_eq!(friends[0].as_model().unwrap().name(), "Person");
}

#[test]
fn test_client_side_request_assembly() {
    let spec = test_support::petstore();

    let mut values = IndexMap::new();
    values.insert("petId".to_string(), Value::from("rex the dog"));
    values.insert("X-Request-Id".to_string(), Value::from("abc"));
    let request = marshal_request(&spec, spec.operation("getPet").unwrap(), &values).unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/pets/rex%20the%20dog");
    assert_eq!(request.header("x-request-id").map(String::as_str), Some("abc"));

    let mut values = IndexMap::new();
    values.insert(
        "tags".to_string(),
        Value::Array(vec![Value::from("a"), Value::from("b")]),
    );
    values.insert(
        "since".to_string(),
        Value::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()),
    );
    let request = marshal_request(&spec, spec.operation("listPets").unwrap(), &values).unwrap();
    assert_eq!(request.query_values("tags"), ["a|b"]);
    assert_eq!(request.query_values("since"), ["2024-05-06"]);
    assert_eq!(request.query_values("limit"), ["20"]);

    let mut unknown = IndexMap::new();
    unknown.insert("nope".to_string(), Value::Null);
    let err = marshal_request(&spec, spec.operation("listPets").unwrap(), &unknown).unwrap_err();
    assert!(err.is_mapping());
}

#[test]
fn test_client_side_response_handling() {
    let spec = test_support::petstore();
    let list_pets = spec.operation("listPets").unwrap();

    let response = ResponseData::json(
        200,
        json!([
            {"name": "rex", "petType": "Dog", "barks": false},
            {"name": "tom", "petType": "Cat", "lives": 9, "birthday": "2019-07-01"}
        ]),
    )
    .with_header("X-Next", "page-2");
    let unmarshaled = unmarshal_response(&spec, &response, list_pets).unwrap();

    let pets = unmarshaled.result.as_array().unwrap();
    assert_eq!(pets[0].as_model().unwrap().name(), "Dog");
    assert_eq!(pets[0].as_model().unwrap().get("barks"), Some(&Value::Bool(false)));
    let cat = pets[1].as_model().unwrap();
    assert_eq!(cat.name(), "Cat");
    assert_eq!(cat.get("lives"), Some(&Value::Integer(9)));
    assert!(matches!(cat.get("birthday"), Some(Value::Date(_))));
    assert_eq!(unmarshaled.headers["X-Next"], Value::from("page-2"));

    let get_pet = spec.operation("getPet").unwrap();
    let missing = unmarshal_response(&spec, &ResponseData::empty(404), get_pet).unwrap();
    assert_eq!(missing.result, Value::Null);

    match unmarshal_response(&spec, &ResponseData::empty(500), get_pet) {
        Err(Error::MatchingResponseNotFound { status_code, .. }) => assert_eq!(status_code, 500),
        other => panic!("expected MatchingResponseNotFound, got {other:?}"),
    }
}

#[test]
fn test_unknown_discriminator_value_is_rejected() {
    let spec = test_support::petstore();
    let err = unmarshal_model(&spec, "Pet", &json!({"name": "x", "petType": "Fish"})).unwrap_err();
    assert!(err.is_mapping());
    assert!(err.to_string().contains("Fish"));
}

#[test]
fn test_server_side_response_marshaling() {
    let spec = test_support::petstore();
    let add_pet = spec.operation("addPet").unwrap();

    let dog = Model::new("Dog")
        .with("name", "rex")
        .with("petType", "Dog")
        .with("barks", true)
        .with("owner", Model::new("Person").with("name", "ann"));
    let body = marshal_response_body(&spec, add_pet, 201, &Value::Model(dog)).unwrap();
    assert_eq!(
        body,
        json!({
            "name": "rex",
            "petType": "Dog",
            "barks": true,
            "owner": {"name": "ann"}
        })
    );

    let error = Model::new("Error").with("code", 7).with("message", "nope");
    let body = marshal_response_body(&spec, add_pet, 400, &Value::Model(error)).unwrap();
    assert_eq!(body, json!({"code": 7, "message": "nope"}));
}

#[test]
fn test_models_round_trip_through_wire_json() {
    let spec = test_support::petstore();
    let wire = json!({
        "name": "ann",
        "seen": "2024-03-04T05:06:07+00:00",
        "friends": [{"name": "bob", "seen": null}]
    });

    let person = unmarshal_model(&spec, "Person", &wire).unwrap();
    assert!(matches!(person.get("seen"), Some(Value::DateTime(_))));
    assert_eq!(marshal_model(&spec, "Person", &person).unwrap(), wire);
}

#[test]
fn test_disabled_request_validation_passes_raw_values_through() {
    let spec = test_support::petstore_with(SpecConfig {
        validate_requests: false,
        ..SpecConfig::default()
    });
    let get_pet = spec.operation("getPet").unwrap();

    let request = RequestData::new().with_path("petId", "rex");
    let values = unmarshal_request(&spec, &request, get_pet).unwrap();
    assert_eq!(values["petId"], Value::from("rex"));
    assert_eq!(values["X-Request-Id"], Value::Null);
}
