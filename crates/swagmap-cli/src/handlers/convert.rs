//! Marshal and unmarshal command handlers

use super::utils::{find_definition, load_spec, read_payload, save_output};
use crate::cli::{ConvertArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde_json::{Map, Value as Json};
use swagmap_core::{
    collect_schema_errors, marshal_schema_object, unmarshal_schema_object, Schema, Spec, Value,
};
use tracing::{debug, instrument};

/// Key naming the model of an unmarshaled object in rendered output
const MODEL_KEY: &str = "$model";

/// Wire JSON in, typed values out
#[instrument(skip(config, output), fields(file = %args.spec.display(), definition = %args.definition))]
pub fn handle_unmarshal(args: ConvertArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let spec = load_spec(&args.spec, config.spec.clone(), output)?;
    let schema = find_definition(&spec, &args.definition)?;
    let payload = read_payload(args.input.as_deref())?;

    if !args.no_validate {
        check(&spec, schema, &payload, output)?;
    }

    let native = unmarshal_schema_object(&spec, schema, &payload)?;
    debug!(kind = native.type_name(), "unmarshaled payload");
    let rendered = render_native(&native);

    output.success(&format!("✓ Unmarshaled {}", args.definition))?;
    emit(&rendered, &args, output)
}

/// A JSON payload in, wire JSON out
#[instrument(skip(config, output), fields(file = %args.spec.display(), definition = %args.definition))]
pub fn handle_marshal(args: ConvertArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let spec = load_spec(&args.spec, config.spec.clone(), output)?;
    let schema = find_definition(&spec, &args.definition)?;
    let payload = read_payload(args.input.as_deref())?;

    let wire = marshal_schema_object(&spec, schema, &Value::from(&payload))?;

    if !args.no_validate {
        check(&spec, schema, &wire, output)?;
    }

    output.success(&format!("✓ Marshaled {}", args.definition))?;
    emit(&wire, &args, output)
}

fn check(spec: &Spec, schema: &Schema, instance: &Json, output: &mut OutputWriter) -> Result<()> {
    let errors = collect_schema_errors(spec, schema, instance)?;
    if errors.is_empty() {
        return Ok(());
    }
    output.validation_errors(&errors)?;
    Err(Error::ValidationFailed { count: errors.len() })
}

fn emit(value: &Json, args: &ConvertArgs, output: &mut OutputWriter) -> Result<()> {
    match &args.output_file {
        Some(path) => {
            save_output(value, path, output.format())?;
            output.success(&format!("✓ Output saved to {}", path.display()))
        }
        None if output.format() == OutputFormat::Human => {
            output.section("Result")?;
            output.data(value)
        }
        None => output.data(value),
    }
}

/// Render a native value as JSON, tagging models with their name
fn render_native(value: &Value) -> Json {
    match value {
        Value::Model(model) => {
            let mut object = Map::new();
            object.insert(MODEL_KEY.to_string(), Json::String(model.name().to_string()));
            for (key, property) in model.properties().iter().chain(model.additional_properties()) {
                object.insert(key.clone(), render_native(property));
            }
            Json::Object(object)
        }
        Value::Array(elements) => Json::Array(elements.iter().map(render_native).collect()),
        Value::Object(map) => Json::Object(
            map.iter()
                .map(|(key, element)| (key.clone(), render_native(element)))
                .collect(),
        ),
        other => other.to_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use swagmap_core::Model;

    #[test]
    fn test_render_native_tags_models() {
        let owner = Model::new("Person").with("name", "ann");
        let pet = Model::new("Pet")
            .with("name", "rex")
            .with("born", Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()))
            .with("owners", vec![Value::Model(owner)]);

        assert_eq!(
            render_native(&Value::Model(pet)),
            json!({
                "$model": "Pet",
                "name": "rex",
                "born": "2020-01-02",
                "owners": [{"$model": "Person", "name": "ann"}]
            })
        );
    }

    #[test]
    fn test_render_plain_values() {
        assert_eq!(render_native(&Value::Integer(3)), json!(3));
        assert_eq!(render_native(&Value::Null), Json::Null);
    }
}
