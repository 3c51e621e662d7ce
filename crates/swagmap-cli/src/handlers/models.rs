//! Models command handler

use super::utils::load_spec;
use crate::cli::{ModelsArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde::Serialize;
use swagmap_core::{AdditionalProperties, ModelDescriptor, Spec};
use tracing::instrument;

#[derive(Debug, Serialize, PartialEq)]
struct ModelSummary {
    name: String,
    parents: Vec<String>,
    discriminator: Option<String>,
    subtypes: Vec<String>,
    properties: Vec<PropertySummary>,
    additional_properties: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
struct PropertySummary {
    name: String,
    #[serde(rename = "type")]
    schema_type: String,
    required: bool,
}

#[instrument(skip(config, output), fields(file = %args.spec.display()))]
pub fn handle_models(args: ModelsArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let spec = load_spec(&args.spec, config.spec.clone(), output)?;

    let summaries: Vec<ModelSummary> = match &args.name {
        Some(name) => {
            let model = spec.model(name).ok_or_else(|| Error::DefinitionNotFound {
                name: name.clone(),
                suggestion: spec
                    .models()
                    .keys()
                    .find(|candidate| candidate.eq_ignore_ascii_case(name))
                    .cloned(),
            })?;
            vec![summarize(&spec, model)]
        }
        None => spec.models().values().map(|model| summarize(&spec, model)).collect(),
    };

    if output.format() != OutputFormat::Human {
        return output.data(&summaries);
    }

    if summaries.is_empty() {
        output.warning("No models found")?;
        return Ok(());
    }

    let rows = summaries
        .iter()
        .map(|model| {
            vec![
                model.name.clone(),
                model.parents.join(", "),
                model.discriminator.clone().unwrap_or_default(),
                model.subtypes.join(", "),
                model.properties.len().to_string(),
            ]
        })
        .collect();
    output.table(&["Model", "Inherits", "Discriminator", "Subtypes", "Properties"], rows)?;

    if args.name.is_some() {
        for model in &summaries {
            output.section(&model.name)?;
            let rows = model
                .properties
                .iter()
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.schema_type.clone(),
                        if p.required { "yes" } else { "" }.to_string(),
                    ]
                })
                .collect();
            output.table(&["Property", "Type", "Required"], rows)?;
            output.info(&format!("additional properties: {}", model.additional_properties))?;
        }
    }
    Ok(())
}

fn summarize(spec: &Spec, model: &ModelDescriptor) -> ModelSummary {
    let properties = model
        .properties
        .iter()
        .map(|(name, schema)| PropertySummary {
            name: name.clone(),
            schema_type: spec
                .deref(schema)
                .map(|node| node.describe())
                .unwrap_or_else(|_| schema.describe()),
            required: model.required.contains(name),
        })
        .collect();

    ModelSummary {
        name: model.name.clone(),
        parents: model.inherits_from.clone(),
        discriminator: model.discriminator.clone(),
        subtypes: model.subtypes.clone(),
        properties,
        additional_properties: match model.additional_properties {
            AdditionalProperties::Allowed => "allowed",
            AdditionalProperties::Denied => "denied",
            AdditionalProperties::Schema(_) => "schema",
        },
    }
}
