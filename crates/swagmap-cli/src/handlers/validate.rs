//! Validate command handler

use super::utils::load_document;
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use swagmap_core::{Spec, SpecConfig};
use swagmap_schemas::{SchemaValidator, SwaggerDocumentValidator};
use tracing::{info, instrument, warn};

/// Machine-readable outcome of a successful validation
#[derive(Debug, Serialize)]
struct ValidationSummary {
    valid: bool,
    title: Option<String>,
    version: Option<String>,
    models: Vec<String>,
    operations: Vec<OperationSummary>,
    resources: Vec<String>,
}

#[derive(Debug, Serialize)]
struct OperationSummary {
    operation_id: String,
    method: String,
    path: String,
    parameters: usize,
}

#[instrument(skip(config, output), fields(file = %args.spec.display()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("validate_command", &args.spec.display().to_string());
    output.info(&format!("Validating document: {}", args.spec.display()))?;

    let document = load_document(&args.spec, output)?;

    let errors = SwaggerDocumentValidator::new().collect_errors(&document);
    if !errors.is_empty() {
        warn!(count = errors.len(), "document validation failed");
        output.validation_errors(&errors)?;
        return Err(Error::ValidationFailed { count: errors.len() });
    }

    // the document rules already ran above
    let spec_config = SpecConfig {
        validate_swagger_spec: false,
        ..config.spec.clone()
    };
    let spec = Spec::builder(document)
        .origin_url(args.spec.display().to_string())
        .config(spec_config)
        .build()?;

    let summary = summarize(&spec);
    info!(
        models = summary.models.len(),
        operations = summary.operations.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "document is valid"
    );

    output.success("✓ Document is valid")?;
    output.info(&format!(
        "{} model(s), {} operation(s) in {} resource(s)",
        summary.models.len(),
        summary.operations.len(),
        summary.resources.len()
    ))?;

    if output.format() != crate::cli::OutputFormat::Human {
        return output.data(&summary);
    }

    if args.detailed {
        output.section("Models")?;
        output.writeln(&summary.models.join(", "))?;

        output.section("Operations")?;
        let rows = summary
            .operations
            .iter()
            .map(|op| {
                vec![
                    op.operation_id.clone(),
                    op.method.clone(),
                    op.path.clone(),
                    op.parameters.to_string(),
                ]
            })
            .collect();
        output.table(&["Operation", "Method", "Path", "Params"], rows)?;
    }

    Ok(())
}

fn summarize(spec: &Spec) -> ValidationSummary {
    let info = spec.document().get("info");
    let text = |key: &str| info.and_then(|i| i.get(key)).and_then(|v| v.as_str()).map(str::to_string);

    ValidationSummary {
        valid: true,
        title: text("title"),
        version: text("version"),
        models: spec.models().keys().cloned().collect(),
        operations: spec
            .operations()
            .values()
            .map(|op| OperationSummary {
                operation_id: op.operation_id.clone(),
                method: op.http_method.to_uppercase(),
                path: op.path_name.clone(),
                parameters: op.params.len(),
            })
            .collect(),
        resources: spec.resources().keys().cloned().collect(),
    }
}
