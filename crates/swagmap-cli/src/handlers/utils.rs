//! Shared utilities for command handlers

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputFormatter, OutputWriter};
use serde_json::Value as Json;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use swagmap_core::{Schema, Spec, SpecConfig};
use swagmap_schemas::DocumentLoader;

/// Load a document and build a [`Spec`] from it
pub fn load_spec(path: &Path, spec_config: SpecConfig, output: &OutputWriter) -> Result<Spec> {
    let document = load_document(path, output)?;
    let _timer = Timer::with_details("build_spec", &path.display().to_string());
    let spec = Spec::builder(document)
        .origin_url(path.display().to_string())
        .config(spec_config)
        .build()?;
    tracing::info!(
        models = spec.models().len(),
        operations = spec.operations().len(),
        "spec built"
    );
    Ok(spec)
}

/// Read, parse and bundle a document from disk
pub fn load_document(path: &Path, output: &OutputWriter) -> Result<Json> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let _timer = Timer::with_details("load_document", &path.display().to_string());
    let spinner = output.spinner(&format!("Loading {}", path.display()));
    let document = DocumentLoader::new().load(path);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    Ok(document?)
}

/// Payload from a file, or stdin when `input` is absent or `-`
pub fn read_payload(input: Option<&Path>) -> Result<Json> {
    let (content, path) = match input {
        Some(path) if path != Path::new("-") => {
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            (fs::read_to_string(path)?, path.to_path_buf())
        }
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            (content, PathBuf::from("<stdin>"))
        }
    };
    parse_payload(&content, &path)
}

/// Parse JSON, falling back to YAML for `.yaml`/`.yml` files and stdin
pub fn parse_payload(content: &str, path: &Path) -> Result<Json> {
    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        return Ok(serde_yaml::from_str(content)?);
    }
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_error) if path == Path::new("<stdin>") => {
            serde_yaml::from_str(content).map_err(|_| Error::Json(json_error))
        }
        Err(_) => Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        }),
    }
}

/// The schema of a named definition, with a close-match suggestion when
/// the name is unknown
pub fn find_definition<'a>(spec: &'a Spec, name: &str) -> Result<&'a Schema> {
    if let Some(schema) = spec.definition(name) {
        return Ok(schema);
    }
    let suggestion = spec
        .definitions()
        .keys()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .cloned();
    Err(Error::DefinitionNotFound {
        name: name.to_string(),
        suggestion,
    })
}

/// Write a result to `path` in the output format (JSON for human mode)
pub fn save_output(value: &Json, path: &Path, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Human => OutputFormat::JsonPretty.format(value)?,
        other => other.format(value)?,
    };
    fs::write(path, content)?;
    Ok(())
}
