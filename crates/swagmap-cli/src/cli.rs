//! Command-line interface argument parsing and definitions
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Swagmap CLI - Swagger 2.0 validation and payload conversion
///
/// Validates Swagger 2.0 documents, lists the models they define, and
/// converts payloads between wire JSON and typed values.
#[derive(Parser, Debug)]
#[command(
    name = "swagmap",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SWAGMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a Swagger 2.0 document and summarize what it defines
    Validate(ValidateArgs),

    /// List the models of a document with inheritance and discriminators
    Models(ModelsArgs),

    /// Convert wire JSON into typed values for a definition
    Unmarshal(ConvertArgs),

    /// Convert a JSON payload into wire JSON for a definition
    Marshal(ConvertArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the Swagger document (JSON or YAML)
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Show the models and operations found
    #[arg(long)]
    pub detailed: bool,
}

/// Arguments for the models command
#[derive(Parser, Debug)]
pub struct ModelsArgs {
    /// Path to the Swagger document (JSON or YAML)
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Only show this model
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments shared by marshal and unmarshal
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Path to the Swagger document (JSON or YAML)
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Name of the definition describing the payload
    #[arg(short, long)]
    pub definition: String,

    /// Payload file (JSON or YAML); reads stdin when omitted or `-`
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Skip schema validation of the payload
    #[arg(long)]
    pub no_validate: bool,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
