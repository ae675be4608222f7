//! bpc cli interface

use bpc::overrides::ValidationLevel;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; bpc ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the expanded blueprint
    Expand(ExpandCommand),

    /// Expand a blueprint and write the deployment directory
    Create(CreateCommand),
}

#[derive(Parser, Debug)]
pub struct ExpandCommand {
    #[clap(flatten)]
    pub overrides: OverrideArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Blueprint file
    pub blueprint: PathBuf,
}

#[derive(Parser, Debug)]
pub struct CreateCommand {
    #[clap(flatten)]
    pub overrides: OverrideArgs,

    /// Deployment directory, one subdirectory per group is created in it
    #[clap(short = 'o', long = "out", default_value = ".")]
    pub out: PathBuf,

    /// Blueprint file
    pub blueprint: PathBuf,
}

#[derive(Parser, Debug)]
pub struct OverrideArgs {
    /// Set a global variable (key=value)
    #[clap(long = "vars")]
    pub vars: Vec<String>,

    /// Set terraform backend defaults (key=value, `type` sets the backend type)
    #[clap(long = "backend-config")]
    pub backend_config: Vec<String>,

    /// How unknown settings, missing inputs and failing validators are reported
    #[clap(long = "validation-level", value_parser = parse_validation_level)]
    pub validation_level: Option<ValidationLevel>,
}

fn parse_validation_level(level: &str) -> Result<ValidationLevel, String> {
    level.parse().map_err(|err: bpc::error::ExpandError| err.to_string())
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
