//! CLI command definitions

use crate::io::ReadOptions;
use clap::Args;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// A single molecule as SMILES
    #[arg(long, conflicts_with = "input")]
    pub smiles: Option<String>,

    /// SMILES file path or http(s) URL (overrides the config's input)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Zero-based column holding SMILES
    #[arg(long, default_value_t = 0)]
    pub smiles_column: usize,

    /// Zero-based column holding molecule names
    #[arg(long)]
    pub name_column: Option<usize>,

    /// The input file starts with a header line
    #[arg(long)]
    pub header: bool,

    /// Skip unparsable input lines instead of failing
    #[arg(long)]
    pub force: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Print the run report
    #[arg(long)]
    pub report: bool,
}

impl RunCommand {
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            smiles_column: self.smiles_column,
            name_column: self.name_column,
            header: self.header,
            force: self.force,
        }
    }
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List the built-in stage types
#[derive(Debug, Args, Clone)]
pub struct StagesCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
