//! Command-line interface

pub mod commands;
pub mod output;
pub mod progress;

use clap::{Parser, Subcommand};
use commands::{RunCommand, StagesCommand, ValidateCommand};
use std::ffi::OsString;

/// Cheminformatics pipelines over SMILES input
#[derive(Debug, Parser, Clone)]
#[command(name = "molpipe")]
#[command(author = "molpipe contributors")]
#[command(version = "0.1.0")]
#[command(
    about = "Standardize, optimize, filter and featurize molecules with YAML-defined pipelines",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline over a molecule or a SMILES file
    Run(RunCommand),

    /// Validate a pipeline configuration
    Validate(ValidateCommand),

    /// List the built-in stage types
    Stages(StagesCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
