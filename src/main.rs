use anyhow::{bail, Context, Result};
use molpipe::cli::commands::{RunCommand, StagesCommand, ValidateCommand};
use molpipe::cli::output::*;
use molpipe::cli::progress::ProgressBarObserver;
use molpipe::cli::{Cli, Command};
use molpipe::core::{Item, NoopObserver, PipelineConfig, ProgressObserver, Value};
use molpipe::io::{self, ReadOptions};
use molpipe::stages::catalog;
use molpipe::Molecule;
use tracing::{error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, &cli).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Stages(cmd) => list_stages(cmd)?,
    }

    Ok(())
}

async fn run_pipeline(cmd: &RunCommand, cli: &Cli) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;
    let pipeline = config.to_pipeline();
    let quiet = cmd.json;

    if !quiet {
        println!("{} Loaded pipeline: {} ({} stages)", INFO, style(&pipeline.name).bold(), pipeline.len());
    }

    let item = load_input(cmd, &config).await?;
    if !quiet {
        println!("{} Input: {} {}", INFO, item.len(), if item.len() == 1 { "molecule" } else { "molecules" });
    }

    let observer: Box<dyn ProgressObserver> = if cli.no_progress || quiet {
        Box::new(NoopObserver)
    } else {
        Box::new(ProgressBarObserver::new(pipeline.len()))
    };

    let run = match pipeline.run(item, observer.as_ref()) {
        Ok(run) => run,
        Err(err) => {
            println!("\n{} {} {}", CROSS, style(&pipeline.name).bold(), style("failed").red());
            error!("{:#}", anyhow::Error::new(err));
            std::process::exit(1);
        }
    };

    if cmd.json {
        let data = if cmd.report {
            serde_json::json!({ "output": run.output, "report": run.report })
        } else {
            serde_json::to_value(&run.output)?
        };
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("\n{}", format_item(&run.output));
    if cmd.report {
        println!("\n{}", format_report(&run.report));
    }
    println!(
        "\n{} {} completed {}",
        CHECK,
        style(&pipeline.name).bold(),
        style("successfully").green()
    );
    Ok(())
}

/// Resolve the pipeline input: `--smiles`, then `--input`, then the config's `input`
async fn load_input(cmd: &RunCommand, config: &PipelineConfig) -> Result<Item> {
    if let Some(smiles) = &cmd.smiles {
        let mol = Molecule::from_smiles(smiles).with_context(|| format!("Invalid SMILES '{}'", smiles))?;
        return Ok(Item::single(Value::Mol(mol)));
    }

    let (location, options): (&str, ReadOptions) = match (&cmd.input, &config.input) {
        (Some(location), _) => (location.as_str(), cmd.read_options()),
        (None, Some(input)) => (input.location.as_str(), input.read.clone()),
        (None, None) => bail!("No input given: pass --smiles or --input, or add an input section to the config"),
    };

    let series = io::read_smiles(location, &options)
        .await
        .with_context(|| format!("Failed to read molecules from {}", location))?;
    Ok(Item::collection(series))
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Pipeline configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            if let Some(description) = &config.description {
                println!("  Description: {}", style(description).dim());
            }
            println!("  Stages: {}", style(config.stages.len()).cyan());
            for stage in &config.stages {
                let keep = if stage.options.keep_failed { " (keep failed)" } else { "" };
                println!(
                    "    - {} [{}]{}",
                    style(stage.stage_name()).bold(),
                    stage.kind.type_name(),
                    style(keep).dim()
                );
            }
            if let Some(input) = &config.input {
                println!("  Input: {}", style(&input.location).cyan());
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn list_stages(cmd: &StagesCommand) -> Result<()> {
    let catalog = catalog();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("{} Available stage types:", INFO);
    let width = catalog.iter().map(|s| s.type_name.len()).max().unwrap_or(0);
    for info in &catalog {
        println!(
            "  {}  {}  {}",
            style(format!("{:<width$}", info.type_name, width = width)).bold(),
            info.description,
            style(format!("[{}]", info.capabilities)).dim()
        );
    }
    Ok(())
}
