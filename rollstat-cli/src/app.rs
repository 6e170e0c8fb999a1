use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use rollstat_config::{load_config, PipelineConfig};

use crate::dataset::{read_csv, resolve_format, write_output};
use crate::telemetry::LogFormat;
use crate::{pipeline, telemetry};

#[derive(Parser, Debug)]
#[command(
    name = "rollstat",
    author,
    version,
    about = "Sliding-window statistics over CSV columns"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Log line encoding
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the configured statistics over a CSV file
    Run(RunArgs),
    /// Load and validate a configuration file
    Validate {
        /// Path to the pipeline configuration (TOML)
        #[arg(long)]
        config: PathBuf,
    },
    /// Print an example configuration
    Template,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the pipeline configuration (TOML)
    #[arg(long)]
    config: PathBuf,
    /// CSV file with a header row
    #[arg(long)]
    input: PathBuf,
    /// Destination file; `.json` selects JSON output. Defaults to stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Overrides input.column from the configuration
    #[arg(long)]
    column: Option<String>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level, cli.log_format)?;
    match cli.command {
        Commands::Run(args) => run_pipeline(args),
        Commands::Validate { config } => {
            let config = load_config(&config)?;
            println!(
                "configuration is valid: {} statistics over column {:?}",
                config.statistics.len(),
                config.input.column
            );
            Ok(())
        }
        Commands::Template => {
            print!("{}", PipelineConfig::example().to_toml()?);
            Ok(())
        }
    }
}

fn run_pipeline(args: RunArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(column) = args.column {
        config.input.column = column;
        config
            .validate()
            .context("configuration is invalid with the --column override")?;
    }

    let dataset = read_csv(&args.input, &config.input)?;
    let columns = pipeline::compute(&config, &dataset)?;

    let output = args.output.as_deref();
    let format = resolve_format(output, config.output.format);
    write_output(output, format, &columns, config.output.precision)?;
    info!(
        rows = dataset.len(),
        columns = columns.len(),
        format = ?format,
        output = %output.map_or_else(|| "stdout".into(), |path| path.display().to_string()),
        "wrote derived columns"
    );
    Ok(())
}
