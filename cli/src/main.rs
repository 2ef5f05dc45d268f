//! chief-cli: replay governance scenarios against a fresh runtime.

use anyhow::Context;
use chief_runtime::{init_logging, LogFormat, Runtime, RuntimeConfig, Scenario};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chief-cli", about = "Stake-weighted slate governance runtime")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "CHIEF_CONFIG")]
    config: Option<PathBuf>,

    /// Longest slate the approval ledger accepts.
    #[arg(long, env = "CHIEF_MAX_SLATE_SIZE")]
    max_slate_size: Option<usize>,

    /// Gas available to each call.
    #[arg(long, env = "CHIEF_GAS_LIMIT")]
    gas_limit: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CHIEF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CHIEF_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a JSON scenario and print the report as JSON.
    Run {
        /// Scenario file.
        scenario: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if let Some(max) = cli.max_slate_size {
        config.max_slate_size = max;
    }
    if let Some(limit) = cli.gas_limit {
        config.gas_limit = limit;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate().context("invalid configuration")?;

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Run { scenario } => {
            let scenario = Scenario::from_json_file(&scenario)
                .with_context(|| format!("reading scenario {}", scenario.display()))?;
            tracing::info!(name = %scenario.name, steps = scenario.steps.len(), "replaying scenario");
            let mut runtime = Runtime::new(config);
            let report = scenario.run(&mut runtime)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
