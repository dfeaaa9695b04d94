//! A/B Decision CLI - main entry point
//!
//! Unified CLI for hypothesis prioritization and A/B test analysis.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ab_decision::{commands, metrics, Config};

#[derive(Parser)]
#[command(name = "ab_decision")]
#[command(about = "Hypothesis prioritization and A/B test decisions", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ab_decision.yml in the current or parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write Prometheus metrics to this file after the command (textfile collector)
    #[arg(long, env = "METRICS_FILE", global = true)]
    metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank hypotheses by ICE and/or RICE
    Prioritize {
        /// Framework: ice | rice | both
        #[arg(short, long, default_value = "both")]
        framework: String,

        /// Show only the first N hypotheses of each ranking
        #[arg(short, long)]
        top: Option<usize>,

        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,

        /// Optional output file to save results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cumulative revenue, order size and conversion per group
    Cumulative {
        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,

        /// Optional output file to save results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Percentiles, thresholds and anomalous visitors
    Outliers {
        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,

        /// Optional output file to save results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mann-Whitney U tests on raw and filtered data
    Significance {
        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,

        /// Optional output file to save results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full report with the stop/continue decision
    Report {
        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,

        /// Optional output file to save results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Prioritize { .. } => "prioritize",
            Commands::Cumulative { .. } => "cumulative",
            Commands::Outliers { .. } => "outliers",
            Commands::Significance { .. } => "significance",
            Commands::Report { .. } => "report",
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ab_decision=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command, &config);

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    if let Some(path) = cli.metrics_file.as_deref() {
        if let Err(err) = metrics::write_textfile(path) {
            warn!(path = %path.display(), "Failed to write metrics: {}", err);
        }
    }

    result
}

fn execute_command(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Prioritize {
            framework,
            top,
            format,
            output,
        } => {
            commands::prioritize::run(config, &framework, top, &format, output)?;
        }
        Commands::Cumulative { format, output } => {
            commands::cumulative::run(config, &format, output)?;
        }
        Commands::Outliers { format, output } => {
            commands::outliers::run(config, &format, output)?;
        }
        Commands::Significance { format, output } => {
            commands::significance::run(config, &format, output)?;
        }
        Commands::Report { format, output } => {
            commands::report::run(config, &format, output)?;
        }
    }

    Ok(())
}
