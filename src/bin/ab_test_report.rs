//! A/B test report CLI.
//!
//! Usage:
//!   cargo run --bin ab_test_report -- --orders orders.csv --visits visits.csv --hypotheses hypotheses.csv

use ab_decision::analytics::ab_testing::ExperimentSettings;
use ab_decision::commands::report::{render_table, FullReport};
use ab_decision::config::{DataConfig, DEFAULT_HYPOTHESES_DELIMITER};
use ab_decision::report::{emit, OutputFormat};
use ab_decision::{Config, Dataset};
use anyhow::{bail, Result};
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ab_test_report")]
#[command(about = "Full A/B test report from orders, visits and hypotheses files")]
struct Args {
    /// Orders CSV (transactionId,visitorId,date,revenue,group)
    #[arg(long, env = "AB_ORDERS_PATH")]
    orders: PathBuf,

    /// Visits CSV (date,group,visits)
    #[arg(long, env = "AB_VISITS_PATH")]
    visits: PathBuf,

    /// Hypotheses table (Hypothesis;Reach;Impact;Confidence;Effort)
    #[arg(long, env = "AB_HYPOTHESES_PATH")]
    hypotheses: PathBuf,

    /// Delimiter of the hypotheses table
    #[arg(long, default_value_t = DEFAULT_HYPOTHESES_DELIMITER as char)]
    delimiter: char,

    /// Significance level; overrides the config file
    #[arg(long)]
    alpha: Option<f64>,

    /// Output format: table | json | yaml
    #[arg(long, default_value = "table")]
    format: String,

    /// Optional output file to save results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ab_decision=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if !args.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got '{}'", args.delimiter);
    }

    let mut config = Config::new()?;
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    config.validate()?;

    let dataset = Dataset::load(&DataConfig {
        hypotheses: args.hypotheses,
        hypotheses_delimiter: args.delimiter as u8,
        orders: args.orders,
        visits: args.visits,
    })?;

    let report = FullReport::build(&dataset, &ExperimentSettings::from(&config))?;
    emit(
        &report,
        OutputFormat::parse(&args.format)?,
        args.output.as_deref(),
        render_table,
    )?;

    Ok(())
}
