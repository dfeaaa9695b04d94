//! Significance tests command.

use std::path::PathBuf;

use super::ExperimentData;
use crate::analytics::ab_testing::{compare_groups, render_tests_table};
use crate::analytics::outliers::OutlierScreen;
use crate::analytics::significance::SignificanceResult;
use crate::config::Config;
use crate::error::Result;
use crate::report::{emit, OutputFormat};

/// The four labelled comparisons for the prepared data.
pub fn evaluate(data: &ExperimentData, config: &Config) -> Result<Vec<SignificanceResult>> {
    let screen = OutlierScreen::run(&data.orders, &config.outliers)?;
    compare_groups(&data.orders, &data.visits, &screen, config.alpha)
}

pub fn run(config: &Config, format: &str, output: Option<PathBuf>) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let data = ExperimentData::load(config)?;
    let results = evaluate(&data, config)?;
    let alpha = config.alpha;
    emit(&results, fmt, output.as_deref(), |r| {
        format!(
            "📊 Mann-Whitney U (alpha = {})\n{}",
            alpha,
            render_tests_table(r)
        )
    })
}
