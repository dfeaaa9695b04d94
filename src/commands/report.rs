//! Full report: prioritization, experiment analysis and the decision.

use serde::Serialize;
use std::path::PathBuf;

use super::prioritize::{prioritize, render_table as render_rankings, FrameworkChoice, Ranking};
use crate::analytics::ab_testing::{
    analyze_experiment, render_ab_report, ExperimentReport, ExperimentSettings,
};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::report::{emit, OutputFormat};

#[derive(Debug, Clone, Serialize)]
pub struct FullReport {
    pub prioritization: Vec<Ranking>,
    pub experiment: ExperimentReport,
}

impl FullReport {
    pub fn build(dataset: &Dataset, settings: &ExperimentSettings) -> Result<Self> {
        Ok(Self {
            prioritization: prioritize(&dataset.hypotheses, FrameworkChoice::Both, None)?,
            experiment: analyze_experiment(&dataset.orders, &dataset.visits, settings)?,
        })
    }
}

pub fn render_table(report: &FullReport) -> String {
    let mut out = render_rankings(&report.prioritization);
    out.push('\n');
    out.push_str(&render_ab_report(&report.experiment));
    out
}

pub fn run(config: &Config, format: &str, output: Option<PathBuf>) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let dataset = Dataset::load(&config.data)?;
    let report = FullReport::build(&dataset, &ExperimentSettings::from(config))?;
    emit(&report, fmt, output.as_deref(), render_table)
}
