//! Outlier thresholds command.

use serde::Serialize;
use std::path::PathBuf;

use super::ExperimentData;
use crate::analytics::ab_testing::render_outliers;
use crate::analytics::outliers::{OutlierScreen, OutlierThresholds, PercentileSummary};
use crate::config::{Config, OutlierConfig};
use crate::error::Result;
use crate::report::{emit, OutputFormat};

#[derive(Debug, Clone, Serialize)]
pub struct OutlierView {
    pub percentiles: PercentileSummary,
    pub thresholds: OutlierThresholds,
    pub anomalous_visitors: Vec<u64>,
    pub orders_raw: usize,
    pub orders_filtered: usize,
}

impl OutlierView {
    pub fn build(data: &ExperimentData, config: &OutlierConfig) -> Result<Self> {
        let screen = OutlierScreen::run(&data.orders, config)?;
        Ok(Self {
            percentiles: screen.percentiles,
            thresholds: screen.thresholds,
            orders_raw: data.orders.len(),
            orders_filtered: screen.filtered.len(),
            anomalous_visitors: screen.anomalous.into_iter().collect(),
        })
    }
}

pub fn render_table(view: &OutlierView) -> String {
    let mut out = String::from("🔎 Outliers\n");
    out.push_str(&render_outliers(
        &view.percentiles,
        &view.thresholds,
        view.anomalous_visitors.len(),
        view.orders_filtered,
    ));
    out.push_str(&format!(
        "  Orders removed: {} of {}\n",
        view.orders_raw - view.orders_filtered,
        view.orders_raw
    ));
    out
}

pub fn run(config: &Config, format: &str, output: Option<PathBuf>) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let data = ExperimentData::load(config)?;
    let view = OutlierView::build(&data, &config.outliers)?;
    emit(&view, fmt, output.as_deref(), render_table)
}
