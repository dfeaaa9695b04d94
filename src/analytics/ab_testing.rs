//! A/B experiment evaluation.
//!
//! Runs the experiment part of the analysis end to end:
//! - Drop visitors seen in both groups
//! - Build cumulative metrics and their B-vs-A relative differences
//! - Detect anomalous visitors and compare groups on raw and filtered data
//! - Decide whether to stop the test and who won

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

use super::cumulative::{
    aggregate, daily_conversion, group_series, relative_difference, CumulativeMetric,
    CumulativeRecord, DailyConversion, RelativeDifferencePoint, SeriesPoint,
};
use super::outliers::{OutlierScreen, OutlierThresholds, PercentileSummary};
use super::significance::{run_all, Metric, SampleKind, SignificanceResult};
use crate::config::{Config, OutlierConfig, DEFAULT_ALPHA};
use crate::dataset::{remove_cross_group_visitors, Group, Order, Visit};
use crate::metrics;
use crate::report::{format_percent, sparkline};
use crate::{Error, Result};

/// Knobs of the experiment evaluation.
#[derive(Debug, Clone)]
pub struct ExperimentSettings {
    pub drop_cross_group_visitors: bool,
    pub outliers: OutlierConfig,
    pub alpha: f64,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            drop_cross_group_visitors: true,
            outliers: OutlierConfig::default(),
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl From<&Config> for ExperimentSettings {
    fn from(config: &Config) -> Self {
        Self {
            drop_cross_group_visitors: config.drop_cross_group_visitors,
            outliers: config.outliers.clone(),
            alpha: config.alpha,
        }
    }
}

/// Per-group cumulative series and their relative differences.
#[derive(Debug, Clone, Serialize)]
pub struct CumulativeSeries {
    pub revenue_a: Vec<SeriesPoint>,
    pub revenue_b: Vec<SeriesPoint>,
    pub average_order_a: Vec<SeriesPoint>,
    pub average_order_b: Vec<SeriesPoint>,
    pub average_order_difference: Vec<RelativeDifferencePoint>,
    pub conversion_a: Vec<SeriesPoint>,
    pub conversion_b: Vec<SeriesPoint>,
    pub conversion_difference: Vec<RelativeDifferencePoint>,
}

impl CumulativeSeries {
    pub fn from_records(records: &[CumulativeRecord]) -> Self {
        Self {
            revenue_a: group_series(records, Group::A, CumulativeMetric::Revenue),
            revenue_b: group_series(records, Group::B, CumulativeMetric::Revenue),
            average_order_a: group_series(records, Group::A, CumulativeMetric::AverageOrderSize),
            average_order_b: group_series(records, Group::B, CumulativeMetric::AverageOrderSize),
            average_order_difference: relative_difference(
                records,
                CumulativeMetric::AverageOrderSize,
            ),
            conversion_a: group_series(records, Group::A, CumulativeMetric::Conversion),
            conversion_b: group_series(records, Group::B, CumulativeMetric::Conversion),
            conversion_difference: relative_difference(records, CumulativeMetric::Conversion),
        }
    }
}

/// What to do with the running test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// Stop and declare `group` the winner on `metric`.
    StopWinner { group: Group, metric: Metric },
    /// Stop: no significant difference on raw or filtered data.
    StopNoDifference,
    /// Raw and filtered data disagree; keep collecting.
    Continue,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::StopWinner { group, metric } => write!(
                f,
                "Stop the test: group {} leads on {}",
                group,
                metric_label(*metric)
            ),
            Decision::StopNoDifference => {
                f.write_str("Stop the test: no significant difference between groups")
            }
            Decision::Continue => f.write_str("Continue the test: results are not yet conclusive"),
        }
    }
}

/// Decide from the labelled test results.
///
/// A significant filtered test stops the test with the higher-mean group as
/// winner (conversion checked before order value). With nothing significant
/// anywhere the test stops with no difference; otherwise it continues.
/// Comparisons without a p-value never count as significant.
pub fn decide(results: &[SignificanceResult]) -> Decision {
    for metric in [Metric::Conversion, Metric::OrderValue] {
        let winner = results
            .iter()
            .filter(|r| r.metric == metric && r.sample == SampleKind::Filtered && r.is_significant())
            .find_map(|r| r.leader());
        if let Some(group) = winner {
            return Decision::StopWinner { group, metric };
        }
    }

    if results.iter().all(|r| !r.is_significant()) {
        Decision::StopNoDifference
    } else {
        Decision::Continue
    }
}

/// Everything computed for the experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub alpha: f64,
    pub orders_total: usize,
    pub cross_group_visitors: usize,
    pub orders_analyzed: usize,
    pub cumulative: Vec<CumulativeRecord>,
    pub series: CumulativeSeries,
    pub daily_conversion: Vec<DailyConversion>,
    pub percentiles: PercentileSummary,
    pub thresholds: OutlierThresholds,
    pub anomalous_visitors: usize,
    pub filtered_orders: usize,
    pub tests: Vec<SignificanceResult>,
    pub decision: Decision,
}

/// Orders kept for analysis and the visitors dropped for ordering in both groups.
pub fn prepare_orders(orders: &[Order], drop_cross_group: bool) -> (Vec<Order>, BTreeSet<u64>) {
    if drop_cross_group {
        remove_cross_group_visitors(orders)
    } else {
        (orders.to_vec(), BTreeSet::new())
    }
}

/// The four labelled tests, excluding the visitors flagged by `screen` from
/// the filtered samples.
pub fn compare_groups(
    orders: &[Order],
    visits: &[Visit],
    screen: &OutlierScreen,
    alpha: f64,
) -> Result<Vec<SignificanceResult>> {
    let tests = run_all(orders, visits, &screen.anomalous, alpha)?;
    for t in &tests {
        if let Some(p_value) = t.p_value {
            metrics::record_p_value(t.metric.as_str(), t.sample.as_str(), p_value);
        }
    }
    Ok(tests)
}

/// Run the full experiment evaluation.
pub fn analyze_experiment(
    orders: &[Order],
    visits: &[Visit],
    settings: &ExperimentSettings,
) -> Result<ExperimentReport> {
    if orders.is_empty() {
        return Err(Error::EmptyData("no orders to analyze".to_string()));
    }
    if visits.is_empty() {
        return Err(Error::EmptyData("no visits to analyze".to_string()));
    }

    let (orders_clean, cross) = prepare_orders(orders, settings.drop_cross_group_visitors);

    let cumulative = aggregate(&orders_clean, visits);
    let series = CumulativeSeries::from_records(&cumulative);
    let daily = daily_conversion(&orders_clean, visits);

    let screen = OutlierScreen::run(&orders_clean, &settings.outliers)?;
    let tests = compare_groups(&orders_clean, visits, &screen, settings.alpha)?;

    let decision = decide(&tests);
    info!(decision = %decision, "Experiment decision");

    Ok(ExperimentReport {
        alpha: settings.alpha,
        orders_total: orders.len(),
        cross_group_visitors: cross.len(),
        orders_analyzed: orders_clean.len(),
        cumulative,
        series,
        daily_conversion: daily,
        percentiles: screen.percentiles,
        thresholds: screen.thresholds,
        anomalous_visitors: screen.anomalous.len(),
        filtered_orders: screen.filtered.len(),
        tests,
        decision,
    })
}

fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Conversion => "conversion",
        Metric::OrderValue => "average order size",
    }
}

/// One sentence per test plus the decision.
pub fn conclusions(report: &ExperimentReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .tests
        .iter()
        .map(|t| {
            let verdict = match t.p_value {
                Some(p) if t.significant => {
                    format!("p = {:.5} < {}: the difference is significant", p, report.alpha)
                }
                Some(p) => format!("p = {:.5} >= {}: no significant difference", p, report.alpha),
                None => "not enough data to test".to_string(),
            };
            format!(
                "{} ({} data): {}; B vs A {}",
                metric_label(t.metric),
                t.sample,
                verdict,
                format_percent(t.relative_difference)
            )
        })
        .collect();
    lines.push(report.decision.to_string());
    lines
}

fn values(points: &[SeriesPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

fn differences(points: &[RelativeDifferencePoint]) -> Vec<f64> {
    points
        .iter()
        .map(|p| p.difference.unwrap_or(f64::NAN))
        .collect()
}

fn last_difference(points: &[RelativeDifferencePoint]) -> Option<f64> {
    points.iter().rev().find_map(|p| p.difference)
}

/// Text layout of the report.
pub fn render_ab_report(report: &ExperimentReport) -> String {
    let mut out = String::new();
    let header = "🧪 A/B test report";
    out.push_str(header);
    out.push('\n');
    out.push_str(&"-".repeat(header.chars().count()));
    out.push('\n');

    out.push_str(&format!(
        "Orders: {} total, {} analyzed ({} visitors in both groups removed)\n\n",
        report.orders_total, report.orders_analyzed, report.cross_group_visitors
    ));

    out.push_str("Cumulative metrics\n");
    out.push_str(&render_series(&report.series));

    out.push_str("\nOutliers\n");
    out.push_str(&render_outliers(
        &report.percentiles,
        &report.thresholds,
        report.anomalous_visitors,
        report.filtered_orders,
    ));

    out.push_str(&format!("\nSignificance (Mann-Whitney U, alpha = {})\n", report.alpha));
    out.push_str(&render_tests_table(&report.tests));

    out.push_str("\nConclusions\n");
    for line in conclusions(report) {
        out.push_str(&format!("  • {}\n", line));
    }
    out
}

/// Sparklines of the cumulative series, with the last value of each.
pub fn render_series(s: &CumulativeSeries) -> String {
    let mut out = String::new();
    let charts: [(&str, Vec<f64>); 6] = [
        ("Revenue A", values(&s.revenue_a)),
        ("Revenue B", values(&s.revenue_b)),
        ("Avg order A", values(&s.average_order_a)),
        ("Avg order B", values(&s.average_order_b)),
        ("Conversion A", values(&s.conversion_a)),
        ("Conversion B", values(&s.conversion_b)),
    ];
    for (label, series) in &charts {
        let last = series.last().copied().unwrap_or(0.0);
        out.push_str(&format!(
            "  {:14} {} {:>12.4}\n",
            label,
            sparkline(series),
            last
        ));
    }
    for (label, points) in [
        ("Avg order B/A", &s.average_order_difference),
        ("Conversion B/A", &s.conversion_difference),
    ] {
        out.push_str(&format!(
            "  {:14} {} {:>12}\n",
            label,
            sparkline(&differences(points)),
            format_percent(last_difference(points))
        ));
    }
    out
}

pub fn render_outliers(
    p: &PercentileSummary,
    thresholds: &OutlierThresholds,
    anomalous: usize,
    orders_kept: usize,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  Orders per visitor  p95 {:>10.2}  p99 {:>10.2}\n",
        p.orders_p95, p.orders_p99
    ));
    out.push_str(&format!(
        "  Order revenue       p95 {:>10.2}  p99 {:>10.2}\n",
        p.revenue_p95, p.revenue_p99
    ));
    out.push_str(&format!(
        "  Thresholds: > {:.2} orders or any order > {:.2}\n",
        thresholds.max_orders, thresholds.max_revenue
    ));
    out.push_str(&format!(
        "  Anomalous visitors: {} ({} orders kept)\n",
        anomalous, orders_kept
    ));
    out
}

/// Table of the four significance tests.
pub fn render_tests_table(tests: &[SignificanceResult]) -> String {
    let mut out = format!(
        "  {:12} {:9} {:>8} {:>8} {:>10} {:>10} {:>11}\n",
        "Metric", "Sample", "n(A)", "n(B)", "p-value", "B vs A", "Significant"
    );
    for t in tests {
        let p_value = t
            .p_value
            .map_or_else(|| "-".to_string(), |p| format!("{:.5}", p));
        out.push_str(&format!(
            "  {:12} {:9} {:>8} {:>8} {:>10} {:>10} {:>11}\n",
            t.metric.as_str(),
            t.sample.as_str(),
            t.size_a,
            t.size_b,
            p_value,
            format_percent(t.relative_difference),
            if t.significant { "yes" } else { "no" }
        ));
    }
    out
}

/// Print A/B test report to stdout.
pub fn print_ab_report(report: &ExperimentReport) {
    println!("{}", render_ab_report(report));
}
