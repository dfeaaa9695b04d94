//! Analytics module
//!
//! Provides:
//! - Hypothesis prioritization (ICE / RICE)
//! - Cumulative A/B metrics
//! - Anomalous visitor detection
//! - Mann-Whitney U significance tests and the stop/continue decision

pub mod ab_testing;
pub mod cumulative;
pub mod outliers;
pub mod prioritization;
pub mod significance;

pub use ab_testing::{analyze_experiment, decide, Decision, ExperimentReport, ExperimentSettings};
pub use cumulative::{aggregate, CumulativeMetric, CumulativeRecord};
pub use outliers::{anomalous_visitors, filter_orders, percentile, OutlierThresholds};
pub use prioritization::{rank_by, Framework, ScoredHypothesis};
pub use significance::{mann_whitney_u, Metric, SampleKind, SignificanceResult};
