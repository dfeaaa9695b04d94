//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI.

pub mod cumulative;
pub mod outliers;
pub mod prioritize;
pub mod report;
pub mod significance;

use tracing::info;

use crate::analytics::ab_testing::prepare_orders;
use crate::config::Config;
use crate::dataset::{load_orders, load_visits, Order, Visit};
use crate::Result;

// Re-export commonly used types
pub use cumulative::{run as cumulative_run, CumulativeView};
pub use outliers::{run as outliers_run, OutlierView};
pub use prioritize::{run as prioritize_run, FrameworkChoice, Ranking};
pub use report::{run as report_run, FullReport};
pub use significance::run as significance_run;

/// Orders and visits of the experiment, cleaned per config.
#[derive(Debug, Clone)]
pub struct ExperimentData {
    pub orders: Vec<Order>,
    pub visits: Vec<Visit>,
    pub cross_group_visitors: usize,
}

impl ExperimentData {
    pub fn load(config: &Config) -> Result<Self> {
        let orders = load_orders(&config.data.orders)?;
        let visits = load_visits(&config.data.visits)?;
        info!(orders = orders.len(), visits = visits.len(), "Experiment data loaded");
        Ok(Self::prepare(orders, visits, config.drop_cross_group_visitors))
    }

    pub fn prepare(orders: Vec<Order>, visits: Vec<Visit>, drop_cross_group: bool) -> Self {
        let (orders, cross) = prepare_orders(&orders, drop_cross_group);
        Self {
            orders,
            visits,
            cross_group_visitors: cross.len(),
        }
    }
}
