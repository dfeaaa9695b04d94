//! Anomalous visitor detection.
//!
//! A visitor is anomalous when they placed more orders than `max_orders`, or
//! any single order above `max_revenue`. Thresholds come from percentiles of
//! the raw data unless fixed in configuration.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::config::OutlierConfig;
use crate::dataset::{Group, Order};
use crate::metrics;
use crate::{Error, Result};

/// Distinct order count of one visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitorOrders {
    pub visitor_id: u64,
    pub group: Group,
    pub orders: u64,
}

/// Orders-per-visitor and revenue percentiles used to pick thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSummary {
    pub orders_p95: f64,
    pub orders_p99: f64,
    pub revenue_p95: f64,
    pub revenue_p99: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierThresholds {
    pub max_orders: f64,
    pub max_revenue: f64,
}

/// Linear-interpolated percentile (`q` in `[0, 100]`); `None` for empty input.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = (sorted.len() - 1) as f64 * q / 100.0;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Distinct transactions per `(visitor, group)`, sorted by visitor id.
pub fn orders_per_visitor(orders: &[Order]) -> Vec<VisitorOrders> {
    let mut map: BTreeMap<(u64, Group), BTreeSet<u64>> = BTreeMap::new();
    for order in orders {
        map.entry((order.visitor_id, order.group))
            .or_default()
            .insert(order.transaction_id);
    }

    map.into_iter()
        .map(|((visitor_id, group), transactions)| VisitorOrders {
            visitor_id,
            group,
            orders: transactions.len() as u64,
        })
        .collect()
}

impl PercentileSummary {
    pub fn compute(orders: &[Order]) -> Result<Self> {
        let counts: Vec<f64> = orders_per_visitor(orders)
            .iter()
            .map(|v| v.orders as f64)
            .collect();
        let revenue: Vec<f64> = orders.iter().map(|o| o.revenue).collect();

        let pick = |values: &[f64], q: f64| {
            percentile(values, q).ok_or_else(|| Error::EmptyData("no orders to rank".to_string()))
        };

        Ok(Self {
            orders_p95: pick(&counts, 95.0)?,
            orders_p99: pick(&counts, 99.0)?,
            revenue_p95: pick(&revenue, 95.0)?,
            revenue_p99: pick(&revenue, 99.0)?,
        })
    }
}

impl OutlierThresholds {
    /// Thresholds from the configured percentile, with fixed overrides applied.
    pub fn derive(orders: &[Order], config: &OutlierConfig) -> Result<Self> {
        let max_orders = match config.max_orders {
            Some(fixed) => fixed,
            None => {
                let counts: Vec<f64> = orders_per_visitor(orders)
                    .iter()
                    .map(|v| v.orders as f64)
                    .collect();
                percentile(&counts, config.percentile)
                    .ok_or_else(|| Error::EmptyData("no orders to derive thresholds".to_string()))?
            }
        };

        let max_revenue = match config.max_revenue {
            Some(fixed) => fixed,
            None => {
                let revenue: Vec<f64> = orders.iter().map(|o| o.revenue).collect();
                percentile(&revenue, config.percentile)
                    .ok_or_else(|| Error::EmptyData("no orders to derive thresholds".to_string()))?
            }
        };

        info!(
            max_orders,
            max_revenue,
            percentile = config.percentile,
            "Outlier thresholds"
        );
        Ok(Self {
            max_orders,
            max_revenue,
        })
    }
}

/// Visitors exceeding either threshold.
pub fn anomalous_visitors(orders: &[Order], thresholds: &OutlierThresholds) -> BTreeSet<u64> {
    let mut anomalous: BTreeSet<u64> = orders_per_visitor(orders)
        .into_iter()
        .filter(|v| v.orders as f64 > thresholds.max_orders)
        .map(|v| v.visitor_id)
        .collect();

    anomalous.extend(
        orders
            .iter()
            .filter(|o| o.revenue > thresholds.max_revenue)
            .map(|o| o.visitor_id),
    );

    anomalous
}

/// Orders of visitors not in `anomalous`.
pub fn filter_orders(orders: &[Order], anomalous: &BTreeSet<u64>) -> Vec<Order> {
    orders
        .iter()
        .filter(|o| !anomalous.contains(&o.visitor_id))
        .cloned()
        .collect()
}

/// Percentiles, thresholds and the visitors they flag, for one set of orders.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierScreen {
    pub percentiles: PercentileSummary,
    pub thresholds: OutlierThresholds,
    pub anomalous: BTreeSet<u64>,
    /// Orders left after dropping every anomalous visitor.
    pub filtered: Vec<Order>,
}

impl OutlierScreen {
    pub fn run(orders: &[Order], config: &OutlierConfig) -> Result<Self> {
        let percentiles = PercentileSummary::compute(orders)?;
        let thresholds = OutlierThresholds::derive(orders, config)?;
        let anomalous = anomalous_visitors(orders, &thresholds);
        let filtered = filter_orders(orders, &anomalous);
        info!(
            anomalous = anomalous.len(),
            orders_kept = filtered.len(),
            "Anomalous visitors detected"
        );
        metrics::record_anomalous_visitors(anomalous.len());

        Ok(Self {
            percentiles,
            thresholds,
            anomalous,
            filtered,
        })
    }
}
