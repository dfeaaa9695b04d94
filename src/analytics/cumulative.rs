//! Cumulative per-day, per-group experiment metrics.
//!
//! For every `(date, group)` pair present in the orders, the running totals
//! cover all orders (and visits) of that group up to and including the date.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::dataset::{Group, Order, Visit};

/// Running totals for one group at one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeRecord {
    pub date: NaiveDate,
    pub group: Group,
    /// Distinct transactions so far.
    pub orders: u64,
    /// Distinct buyers so far.
    pub buyers: u64,
    pub revenue: f64,
    /// Sum of visits so far.
    pub visitors: u64,
}

impl CumulativeRecord {
    /// Orders per visit; zero when there were no visits yet.
    pub fn conversion(&self) -> f64 {
        if self.visitors > 0 {
            self.orders as f64 / self.visitors as f64
        } else {
            0.0
        }
    }

    /// Revenue per order; zero before the first order.
    pub fn average_order_size(&self) -> f64 {
        if self.orders > 0 {
            self.revenue / self.orders as f64
        } else {
            0.0
        }
    }
}

/// A point of a per-group series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// B-over-A relative difference at a date (`B / A - 1`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeDifferencePoint {
    pub date: NaiveDate,
    pub difference: Option<f64>,
}

/// Same-day (non-cumulative) conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyConversion {
    pub date: NaiveDate,
    pub group: Group,
    pub orders: u64,
    pub visits: u64,
    pub conversion: f64,
}

/// Which derived metric to extract from the cumulative rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CumulativeMetric {
    Revenue,
    AverageOrderSize,
    Conversion,
}

impl CumulativeMetric {
    fn value(&self, record: &CumulativeRecord) -> f64 {
        match self {
            CumulativeMetric::Revenue => record.revenue,
            CumulativeMetric::AverageOrderSize => record.average_order_size(),
            CumulativeMetric::Conversion => record.conversion(),
        }
    }
}

/// Build one cumulative row per `(date, group)` present in `orders`, sorted by date then group.
pub fn aggregate(orders: &[Order], visits: &[Visit]) -> Vec<CumulativeRecord> {
    let mut records = Vec::new();

    for group in Group::ALL {
        let mut group_orders: Vec<&Order> = orders.iter().filter(|o| o.group == group).collect();
        group_orders.sort_by_key(|o| o.date);

        let mut group_visits: Vec<&Visit> = visits.iter().filter(|v| v.group == group).collect();
        group_visits.sort_by_key(|v| v.date);

        let mut transactions: HashSet<u64> = HashSet::new();
        let mut buyers: HashSet<u64> = HashSet::new();
        let mut revenue = 0.0;
        let mut visitors = 0u64;
        let mut visit_idx = 0;
        let mut order_idx = 0;

        while order_idx < group_orders.len() {
            let date = group_orders[order_idx].date;
            while order_idx < group_orders.len() && group_orders[order_idx].date == date {
                let order = group_orders[order_idx];
                transactions.insert(order.transaction_id);
                buyers.insert(order.visitor_id);
                revenue += order.revenue;
                order_idx += 1;
            }
            while visit_idx < group_visits.len() && group_visits[visit_idx].date <= date {
                visitors += group_visits[visit_idx].visits;
                visit_idx += 1;
            }

            records.push(CumulativeRecord {
                date,
                group,
                orders: transactions.len() as u64,
                buyers: buyers.len() as u64,
                revenue,
                visitors,
            });
        }
    }

    records.sort_by(|a, b| a.date.cmp(&b.date).then(a.group.cmp(&b.group)));
    records
}

/// Extract one group's series for a metric.
pub fn group_series(
    records: &[CumulativeRecord],
    group: Group,
    metric: CumulativeMetric,
) -> Vec<SeriesPoint> {
    records
        .iter()
        .filter(|r| r.group == group)
        .map(|r| SeriesPoint {
            date: r.date,
            value: metric.value(r),
        })
        .collect()
}

/// Relative difference of B over A for each of A's dates (left join on date).
pub fn relative_difference(
    records: &[CumulativeRecord],
    metric: CumulativeMetric,
) -> Vec<RelativeDifferencePoint> {
    let b_by_date: BTreeMap<NaiveDate, f64> = records
        .iter()
        .filter(|r| r.group == Group::B)
        .map(|r| (r.date, metric.value(r)))
        .collect();

    records
        .iter()
        .filter(|r| r.group == Group::A)
        .map(|a| {
            let a_value = metric.value(a);
            let difference = b_by_date
                .get(&a.date)
                .filter(|_| a_value != 0.0)
                .map(|b_value| b_value / a_value - 1.0);
            RelativeDifferencePoint {
                date: a.date,
                difference,
            }
        })
        .collect()
}

/// Per-day conversion for each `(date, group)` with visits.
pub fn daily_conversion(orders: &[Order], visits: &[Visit]) -> Vec<DailyConversion> {
    let mut transactions: BTreeMap<(NaiveDate, Group), BTreeSet<u64>> = BTreeMap::new();
    for order in orders {
        transactions
            .entry((order.date, order.group))
            .or_default()
            .insert(order.transaction_id);
    }

    let mut visits_by_day: BTreeMap<(NaiveDate, Group), u64> = BTreeMap::new();
    for visit in visits {
        *visits_by_day.entry((visit.date, visit.group)).or_default() += visit.visits;
    }

    visits_by_day
        .into_iter()
        .map(|((date, group), day_visits)| {
            let day_orders = transactions
                .get(&(date, group))
                .map(|t| t.len() as u64)
                .unwrap_or(0);
            DailyConversion {
                date,
                group,
                orders: day_orders,
                visits: day_visits,
                conversion: if day_visits > 0 {
                    day_orders as f64 / day_visits as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}
