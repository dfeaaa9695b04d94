//! Experiment datasets
//!
//! Provides:
//! - Typed records for hypotheses, orders and visits
//! - CSV loading for the three input tables
//! - Removal of visitors that ordered in both test groups

pub mod loader;
pub mod models;

pub use loader::{load_hypotheses, load_orders, load_visits};
pub use models::{Group, Hypothesis, Order, Visit};

use std::collections::{BTreeSet, HashMap};
use tracing::info;

use crate::config::DataConfig;
use crate::Result;

/// The three input tables of one experiment.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub hypotheses: Vec<Hypothesis>,
    pub orders: Vec<Order>,
    pub visits: Vec<Visit>,
}

impl Dataset {
    /// Load all tables named in the config.
    pub fn load(config: &DataConfig) -> Result<Self> {
        let hypotheses = load_hypotheses(&config.hypotheses, config.hypotheses_delimiter)?;
        let orders = load_orders(&config.orders)?;
        let visits = load_visits(&config.visits)?;

        info!(
            hypotheses = hypotheses.len(),
            orders = orders.len(),
            visits = visits.len(),
            "Dataset loaded"
        );

        Ok(Self {
            hypotheses,
            orders,
            visits,
        })
    }
}

/// Drop every order of visitors that appear in both groups.
///
/// Returns the remaining orders (input order preserved) and the removed visitor ids.
pub fn remove_cross_group_visitors(orders: &[Order]) -> (Vec<Order>, BTreeSet<u64>) {
    let mut seen: HashMap<u64, Group> = HashMap::new();
    let mut cross: BTreeSet<u64> = BTreeSet::new();

    for order in orders {
        match seen.get(&order.visitor_id) {
            Some(group) if *group != order.group => {
                cross.insert(order.visitor_id);
            }
            Some(_) => {}
            None => {
                seen.insert(order.visitor_id, order.group);
            }
        }
    }

    let kept: Vec<Order> = orders
        .iter()
        .filter(|o| !cross.contains(&o.visitor_id))
        .cloned()
        .collect();

    if !cross.is_empty() {
        info!(
            visitors = cross.len(),
            orders_removed = orders.len() - kept.len(),
            "Removed visitors present in both groups"
        );
    }

    (kept, cross)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 8, d).unwrap()
    }

    #[test]
    fn removes_visitors_ordering_in_both_groups() {
        let orders = vec![
            Order::new(1, 10, day(1), 100.0, Group::A),
            Order::new(2, 10, day(2), 50.0, Group::B),
            Order::new(3, 11, day(1), 20.0, Group::A),
            Order::new(4, 12, day(3), 70.0, Group::B),
            Order::new(5, 11, day(4), 25.0, Group::A),
        ];

        let (kept, removed) = remove_cross_group_visitors(&orders);

        assert_eq!(removed.into_iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(
            kept.iter().map(|o| o.transaction_id).collect::<Vec<_>>(),
            vec![3, 4, 5]
        );
    }

    #[test]
    fn keeps_everything_when_groups_are_disjoint() {
        let orders = vec![
            Order::new(1, 10, day(1), 100.0, Group::A),
            Order::new(2, 11, day(1), 50.0, Group::B),
        ];

        let (kept, removed) = remove_cross_group_visitors(&orders);
        assert!(removed.is_empty());
        assert_eq!(kept, orders);
    }

    #[test]
    fn load_reports_missing_files() {
        let config = DataConfig {
            hypotheses: "/nonexistent/h.csv".into(),
            hypotheses_delimiter: b';',
            orders: "/nonexistent/o.csv".into(),
            visits: "/nonexistent/v.csv".into(),
        };
        assert!(Dataset::load(&config).is_err());
    }
}
