//! Cumulative metrics command.

use serde::Serialize;
use std::path::PathBuf;

use super::ExperimentData;
use crate::analytics::ab_testing::{render_series, CumulativeSeries};
use crate::analytics::cumulative::{
    aggregate, daily_conversion, CumulativeRecord, DailyConversion,
};
use crate::config::Config;
use crate::error::Result;
use crate::report::{emit, OutputFormat};

#[derive(Debug, Clone, Serialize)]
pub struct CumulativeView {
    pub cross_group_visitors: usize,
    pub records: Vec<CumulativeRecord>,
    pub series: CumulativeSeries,
    pub daily_conversion: Vec<DailyConversion>,
}

impl CumulativeView {
    pub fn build(data: &ExperimentData) -> Self {
        let records = aggregate(&data.orders, &data.visits);
        let series = CumulativeSeries::from_records(&records);
        Self {
            cross_group_visitors: data.cross_group_visitors,
            daily_conversion: daily_conversion(&data.orders, &data.visits),
            records,
            series,
        }
    }
}

pub fn render_table(view: &CumulativeView) -> String {
    let mut out = format!(
        "{:10} {:>5} {:>7} {:>7} {:>12} {:>9} {:>10} {:>10}\n",
        "Date", "Group", "Orders", "Buyers", "Revenue", "Visitors", "Conversion", "Avg order"
    );
    for r in &view.records {
        out.push_str(&format!(
            "{:10} {:>5} {:>7} {:>7} {:>12.2} {:>9} {:>10.4} {:>10.2}\n",
            r.date.format("%Y-%m-%d"),
            r.group,
            r.orders,
            r.buyers,
            r.revenue,
            r.visitors,
            r.conversion(),
            r.average_order_size()
        ));
    }

    out.push_str("\n📈 Series\n");
    out.push_str(&render_series(&view.series));

    if view.cross_group_visitors > 0 {
        out.push_str(&format!(
            "\n{} visitors present in both groups were excluded\n",
            view.cross_group_visitors
        ));
    }
    out
}

pub fn run(config: &Config, format: &str, output: Option<PathBuf>) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let data = ExperimentData::load(config)?;
    let view = CumulativeView::build(&data);
    emit(&view, fmt, output.as_deref(), render_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Group, Order, Visit};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 8, d).unwrap()
    }

    fn data() -> ExperimentData {
        let orders = vec![
            Order::new(1, 10, day(1), 100.0, Group::A),
            Order::new(2, 20, day(1), 150.0, Group::B),
            Order::new(3, 11, day(2), 50.0, Group::A),
            Order::new(4, 30, day(2), 70.0, Group::A),
            Order::new(5, 30, day(2), 80.0, Group::B),
        ];
        let visits = vec![
            Visit::new(day(1), Group::A, 10),
            Visit::new(day(1), Group::B, 10),
            Visit::new(day(2), Group::A, 10),
            Visit::new(day(2), Group::B, 10),
        ];
        ExperimentData::prepare(orders, visits, true)
    }

    #[test]
    fn builds_view_without_cross_group_visitor() {
        let view = CumulativeView::build(&data());
        assert_eq!(view.cross_group_visitors, 1);
        // B has no orders left on day 2
        assert_eq!(view.records.len(), 3);
        let last_a = view
            .records
            .iter()
            .filter(|r| r.group == Group::A)
            .last()
            .unwrap();
        assert_eq!(last_a.orders, 2);
        assert_eq!(last_a.visitors, 20);
        assert!((last_a.revenue - 150.0).abs() < 1e-9);
        assert_eq!(view.daily_conversion.len(), 4);
    }

    #[test]
    fn table_lists_rows_and_series() {
        let table = render_table(&CumulativeView::build(&data()));
        assert!(table.contains("2019-08-01"));
        assert!(table.contains("Revenue A"));
        assert!(table.contains("1 visitors present in both groups"));
    }
}
