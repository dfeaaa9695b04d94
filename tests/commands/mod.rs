//! Command tests over fixture CSV files written to a temp directory.

mod test_cumulative;
mod test_outliers;
mod test_prioritize;
mod test_report;
mod test_significance;

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use ab_decision::Config;

pub const HYPOTHESES: &str = "\
Hypothesis;Reach;Impact;Confidence;Effort
Add two new channels for attracting traffic;3;10;8;6
Launch your own delivery service;2;5;4;10
Add product recommendation blocks;8;3;7;3
Add a subscription form to all main pages;10;7;8;5
Launch a promotion that gives users discounts on their birthdays;1;9;9;5
";

/// Five days of orders where B converts twice as often as A, plus one
/// 5000 order in B and one visitor who ordered in both groups.
pub fn orders_csv() -> String {
    let mut out = String::from("transactionId,visitorId,date,revenue,group\n");
    let mut txn = 1000;
    for d in 1..=5 {
        for v in 0..3 {
            txn += 1;
            writeln!(out, "{},{},2019-08-0{},{},A", txn, 1000 + d * 10 + v, d, 50 + v * 5).unwrap();
        }
        for v in 0..6 {
            txn += 1;
            writeln!(out, "{},{},2019-08-0{},{},B", txn, 2000 + d * 10 + v, d, 60 + v * 5).unwrap();
        }
    }
    out.push_str("2001,2999,2019-08-03,5000,B\n");
    out.push_str("2002,3000,2019-08-02,40,A\n");
    out.push_str("2003,3000,2019-08-04,45,B\n");
    out
}

pub fn visits_csv() -> String {
    let mut out = String::from("date,group,visits\n");
    for d in 1..=5 {
        writeln!(out, "2019-08-0{},A,100", d).unwrap();
        writeln!(out, "2019-08-0{},B,100", d).unwrap();
    }
    out
}

/// Write the fixture tables into `dir` and point a default config at them.
pub fn fixture_config(dir: &Path) -> Config {
    let hypotheses = dir.join("hypotheses_us.csv");
    let orders = dir.join("orders_us.csv");
    let visits = dir.join("visits_us.csv");
    fs::write(&hypotheses, HYPOTHESES).unwrap();
    fs::write(&orders, orders_csv()).unwrap();
    fs::write(&visits, visits_csv()).unwrap();

    let mut config = Config::defaults();
    config.data.hypotheses = hypotheses;
    config.data.orders = orders;
    config.data.visits = visits;
    config
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}
