//! A/B Test Decision Library
//!
//! This library provides tools to:
//! - Load hypotheses, orders and visits from CSV files
//! - Prioritize hypotheses with ICE and RICE
//! - Build cumulative revenue, order size and conversion per group
//! - Detect anomalous visitors and test group differences (Mann-Whitney U)
//! - Decide whether to stop the test, and report it as table, JSON or YAML

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod report;

// Re-export common types
pub use config::Config;
pub use dataset::Dataset;
pub use error::{Error, Result};

pub mod commands;
