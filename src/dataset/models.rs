//! Data models for the experiment tables

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test group label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::A, Group::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::A => "A",
            Group::B => "B",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Candidate hypothesis with its prioritization inputs (1..=10 scales).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    #[serde(rename = "hypothesis", alias = "Hypothesis")]
    pub description: String,
    #[serde(alias = "Reach")]
    pub reach: u32,
    #[serde(alias = "Impact")]
    pub impact: u32,
    #[serde(alias = "Confidence")]
    pub confidence: u32,
    #[serde(alias = "Effort")]
    pub effort: u32,
}

impl Hypothesis {
    pub fn new(
        description: impl Into<String>,
        reach: u32,
        impact: u32,
        confidence: u32,
        effort: u32,
    ) -> Self {
        Self {
            description: description.into(),
            reach,
            impact,
            confidence,
            effort,
        }
    }
}

/// A single purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "transactionId")]
    pub transaction_id: u64,
    #[serde(alias = "visitorId")]
    pub visitor_id: u64,
    pub date: NaiveDate,
    pub revenue: f64,
    pub group: Group,
}

impl Order {
    pub fn new(
        transaction_id: u64,
        visitor_id: u64,
        date: NaiveDate,
        revenue: f64,
        group: Group,
    ) -> Self {
        Self {
            transaction_id,
            visitor_id,
            date,
            revenue,
            group,
        }
    }
}

/// Daily visit count for a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub date: NaiveDate,
    pub group: Group,
    pub visits: u64,
}

impl Visit {
    pub fn new(date: NaiveDate, group: Group, visits: u64) -> Self {
        Self {
            date,
            group,
            visits,
        }
    }
}
