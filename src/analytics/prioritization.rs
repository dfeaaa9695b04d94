//! ICE / RICE hypothesis prioritization.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::dataset::Hypothesis;
use crate::{Error, Result};

/// Scoring framework used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Ice,
    Rice,
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framework::Ice => f.write_str("ICE"),
            Framework::Rice => f.write_str("RICE"),
        }
    }
}

impl FromStr for Framework {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ice" => Ok(Framework::Ice),
            "rice" => Ok(Framework::Rice),
            other => Err(Error::InvalidArgument(format!(
                "Unsupported framework '{}'. Use ice|rice",
                other
            ))),
        }
    }
}

/// Hypothesis with both scores and its position in the input table.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredHypothesis {
    pub index: usize,
    pub hypothesis: String,
    pub ice: f64,
    pub rice: f64,
}

impl ScoredHypothesis {
    pub fn score(&self, framework: Framework) -> f64 {
        match framework {
            Framework::Ice => self.ice,
            Framework::Rice => self.rice,
        }
    }
}

/// `impact * confidence / effort`
pub fn ice_score(h: &Hypothesis) -> Result<f64> {
    let effort = checked_effort(h)?;
    Ok(f64::from(h.impact) * f64::from(h.confidence) / effort)
}

/// `reach * impact * confidence / effort`
pub fn rice_score(h: &Hypothesis) -> Result<f64> {
    let effort = checked_effort(h)?;
    Ok(f64::from(h.reach) * f64::from(h.impact) * f64::from(h.confidence) / effort)
}

fn checked_effort(h: &Hypothesis) -> Result<f64> {
    if h.effort == 0 {
        return Err(Error::InvalidArgument(format!(
            "Effort must be positive for hypothesis '{}'",
            h.description
        )));
    }
    Ok(f64::from(h.effort))
}

/// Score every hypothesis, keeping input order.
pub fn score_all(hypotheses: &[Hypothesis]) -> Result<Vec<ScoredHypothesis>> {
    hypotheses
        .iter()
        .enumerate()
        .map(|(index, h)| {
            Ok(ScoredHypothesis {
                index,
                hypothesis: h.description.clone(),
                ice: ice_score(h)?,
                rice: rice_score(h)?,
            })
        })
        .collect()
}

/// Scored hypotheses sorted by the framework's score, highest first.
///
/// Equal scores keep their input order.
pub fn rank_by(hypotheses: &[Hypothesis], framework: Framework) -> Result<Vec<ScoredHypothesis>> {
    let mut scored = score_all(hypotheses)?;
    scored.sort_by(|a, b| b.score(framework).total_cmp(&a.score(framework)));
    Ok(scored)
}
