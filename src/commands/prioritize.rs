//! Hypothesis prioritization command.
//!
//! Ranks the hypotheses table by ICE, RICE or both, and shows how the two
//! frameworks reorder the same list.

use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::analytics::prioritization::{rank_by, Framework, ScoredHypothesis};
use crate::config::Config;
use crate::dataset::{load_hypotheses, Hypothesis};
use crate::error::{Error, Result};
use crate::report::{emit, truncate, OutputFormat};

const DESCRIPTION_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkChoice {
    Ice,
    Rice,
    Both,
}

impl From<Framework> for FrameworkChoice {
    fn from(framework: Framework) -> Self {
        match framework {
            Framework::Ice => Self::Ice,
            Framework::Rice => Self::Rice,
        }
    }
}

impl FrameworkChoice {
    /// `both` (or `all`), or any single framework name.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "both" | "all" => Ok(Self::Both),
            other => other.parse::<Framework>().map(Self::from).map_err(|_| {
                Error::InvalidArgument(format!(
                    "Unsupported framework '{}'. Use ice|rice|both",
                    other
                ))
            }),
        }
    }

    pub fn frameworks(&self) -> Vec<Framework> {
        match self {
            Self::Ice => vec![Framework::Ice],
            Self::Rice => vec![Framework::Rice],
            Self::Both => vec![Framework::Ice, Framework::Rice],
        }
    }
}

/// One framework's ranking.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub framework: Framework,
    pub hypotheses: Vec<ScoredHypothesis>,
}

/// Rank `hypotheses` under each chosen framework, keeping the `top` rows.
pub fn prioritize(
    hypotheses: &[Hypothesis],
    choice: FrameworkChoice,
    top: Option<usize>,
) -> Result<Vec<Ranking>> {
    choice
        .frameworks()
        .into_iter()
        .map(|framework| {
            let mut ranked = rank_by(hypotheses, framework)?;
            if let Some(n) = top {
                ranked.truncate(n);
            }
            Ok(Ranking {
                framework,
                hypotheses: ranked,
            })
        })
        .collect()
}

pub fn render_table(rankings: &[Ranking]) -> String {
    let mut out = String::new();

    for ranking in rankings {
        out.push_str(&format!("📋 {} ranking\n", ranking.framework));
        out.push_str(&format!(
            "{:>4} {:>5} {:>10}  {}\n",
            "Rank", "Idx", "Score", "Hypothesis"
        ));
        for (pos, row) in ranking.hypotheses.iter().enumerate() {
            out.push_str(&format!(
                "{:>4} {:>5} {:>10.2}  {}\n",
                pos + 1,
                row.index,
                row.score(ranking.framework),
                truncate(&row.hypothesis, DESCRIPTION_WIDTH)
            ));
        }
        out.push('\n');
    }

    if let [ice, rice] = rankings {
        out.push_str(&format!("🔀 {} → {} rank shifts\n", ice.framework, rice.framework));
        for (ice_pos, row) in ice.hypotheses.iter().enumerate() {
            let rice_pos = rice
                .hypotheses
                .iter()
                .position(|r| r.index == row.index)
                .map(|p| (p + 1).to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "{:>5}  {:>3} → {:>3}  {}\n",
                row.index,
                ice_pos + 1,
                rice_pos,
                truncate(&row.hypothesis, DESCRIPTION_WIDTH)
            ));
        }
    }

    out
}

/// Основная точка входа для CLI.
pub fn run(
    config: &Config,
    framework: &str,
    top: Option<usize>,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;
    let choice = FrameworkChoice::parse(framework)?;

    let hypotheses = load_hypotheses(&config.data.hypotheses, config.data.hypotheses_delimiter)?;
    info!(hypotheses = hypotheses.len(), "Hypotheses loaded");

    let rankings = prioritize(&hypotheses, choice, top)?;
    emit(&rankings, fmt, output.as_deref(), |r| render_table(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Hypothesis> {
        vec![
            Hypothesis::new("Add two new channels", 3, 10, 8, 6),
            Hypothesis::new("Launch own delivery", 2, 5, 4, 10),
            Hypothesis::new("Add subscription form", 10, 7, 8, 5),
        ]
    }

    #[test]
    fn framework_choice_parse() {
        assert_eq!(FrameworkChoice::parse("ICE").unwrap(), FrameworkChoice::Ice);
        assert_eq!(FrameworkChoice::parse("both").unwrap(), FrameworkChoice::Both);
        assert_eq!(FrameworkChoice::parse(" Rice ").unwrap(), FrameworkChoice::Rice);
        assert!(FrameworkChoice::parse("kano").is_err());
    }

    #[test]
    fn both_frameworks_produce_two_rankings() {
        let rankings = prioritize(&sample(), FrameworkChoice::Both, None).unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].framework, Framework::Ice);
        assert_eq!(rankings[1].framework, Framework::Rice);
        // ICE: 13.33, 2.0, 11.2; RICE: 40, 4, 112
        assert_eq!(rankings[0].hypotheses[0].index, 0);
        assert_eq!(rankings[1].hypotheses[0].index, 2);
    }

    #[test]
    fn top_limits_rows() {
        let rankings = prioritize(&sample(), FrameworkChoice::Rice, Some(1)).unwrap();
        assert_eq!(rankings[0].hypotheses.len(), 1);
    }

    #[test]
    fn table_shows_rank_shifts() {
        let rankings = prioritize(&sample(), FrameworkChoice::Both, None).unwrap();
        let table = render_table(&rankings);
        assert!(table.contains("ICE ranking"));
        assert!(table.contains("RICE ranking"));
        assert!(table.contains("rank shifts"));
        assert!(table.contains("Add subscription form"));
    }
}
