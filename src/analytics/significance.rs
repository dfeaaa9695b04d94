//! Mann-Whitney U significance tests between the two groups.
//!
//! Two metrics are compared, each on raw and on filtered data:
//! - conversion: orders per visitor, with zeros for visitors who bought nothing
//! - order value: revenue of each order

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{info, warn};

use super::outliers::orders_per_visitor;
use crate::dataset::{Group, Order, Visit};
use crate::{Error, Result};

/// Above this size on both sides the exact null distribution is not used.
const EXACT_MAX_SAMPLE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    Exact,
    Asymptotic,
    /// One of the samples was empty; no test was run.
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Conversion,
    OrderValue,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Conversion => "conversion",
            Metric::OrderValue => "order_value",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Raw,
    Filtered,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Raw => "raw",
            SampleKind::Filtered => "filtered",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of a two-sided Mann-Whitney U test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MannWhitneyResult {
    /// U statistic of the first sample.
    pub u_statistic: f64,
    pub p_value: f64,
    pub method: TestMethod,
}

/// Two-sided Mann-Whitney U test.
///
/// Uses the exact null distribution when one sample has at most 8 values and
/// there are no ties; otherwise the normal approximation with tie and
/// continuity corrections.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<MannWhitneyResult> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::EmptyData(
            "Mann-Whitney U test needs two non-empty samples".to_string(),
        ));
    }
    if a.iter().chain(b).any(|v| !v.is_finite()) {
        return Err(Error::InvalidArgument(
            "Mann-Whitney U test samples must be finite".to_string(),
        ));
    }

    let n1 = a.len();
    let n2 = b.len();
    let (ranks, tie_sizes) = rank_with_ties(a, b);

    let r1: f64 = ranks[..n1].iter().sum();
    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;
    let u = u1.max(u2);

    let has_ties = !tie_sizes.is_empty();
    let (p_one_side, method) = if (n1 <= EXACT_MAX_SAMPLE || n2 <= EXACT_MAX_SAMPLE) && !has_ties {
        (exact_sf(u.round() as usize, n1, n2), TestMethod::Exact)
    } else {
        (asymptotic_sf(u, n1, n2, &tie_sizes)?, TestMethod::Asymptotic)
    };

    Ok(MannWhitneyResult {
        u_statistic: u1,
        p_value: (2.0 * p_one_side).clamp(0.0, 1.0),
        method,
    })
}

/// Average ranks (1-based) of `a` followed by `b`, and the sizes of tie groups.
fn rank_with_ties(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let values: Vec<f64> = a.iter().chain(b).copied().collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        if end - start > 1 {
            tie_sizes.push(end - start);
        }
        start = end;
    }

    (ranks, tie_sizes)
}

/// `P(U >= u)` under the normal approximation.
fn asymptotic_sf(u: f64, n1: usize, n2: usize, tie_sizes: &[usize]) -> Result<f64> {
    let n1 = n1 as f64;
    let n2 = n2 as f64;
    let n = n1 + n2;
    let mu = n1 * n2 / 2.0;

    let tie_term: f64 = tie_sizes
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 {
        // every value identical
        return Ok(1.0);
    }

    let z = (u - mu - 0.5) / variance.sqrt();
    let normal = Normal::new(0.0, 1.0)?;
    Ok(normal.cdf(-z))
}

/// `P(U >= u)` from the exact null distribution.
///
/// The count of arrangements with a given U is the coefficient of the
/// Gaussian binomial `[n1 + n2 choose k]_q`, `k = min(n1, n2)`. Coefficients
/// are kept as probabilities (the product is rescaled by `i / (m + i)` at each
/// step) so large samples cannot overflow. The distribution is symmetric, so
/// the upper tail is read from the lower coefficients, which are built from
/// additions only and keep full relative precision for tiny p-values.
fn exact_sf(u: usize, n1: usize, n2: usize) -> f64 {
    let k = n1.min(n2);
    let m = n1.max(n2);
    let max_u = k * m;
    if u > max_u {
        return 0.0;
    }

    // P(U >= u) == P(U <= max_u - u)
    let upper = max_u - u;
    let mut poly = vec![0.0_f64; upper + 1];
    poly[0] = 1.0;
    for i in 1..=k {
        let shift = m + i;
        for idx in (shift..=upper).rev() {
            poly[idx] -= poly[idx - shift];
        }
        for idx in i..=upper {
            poly[idx] += poly[idx - i];
        }
        let scale = i as f64 / shift as f64;
        for coeff in poly.iter_mut() {
            *coeff *= scale;
        }
    }

    poly.iter().sum::<f64>().clamp(0.0, 1.0)
}

/// Mean of the values; `None` when empty.
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// `mean(b) / mean(a) - 1`; `None` when either is empty or `mean(a)` is zero.
pub fn relative_mean_difference(a: &[f64], b: &[f64]) -> Option<f64> {
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;
    if mean_a == 0.0 {
        return None;
    }
    Some(mean_b / mean_a - 1.0)
}

/// Per-visitor order counts of one group, zero-padded up to the group's total visits.
///
/// Anomalous buyers are dropped, but the padding is still sized from the raw
/// buyer count.
pub fn conversion_sample(
    orders: &[Order],
    visits: &[Visit],
    group: Group,
    anomalous: Option<&BTreeSet<u64>>,
) -> Vec<f64> {
    let buyers: Vec<_> = orders_per_visitor(orders)
        .into_iter()
        .filter(|v| v.group == group)
        .collect();
    let total_visits: u64 = visits
        .iter()
        .filter(|v| v.group == group)
        .map(|v| v.visits)
        .sum();
    let padding = total_visits.saturating_sub(buyers.len() as u64) as usize;

    let mut sample: Vec<f64> = buyers
        .iter()
        .filter(|v| anomalous.map_or(true, |set| !set.contains(&v.visitor_id)))
        .map(|v| v.orders as f64)
        .collect();
    sample.resize(sample.len() + padding, 0.0);
    sample
}

/// Revenue of each order of one group, optionally without anomalous visitors.
pub fn order_value_sample(
    orders: &[Order],
    group: Group,
    anomalous: Option<&BTreeSet<u64>>,
) -> Vec<f64> {
    orders
        .iter()
        .filter(|o| o.group == group)
        .filter(|o| anomalous.map_or(true, |set| !set.contains(&o.visitor_id)))
        .map(|o| o.revenue)
        .collect()
}

/// One metric compared between A and B.
///
/// `u_statistic` and `p_value` are `None` when a sample was empty; such a
/// comparison is never significant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceResult {
    pub metric: Metric,
    pub sample: SampleKind,
    pub size_a: usize,
    pub size_b: usize,
    pub mean_a: Option<f64>,
    pub mean_b: Option<f64>,
    pub u_statistic: Option<f64>,
    pub p_value: Option<f64>,
    /// `mean(B) / mean(A) - 1`
    pub relative_difference: Option<f64>,
    pub method: TestMethod,
    pub significant: bool,
}

impl SignificanceResult {
    /// Group with the higher sample mean, if the means differ.
    pub fn leader(&self) -> Option<Group> {
        match (self.mean_a, self.mean_b) {
            (Some(a), Some(b)) if b > a => Some(Group::B),
            (Some(a), Some(b)) if a > b => Some(Group::A),
            _ => None,
        }
    }

    /// Significant at the chosen alpha; untested comparisons never are.
    pub fn is_significant(&self) -> bool {
        self.significant && self.p_value.is_some()
    }
}

/// Run the test on prepared samples and label the result.
///
/// An empty sample yields an untested result instead of an error.
pub fn compare_samples(
    metric: Metric,
    sample: SampleKind,
    a: &[f64],
    b: &[f64],
    alpha: f64,
) -> Result<SignificanceResult> {
    let mut result = SignificanceResult {
        metric,
        sample,
        size_a: a.len(),
        size_b: b.len(),
        mean_a: mean(a),
        mean_b: mean(b),
        u_statistic: None,
        p_value: None,
        relative_difference: relative_mean_difference(a, b),
        method: TestMethod::InsufficientData,
        significant: false,
    };

    if a.is_empty() || b.is_empty() {
        warn!(
            metric = %metric,
            sample = %sample,
            size_a = a.len(),
            size_b = b.len(),
            "Not enough data for Mann-Whitney U test"
        );
        return Ok(result);
    }

    let test = mann_whitney_u(a, b)?;
    result.u_statistic = Some(test.u_statistic);
    result.p_value = Some(test.p_value);
    result.method = test.method;
    result.significant = test.p_value < alpha;

    info!(
        metric = %metric,
        sample = %sample,
        p_value = test.p_value,
        relative_difference = ?result.relative_difference,
        significant = result.significant,
        "Mann-Whitney U test"
    );
    Ok(result)
}

/// Conversion and order-value tests on raw and filtered data, in that order:
/// conversion/raw, order_value/raw, conversion/filtered, order_value/filtered.
pub fn run_all(
    orders: &[Order],
    visits: &[Visit],
    anomalous: &BTreeSet<u64>,
    alpha: f64,
) -> Result<Vec<SignificanceResult>> {
    let mut results = Vec::with_capacity(4);
    for (kind, filter) in [(SampleKind::Raw, None), (SampleKind::Filtered, Some(anomalous))] {
        let conv_a = conversion_sample(orders, visits, Group::A, filter);
        let conv_b = conversion_sample(orders, visits, Group::B, filter);
        results.push(compare_samples(
            Metric::Conversion,
            kind,
            &conv_a,
            &conv_b,
            alpha,
        )?);

        let value_a = order_value_sample(orders, Group::A, filter);
        let value_b = order_value_sample(orders, Group::B, filter);
        results.push(compare_samples(
            Metric::OrderValue,
            kind,
            &value_a,
            &value_b,
            alpha,
        )?);
    }
    Ok(results)
}
