//! Vocabulary ranked by learned coefficient.

use std::cmp::Ordering;

use serde::Serialize;

use crate::classifier::ClassifierModel;

pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedWord {
    pub term: String,
    pub weight: f64,
}

/// Terms most associated with high (`positive`) and low (`negative`) ratings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
    pub positive: Vec<RankedWord>,
    pub negative: Vec<RankedWord>,
}

/// Top `top_n` terms in each direction. Equal coefficients are ordered by
/// term, so the output is a total order independent of platform or run.
pub fn rank(model: &ClassifierModel, top_n: usize) -> RankingReport {
    let mut pairs: Vec<(&str, f64)> = model
        .vocabulary
        .iter()
        .map(String::as_str)
        .zip(model.coefficients.iter().copied())
        .collect();

    pairs.sort_by(|a, b| by_weight_then_term(b.1, a.1, a.0, b.0));
    let positive = take(&pairs, top_n);

    pairs.sort_by(|a, b| by_weight_then_term(a.1, b.1, a.0, b.0));
    let negative = take(&pairs, top_n);

    RankingReport { positive, negative }
}

fn by_weight_then_term(wa: f64, wb: f64, ta: &str, tb: &str) -> Ordering {
    wa.total_cmp(&wb).then_with(|| ta.cmp(tb))
}

fn take(pairs: &[(&str, f64)], n: usize) -> Vec<RankedWord> {
    pairs
        .iter()
        .take(n)
        .map(|&(term, weight)| RankedWord {
            term: term.to_string(),
            weight,
        })
        .collect()
}
