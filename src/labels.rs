//! Rating parsing and the median split into high/low labels.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DataInsufficientError, Result};
use crate::tokenizer::Document;

static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.[0-9]+").expect("valid rating regex"));

/// First decimal number (`4.25`, not `4`) found in a rating cell.
pub fn parse_rating(text: &str) -> Option<f64> {
    RATING_RE.find(text)?.as_str().parse().ok()
}

/// Standard median (mean of the two middle values for even counts).
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Labels each rating `1` when it is at or above the corpus median, else `0`.
/// A rating equal to the median counts as high.
pub fn build_labels(ratings: &[f64]) -> Result<(Vec<u8>, f64), DataInsufficientError> {
    let median = median(ratings).ok_or(DataInsufficientError {
        documents: 0,
        classes: 0,
    })?;
    let labels = ratings.iter().map(|&r| u8::from(r >= median)).collect();
    Ok((labels, median))
}

/// Tokenized documents paired with their binary labels.
#[derive(Debug, Clone)]
pub struct LabeledCorpus {
    documents: Vec<Document>,
    ratings: Vec<f64>,
    labels: Vec<u8>,
    median: f64,
}

impl LabeledCorpus {
    /// Builds the corpus in one step from `(document, rating)` pairs.
    pub fn build(samples: Vec<(Document, f64)>) -> Result<Self> {
        let (documents, ratings): (Vec<Document>, Vec<f64>) = samples.into_iter().unzip();
        let (labels, median) = build_labels(&ratings)?;
        Ok(Self {
            documents,
            ratings,
            labels,
            median,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn ratings(&self) -> &[f64] {
        &self.ratings
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn median(&self) -> f64 {
        self.median
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
