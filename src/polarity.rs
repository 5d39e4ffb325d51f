//! Lexicon-based sentiment scoring.
//!
//! The lexicon is the semantic-orientation table of Japanese words
//! (`word:reading:pos:score`, one entry per line, scores in `[-1, 1]`). It is
//! read from a local snapshot once per run; fetching it over the network is
//! left to the caller.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use encoding_rs::{SHIFT_JIS, UTF_8};
use log::{info, warn};
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::tokenizer::Token;

/// Word → polarity score table. Read-only after loading.
#[derive(Debug, Clone, Default)]
pub struct PolarityLexicon {
    entries: HashMap<String, f64>,
}

impl PolarityLexicon {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| AnalysisError::Lexicon {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let lexicon = Self::parse(&decode(&bytes));
        if lexicon.is_empty() {
            return Err(AnalysisError::Lexicon {
                path: path.to_path_buf(),
                reason: "no usable entries".to_string(),
            });
        }
        info!("loaded {} polarity entries from {}", lexicon.len(), path.display());
        Ok(lexicon)
    }

    /// Parses lexicon text. Malformed lines and out-of-range scores are
    /// skipped; a repeated word keeps its last score.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 4 {
                warn!("lexicon line {}: expected word:reading:pos:score", line_no + 1);
                continue;
            }
            match fields[3].trim().parse::<f64>() {
                Ok(score) if (-1.0..=1.0).contains(&score) => {
                    entries.insert(fields[0].trim().to_string(), score);
                }
                _ => warn!("lexicon line {}: unusable score {:?}", line_no + 1, fields[3]),
            }
        }
        Self { entries }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(w, s)| (w.into(), s)).collect(),
        }
    }

    pub fn get(&self, word: &str) -> Option<f64> {
        self.entries.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// The published table is Shift_JIS; local snapshots are often re-saved as UTF-8.
fn decode(bytes: &[u8]) -> String {
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(
        bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
    ) {
        return text.into_owned();
    }
    let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
    if had_errors {
        warn!("lexicon is neither valid UTF-8 nor Shift_JIS; undecodable bytes were replaced");
    }
    text.into_owned()
}

/// Sentiment of one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentScore {
    /// Sum of matched scores divided by the token count.
    pub score: f64,
    /// Matched terms with a positive score, as `term(0.00)`.
    pub positive: Vec<String>,
    /// Matched terms with a negative score, as `term(-0.00)`.
    pub negative: Vec<String>,
}

pub struct PolarityScorer {
    lexicon: PolarityLexicon,
}

impl PolarityScorer {
    pub fn new(lexicon: PolarityLexicon) -> Self {
        Self { lexicon }
    }

    /// Loads the lexicon, or returns `None` (with a warning) when it is
    /// unavailable so the run can continue without sentiment output.
    pub fn load_optional(path: impl AsRef<Path>) -> Option<Self> {
        match PolarityLexicon::load(path) {
            Ok(lexicon) => Some(Self::new(lexicon)),
            Err(e) => {
                warn!("{e}; sentiment scoring is disabled");
                None
            }
        }
    }

    pub fn lexicon(&self) -> &PolarityLexicon {
        &self.lexicon
    }

    pub fn score(&self, tokens: &[Token]) -> SentimentScore {
        let mut total = 0.0;
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        for token in tokens {
            let term = token.term();
            let Some(score) = self.lexicon.get(term) else {
                continue;
            };
            total += score;
            if score > 0.0 {
                positive.push(format!("{term}({score:.2})"));
            } else if score < 0.0 {
                negative.push(format!("{term}({score:.2})"));
            }
        }

        let score = if tokens.is_empty() {
            0.0
        } else {
            total / tokens.len() as f64
        };
        SentimentScore {
            score,
            positive,
            negative,
        }
    }
}
