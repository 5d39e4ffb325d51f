//! Part-of-speech filtering and TF-IDF vectorization.

use std::collections::{BTreeMap, HashMap, HashSet};

use clap::ValueEnum;
use serde::Serialize;

use crate::tokenizer::{Document, Token};

/// Word classes kept as features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
pub enum PosClass {
    Noun,
    Verb,
    Adjective,
    AdjectivalNoun,
}

impl PosClass {
    pub const DEFAULT: [PosClass; 4] = [
        PosClass::Noun,
        PosClass::Verb,
        PosClass::Adjective,
        PosClass::AdjectivalNoun,
    ];

    /// Major POS tags (IPADIC, UniDic, plain English) that belong to this class.
    pub fn tags(self) -> &'static [&'static str] {
        match self {
            PosClass::Noun => &["名詞", "noun"],
            PosClass::Verb => &["動詞", "verb"],
            PosClass::Adjective => &["形容詞", "adjective"],
            PosClass::AdjectivalNoun => &["形容動詞", "形状詞", "adjectival-noun"],
        }
    }

    pub fn matches(self, pos_major: &str) -> bool {
        self.tags().iter().any(|tag| tag.eq_ignore_ascii_case(pos_major))
    }
}

/// Inverse document frequency variant. `n` is the number of fitted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum IdfWeighting {
    /// `ln((1 + n) / (1 + df)) + 1`
    #[default]
    Smooth,
    /// `ln(n / df) + 1`
    Plain,
}

impl IdfWeighting {
    fn weight(self, documents: usize, df: usize) -> f64 {
        let n = documents as f64;
        let df = df as f64;
        match self {
            IdfWeighting::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
            IdfWeighting::Plain => (n / df).ln() + 1.0,
        }
    }
}

/// Sparse row: `(feature index, weight)` sorted by index.
pub type SparseRow = Vec<(usize, f64)>;

/// Document × term weights over a fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermMatrix {
    vocabulary: Vec<String>,
    rows: Vec<SparseRow>,
}

impl TermMatrix {
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[(usize, f64)] {
        &self.rows[index]
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Non-zero `term → weight` entries of one row.
    pub fn feature_vector(&self, index: usize) -> BTreeMap<&str, f64> {
        self.rows[index]
            .iter()
            .map(|&(j, w)| (self.vocabulary[j].as_str(), w))
            .collect()
    }
}

/// Feature extraction settings.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    pub allowed: Vec<PosClass>,
    pub min_df: usize,
    pub idf: IdfWeighting,
    pub l2_normalize: bool,
    pub stopwords: HashSet<String>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            allowed: PosClass::DEFAULT.to_vec(),
            min_df: 1,
            idf: IdfWeighting::default(),
            l2_normalize: true,
            stopwords: HashSet::new(),
        }
    }
}

impl FeatureExtractor {
    fn keeps(&self, token: &Token) -> bool {
        self.allowed.iter().any(|class| class.matches(&token.pos_major))
            && !self.stopwords.contains(token.term())
    }

    /// Feature terms of one document, in token order.
    pub fn extract_terms<'d>(&self, document: &'d Document) -> Vec<&'d str> {
        document
            .tokens
            .iter()
            .filter(|token| self.keeps(token))
            .map(Token::term)
            .collect()
    }

    /// Learns the vocabulary and IDF weights from `documents`.
    pub fn fit(&self, documents: &[Document]) -> FittedExtractor {
        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for document in documents {
            let distinct: HashSet<&str> = self.extract_terms(document).into_iter().collect();
            for term in distinct {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let min_df = self.min_df.max(1);
        let (vocabulary, idf): (Vec<String>, Vec<f64>) = document_frequency
            .into_iter()
            .filter(|&(_, df)| df >= min_df)
            .map(|(term, df)| (term.to_string(), self.idf.weight(documents.len(), df)))
            .unzip();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        FittedExtractor {
            extractor: self.clone(),
            vocabulary,
            index,
            idf,
        }
    }

    pub fn fit_transform(&self, documents: &[Document]) -> (TermMatrix, FittedExtractor) {
        let fitted = self.fit(documents);
        (fitted.transform(documents), fitted)
    }
}

/// An extractor with its vocabulary frozen.
#[derive(Debug, Clone)]
pub struct FittedExtractor {
    extractor: FeatureExtractor,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl FittedExtractor {
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index.get(term).map(|&i| self.idf[i])
    }

    /// Vectorizes documents; terms outside the vocabulary are ignored.
    pub fn transform(&self, documents: &[Document]) -> TermMatrix {
        let rows = documents.iter().map(|doc| self.transform_one(doc)).collect();
        TermMatrix {
            vocabulary: self.vocabulary.clone(),
            rows,
        }
    }

    fn transform_one(&self, document: &Document) -> SparseRow {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for term in self.extractor.extract_terms(document) {
            if let Some(&j) = self.index.get(term) {
                *counts.entry(j).or_insert(0) += 1;
            }
        }
        let mut row: SparseRow = counts
            .into_iter()
            .map(|(j, count)| (j, count as f64 * self.idf[j]))
            .collect();

        if self.extractor.l2_normalize {
            let norm = row.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for entry in &mut row {
                    entry.1 /= norm;
                }
            }
        }
        row
    }
}
