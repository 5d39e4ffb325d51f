//! Morphological tokenization.
//!
//! The analyzer itself is external: anything implementing [`MorphAnalyzer`]
//! can be plugged into a [`Tokenizer`]. [`VibratoAnalyzer`] is the production
//! implementation, backed by a MeCab-compatible dictionary loaded through
//! `vibrato`. Building one reads the whole dictionary, so a run creates it
//! once and hands the [`Tokenizer`] to the pipeline.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// One lattice node as reported by an analyzer: the surface string and its
/// comma-separated feature string. Boundary nodes have an empty surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub surface: String,
    pub feature: String,
}

impl Node {
    pub fn new(surface: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            feature: feature.into(),
        }
    }
}

/// A stateful morphological analyzer. Nodes must come back in surface order.
pub trait MorphAnalyzer {
    fn parse_nodes(&mut self, text: &str) -> Vec<Node>;
}

/// A morphological token in the IPADIC layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub surface: String,
    pub pos_major: String,
    pub pos_minor1: String,
    pub pos_minor2: String,
    pub pos_minor3: String,
    pub conjugation_type: String,
    pub conjugation_form: String,
    pub base_form: Option<String>,
    pub reading: Option<String>,
    pub pronunciation: Option<String>,
}

impl Token {
    /// Parses `pos,pos1,pos2,pos3,ctype,cform,base,reading,pronunciation`.
    /// Short feature strings (unknown words) leave the tail absent.
    pub fn from_node(surface: &str, feature: &str) -> Self {
        let fields: Vec<&str> = feature.split(',').collect();
        let tag = |i: usize| fields.get(i).map_or("*", |f| f.trim()).to_string();
        let optional = |i: usize| {
            fields
                .get(i)
                .map(|f| f.trim())
                .filter(|f| !f.is_empty() && *f != "*")
                .map(str::to_string)
        };
        Self {
            surface: surface.to_string(),
            pos_major: tag(0),
            pos_minor1: tag(1),
            pos_minor2: tag(2),
            pos_minor3: tag(3),
            conjugation_type: tag(4),
            conjugation_form: tag(5),
            base_form: optional(6),
            reading: optional(7),
            pronunciation: optional(8),
        }
    }

    /// Dictionary form when known, otherwise the surface string.
    pub fn term(&self) -> &str {
        self.base_form.as_deref().unwrap_or(&self.surface)
    }
}

/// A tokenized text. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: usize,
    pub tokens: Vec<Token>,
}

/// Owns the analyzer for the lifetime of a run.
pub struct Tokenizer<A> {
    analyzer: A,
}

impl<A: MorphAnalyzer> Tokenizer<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }

    pub fn tokenize(&mut self, text: &str) -> Vec<Token> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.analyzer
            .parse_nodes(text)
            .into_iter()
            .filter(|node| !node.surface.is_empty())
            .map(|node| Token::from_node(&node.surface, &node.feature))
            .collect()
    }

    pub fn document(&mut self, id: usize, text: &str) -> Document {
        Document {
            id,
            tokens: self.tokenize(text),
        }
    }
}

/// MeCab-compatible analyzer on top of a compiled `vibrato` dictionary
/// (`system.dic`, or `system.dic.zst` when zstd-compressed).
pub struct VibratoAnalyzer {
    tokenizer: vibrato::Tokenizer,
}

impl VibratoAnalyzer {
    pub fn from_path(dictionary: impl AsRef<Path>) -> Result<Self> {
        let dictionary = dictionary.as_ref();
        let init_error = |reason: String| AnalysisError::TokenizerInit {
            dictionary: PathBuf::from(dictionary),
            reason,
        };

        let file = File::open(dictionary).map_err(|e| init_error(e.to_string()))?;
        let reader = BufReader::new(file);
        let compressed = dictionary
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zst"));
        let dict = if compressed {
            let decoder = zstd::stream::read::Decoder::new(reader)
                .map_err(|e| init_error(e.to_string()))?;
            read_dictionary(decoder)
        } else {
            read_dictionary(reader)
        }
        .map_err(init_error)?;

        debug!("loaded analyzer dictionary {}", dictionary.display());
        Ok(Self {
            tokenizer: vibrato::Tokenizer::new(dict),
        })
    }
}

fn read_dictionary<R: Read>(reader: R) -> std::result::Result<vibrato::Dictionary, String> {
    vibrato::Dictionary::read(reader).map_err(|e| e.to_string())
}

impl MorphAnalyzer for VibratoAnalyzer {
    fn parse_nodes(&mut self, text: &str) -> Vec<Node> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize();
        (0..worker.num_tokens())
            .map(|i| {
                let token = worker.token(i);
                Node::new(token.surface(), token.feature())
            })
            .collect()
    }
}
