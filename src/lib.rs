#![forbid(unsafe_code)]
//! # rating_words
//!
//! Finds the vocabulary of course-evaluation comments that goes with high
//! versus low ratings, and scores comment sentiment against a polarity
//! lexicon.
//!
//! The pipeline reads survey exports (CSV), normalizes the free text, runs a
//! morphological analyzer over it, and then
//! - scores each comment against a polarity lexicon (optional),
//! - builds a TF-IDF matrix over content words, labels every comment by a
//!   median split of the ratings, fits an L2-regularized logistic regression
//!   and reports the terms with the largest and smallest coefficients.
//!
//! Output is written per input file (`<stem>_<YYYYMMDD>_<HHMMSS>_<kind>.<ext>`),
//! all artifacts of a file or none of them.
//!
//! ## Example
//! ```
//! use rating_words::build_labels;
//!
//! // Ratings at or above the median are labeled 1.
//! let (labels, median) = build_labels(&[3.0, 4.0, 5.0]).unwrap();
//! assert_eq!(median, 4.0);
//! assert_eq!(labels, vec![0, 1, 1]);
//! ```

pub mod classifier;
pub mod error;
pub mod export;
pub mod features;
pub mod labels;
pub mod normalize;
pub mod polarity;
pub mod ranking;
pub mod records;
pub mod tokenizer;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Local;
use log::{debug, info, warn};
use regex::Regex;
use walkdir::WalkDir;

pub use classifier::{ClassifierModel, LogisticRegression};
pub use error::{AnalysisError, DataInsufficientError, FieldError, Result};
pub use export::{Artifact, ExportFormat, SentimentRow, csv_safe_cell};
pub use features::{FeatureExtractor, FittedExtractor, IdfWeighting, PosClass, TermMatrix};
pub use labels::{LabeledCorpus, build_labels, median, parse_rating};
pub use normalize::{NormalizeOptions, normalize, normalize_bytes, normalize_cell};
pub use polarity::{PolarityLexicon, PolarityScorer, SentimentScore};
pub use ranking::{DEFAULT_TOP_N, RankedWord, RankingReport, rank};
pub use records::{LectureSummary, ReviewRecord, ReviewTable, read_reviews, summarize};
pub use tokenizer::{Document, MorphAnalyzer, Node, Token, Tokenizer, VibratoAnalyzer};

/// Function words that carry no rating signal on their own.
pub const BUILTIN_STOPWORDS: [&str; 32] = [
    "それ", "です", "ある", "いる", "する", "なる", "ない", "こと", "もの", "とき", "ため",
    "ところ", "の", "に", "は", "を", "た", "が", "で", "て", "と", "も", "から", "まで", "や",
    "か", "な", "へ", "より", "など", "だけ", "ばかり",
];

/// Names of files this crate writes; they are skipped when scanning a directory.
static ARTIFACT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_\d{8}_\d{6}_(summary|comments|sentiment|tokens|ranking)\.(csv|tsv)$")
        .expect("valid artifact regex")
});

/// Everything a run can be configured with.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub normalize: NormalizeOptions,
    pub pos_classes: Vec<PosClass>,
    pub min_df: usize,
    pub idf: IdfWeighting,
    /// Extra stopwords, one per line.
    pub stopwords_file: Option<PathBuf>,
    pub builtin_stopwords: bool,
    pub top_n: usize,
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub export_format: ExportFormat,
    /// Fit one ranking over all input files instead of one per file.
    pub combine: bool,
    pub out_dir: PathBuf,
    pub export_tokens: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let trainer = LogisticRegression::new();
        Self {
            normalize: NormalizeOptions::default(),
            pos_classes: PosClass::DEFAULT.to_vec(),
            min_df: 1,
            idf: IdfWeighting::default(),
            stopwords_file: None,
            builtin_stopwords: false,
            top_n: DEFAULT_TOP_N,
            c: trainer.c(),
            max_iter: trainer.max_iter(),
            tol: trainer.tol(),
            export_format: ExportFormat::Txt,
            combine: false,
            out_dir: PathBuf::from("."),
            export_tokens: false,
        }
    }
}

/// Reads a stopword list: one word per line, blank lines ignored.
pub fn load_stopwords(path: &Path) -> Result<HashSet<String>> {
    let bytes = fs::read(path).map_err(|e| AnalysisError::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Returns the CSV files under `path`, sorted. A file path is returned as is.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            !ARTIFACT_NAME.is_match(&name)
        })
        .collect();
    files.sort();
    files
}

/// Prints failed files and their causes to stderr.
pub fn print_failed_files(failed: &[(String, String)]) {
    eprintln!("\nFailed files ({}):", failed.len());
    for (file, cause) in failed {
        eprintln!("  {file}: {cause}");
    }
}

/// Result of analyzing one file, before anything is written.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub records: usize,
    pub dropped: usize,
    pub short_rows: usize,
    pub summaries: Vec<LectureSummary>,
    pub sentiment: Vec<SentimentRow>,
    /// Tokenized comments with a parsed rating, in record order.
    pub samples: Vec<(Document, f64)>,
    pub median: Option<f64>,
    pub ranking: Option<RankingReport>,
    pub artifacts: Vec<Artifact>,
}

/// What happened to one file in a run.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub records: usize,
    pub dropped: usize,
    pub labeled: usize,
    pub median: Option<f64>,
    pub ranking: Option<RankingReport>,
    pub written: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Console summary of the run.
    pub result: String,
    pub files: Vec<FileReport>,
    /// Ranking fitted over all files (`combine` only).
    pub combined: Option<RankingReport>,
    pub combined_written: Vec<PathBuf>,
    /// (file, cause) for every file that was not written.
    pub failed_files: Vec<(String, String)>,
}

/// Owns the analyzer, lexicon and fitting configuration for a run.
pub struct Pipeline<A> {
    tokenizer: Tokenizer<A>,
    scorer: Option<PolarityScorer>,
    extractor: FeatureExtractor,
    trainer: LogisticRegression,
    options: PipelineOptions,
    stamp: String,
}

impl<A: MorphAnalyzer> Pipeline<A> {
    pub fn new(
        analyzer: A,
        scorer: Option<PolarityScorer>,
        options: PipelineOptions,
    ) -> Result<Self> {
        let mut stopwords = HashSet::new();
        if options.builtin_stopwords {
            stopwords.extend(BUILTIN_STOPWORDS.iter().map(|w| w.to_string()));
        }
        if let Some(path) = &options.stopwords_file {
            let extra = load_stopwords(path)?;
            info!("loaded {} stopword(s) from {}", extra.len(), path.display());
            stopwords.extend(extra);
        }
        let extractor = FeatureExtractor {
            allowed: options.pos_classes.clone(),
            min_df: options.min_df,
            idf: options.idf,
            stopwords,
            ..FeatureExtractor::default()
        };
        let trainer = LogisticRegression::new()
            .with_c(options.c)
            .with_max_iter(options.max_iter)
            .with_tolerance(options.tol);
        trainer.validate()?;
        match &scorer {
            Some(scorer) => info!(
                "sentiment scoring with {} lexicon entries",
                scorer.lexicon().len()
            ),
            None => info!("no polarity lexicon; sentiment output disabled"),
        }
        Ok(Self {
            tokenizer: Tokenizer::new(analyzer),
            scorer,
            extractor,
            trainer,
            options,
            stamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Timestamp shared by every file written in this run.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Fits the classifier and ranks the vocabulary of a labeled corpus.
    pub fn fit_ranking(&self, corpus: &LabeledCorpus) -> Result<RankingReport> {
        let (low, high) = corpus
            .ratings()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| (lo.min(r), hi.max(r)));
        debug!(
            "{} labeled document(s), ratings {low:.2}..{high:.2}, median {:.2}",
            corpus.len(),
            corpus.median()
        );
        let (matrix, _) = self.extractor.fit_transform(corpus.documents());
        debug!(
            "term matrix: {} document(s), {} term(s)",
            matrix.n_rows(),
            matrix.n_features()
        );
        let model = self.trainer.fit(&matrix, corpus.labels())?;
        Ok(rank(&model, self.options.top_n))
    }

    /// Reads, scores and (outside combined mode) ranks one file. Renders
    /// every artifact in memory; nothing is written.
    pub fn analyze_file(&mut self, path: &Path) -> Result<FileAnalysis> {
        let table = read_reviews(path)?;
        info!(
            "{}: {} record(s), {} dropped, {} short",
            path.display(),
            table.records.len(),
            table.dropped,
            table.short_rows
        );

        let summaries = summarize(&table.records);

        let mut sentiment = Vec::new();
        let mut samples = Vec::new();
        let mut token_docs: Vec<(&str, Document)> = Vec::new();
        let commented = table.records.iter().filter(|r| r.has_comment());
        for (id, record) in commented.enumerate() {
            let free_text = record.free_text();
            let cleaned = normalize(&free_text, &self.options.normalize);
            if cleaned.is_empty() {
                debug!("{}:{}: comment empty after cleaning", path.display(), record.line);
                continue;
            }
            let document = self.tokenizer.document(id, &cleaned);

            if let Some(scorer) = &self.scorer {
                sentiment.push(SentimentRow {
                    name: record.name.clone(),
                    rating_text: record.rating_text.clone(),
                    free_text,
                    cleaned_text: cleaned,
                    sentiment: scorer.score(&document.tokens),
                });
            }
            if self.options.export_tokens {
                token_docs.push((record.name.as_str(), document.clone()));
            }
            match record.rating() {
                Ok(rating) => samples.push((document, rating)),
                Err(e) => debug!("{}:{}: {e}; not labeled", path.display(), record.line),
            }
        }

        let mut artifacts = vec![
            export::summary_csv(&summaries)?,
            export::comments_csv(&table.records)?,
        ];
        if self.scorer.is_some() {
            artifacts.push(export::sentiment_csv(&sentiment)?);
        }
        if self.options.export_tokens {
            let docs: Vec<(&str, &Document)> = token_docs.iter().map(|(n, d)| (*n, d)).collect();
            artifacts.push(export::tokens_csv(&docs)?);
        }

        let (median, ranking) = if self.options.combine {
            (None, None)
        } else {
            let corpus = LabeledCorpus::build(samples.clone())?;
            let ranking = self.fit_ranking(&corpus)?;
            artifacts.push(export::ranking_artifact(&ranking, self.options.export_format)?);
            (Some(corpus.median()), Some(ranking))
        };

        Ok(FileAnalysis {
            path: path.to_path_buf(),
            records: table.records.len(),
            dropped: table.dropped,
            short_rows: table.short_rows,
            summaries,
            sentiment,
            samples,
            median,
            ranking,
            artifacts,
        })
    }

    /// Analyzes a file and writes its artifacts as `<stem>_<stamp>_<kind>.<ext>`.
    pub fn process_file(
        &mut self,
        path: &Path,
        stem: &str,
    ) -> Result<(FileReport, Vec<(Document, f64)>)> {
        let analysis = self.analyze_file(path)?;
        let written = export::write_artifacts(
            &self.options.out_dir,
            stem,
            &self.stamp,
            &analysis.artifacts,
        )?;
        for file in &written {
            debug!("wrote {}", file.display());
        }
        let report = FileReport {
            path: analysis.path,
            records: analysis.records,
            dropped: analysis.dropped,
            labeled: analysis.samples.len(),
            median: analysis.median,
            ranking: analysis.ranking,
            written,
        };
        Ok((report, analysis.samples))
    }

    /// Runs over a file or every CSV file in a directory. Per-file failures
    /// are collected in `failed_files`; a missing input path or a failed
    /// combined fit fails the run.
    pub fn analyze_path(&mut self, path: &Path) -> Result<RunReport> {
        if !path.exists() {
            return Err(AnalysisError::InputNotFound(path.to_path_buf()));
        }
        let files = collect_files(path);
        if files.is_empty() {
            warn!("no CSV files found under {}", path.display());
        }

        let mut report = RunReport::default();
        let mut pooled: Vec<(Document, f64)> = Vec::new();
        let mut stems: HashSet<String> = HashSet::new();
        if self.options.combine {
            stems.insert(COMBINED_STEM.to_string());
        }
        for file in &files {
            let stem = output_stem(path, file);
            if !stems.insert(stem.clone()) {
                let e = AnalysisError::OutputCollision {
                    path: file.clone(),
                    stem,
                };
                warn!("{e}");
                report
                    .failed_files
                    .push((file.display().to_string(), e.to_string()));
                continue;
            }
            match self.process_file(file, &stem) {
                Ok((file_report, samples)) => {
                    report.result.push_str(&render_file_report(&file_report));
                    report.files.push(file_report);
                    if self.options.combine {
                        for (document, rating) in samples {
                            let id = pooled.len();
                            pooled.push((Document { id, ..document }, rating));
                        }
                    }
                }
                Err(e) => {
                    warn!("{}: {e}", file.display());
                    report
                        .failed_files
                        .push((file.display().to_string(), e.to_string()));
                }
            }
        }

        if self.options.combine && !report.files.is_empty() {
            let corpus = LabeledCorpus::build(pooled)?;
            let ranking = self.fit_ranking(&corpus)?;
            let artifact = export::ranking_artifact(&ranking, self.options.export_format)?;
            report.combined_written = export::write_artifacts(
                &self.options.out_dir,
                COMBINED_STEM,
                &self.stamp,
                &[artifact],
            )?;
            report.result.push_str(&format!(
                "== combined ({} file(s), {} labeled comment(s), median {:.2}) ==\n",
                report.files.len(),
                corpus.len(),
                corpus.median()
            ));
            report.result.push_str(&export::render_ranking_text(&ranking));
            report.combined = Some(ranking);
        }
        Ok(report)
    }
}

const COMBINED_STEM: &str = "combined";

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// Output stem for `file` found under `root`: subdirectories below the root
/// are prefixed, so `2024/前期.csv` becomes `2024_前期`.
pub fn output_stem(root: &Path, file: &Path) -> String {
    let mut parts: Vec<String> = file
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|dir| {
            dir.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    parts.push(file_stem(file));
    parts.join("_")
}

fn render_file_report(report: &FileReport) -> String {
    let mut out = format!(
        "== {} ({} record(s), {} dropped, {} labeled) ==\n",
        report.path.display(),
        report.records,
        report.dropped,
        report.labeled
    );
    if let Some(median) = report.median {
        out.push_str(&format!("median rating: {median:.2}\n"));
    }
    if let Some(ranking) = &report.ranking {
        out.push_str(&export::render_ranking_text(ranking));
    }
    out.push('\n');
    out
}
