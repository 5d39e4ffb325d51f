#![forbid(unsafe_code)]
//! # rating_words CLI
//!
//! Command-line interface for the `rating_words` crate. Reads course
//! evaluation exports (`.csv`), writes per-file summaries, extracted
//! comments, sentiment scores and the ranking of words associated with high
//! and low ratings.
//!
//! ## Example
//! ```bash
//! cargo run --release -- surveys/ --dictionary ipadic-mecab-2_7_0/system.dic.zst \
//!     --lexicon pn_ja.dic --export-format csv
//! ```
//!
//! Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=info`).

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;
use rating_words::{
    AnalysisError, ExportFormat, IdfWeighting, NormalizeOptions, Pipeline, PipelineOptions,
    PolarityLexicon, PolarityScorer, PosClass, Result, VibratoAnalyzer, print_failed_files,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// File or directory of survey exports (.csv)
    path: PathBuf,

    /// Morphological dictionary (vibrato/MeCab system.dic, optionally .zst)
    #[arg(long)]
    dictionary: PathBuf,

    /// Polarity lexicon (word:reading:pos:score per line)
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Fail instead of skipping sentiment scoring when the lexicon cannot be loaded
    #[arg(long, default_value_t = false, requires = "lexicon")]
    require_lexicon: bool,

    /// Optional stopword file (one word per line)
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Also drop common Japanese function words
    #[arg(long, default_value_t = false)]
    builtin_stopwords: bool,

    /// Parts of speech used as features (repeatable)
    #[arg(long = "pos", value_enum)]
    pos: Vec<PosClass>,

    /// Minimum number of comments a term must occur in
    #[arg(long, default_value_t = 1)]
    min_df: usize,

    /// IDF weighting
    #[arg(long, value_enum, default_value = "smooth")]
    idf: IdfWeighting,

    /// Number of words listed per direction
    #[arg(long, default_value_t = 20)]
    top_n: usize,

    /// Inverse regularization strength
    #[arg(long, default_value_t = 1.0)]
    c: f64,

    /// Solver iteration limit
    #[arg(long, default_value_t = 1000)]
    max_iter: usize,

    /// Solver gradient tolerance
    #[arg(long, default_value_t = 1e-4)]
    tol: f64,

    /// Output format of the ranking (txt, csv, tsv, json)
    #[arg(long, default_value = "txt")]
    export_format: ExportFormat,

    /// Fit one ranking over all files instead of one per file
    #[arg(long, default_value_t = false)]
    combine: bool,

    /// Directory for output files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Also write every token with its analysis
    #[arg(long, default_value_t = false)]
    export_tokens: bool,

    /// Replace every digit run with 0
    #[arg(long, default_value_t = false)]
    fold_digits: bool,

    /// Skip Unicode/Japanese width folding
    #[arg(long, default_value_t = false)]
    no_unicode: bool,

    /// Keep URLs
    #[arg(long, default_value_t = false)]
    keep_urls: bool,

    /// Keep emoji
    #[arg(long, default_value_t = false)]
    keep_emoji: bool,

    /// Keep punctuation and laugh markers
    #[arg(long, default_value_t = false)]
    keep_punctuation: bool,

    /// Keep survey date stamps
    #[arg(long, default_value_t = false)]
    keep_dates: bool,
}

impl Cli {
    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            normalize: NormalizeOptions {
                unicode: !self.no_unicode,
                urls: !self.keep_urls,
                emoji: !self.keep_emoji,
                punctuation: !self.keep_punctuation,
                fold_digits: self.fold_digits,
                sanitize: true,
                strip_dates: !self.keep_dates,
            },
            pos_classes: if self.pos.is_empty() {
                PosClass::DEFAULT.to_vec()
            } else {
                self.pos.clone()
            },
            min_df: self.min_df,
            idf: self.idf,
            stopwords_file: self.stopwords.clone(),
            builtin_stopwords: self.builtin_stopwords,
            top_n: self.top_n,
            c: self.c,
            max_iter: self.max_iter,
            tol: self.tol,
            export_format: self.export_format,
            combine: self.combine,
            out_dir: self.out_dir.clone(),
            export_tokens: self.export_tokens,
        }
    }
}

fn load_scorer(cli: &Cli) -> Result<Option<PolarityScorer>> {
    let Some(path) = &cli.lexicon else {
        return Ok(None);
    };
    if cli.require_lexicon {
        return Ok(Some(PolarityScorer::new(PolarityLexicon::load(path)?)));
    }
    Ok(PolarityScorer::load_optional(path))
}

fn run(cli: &Cli) -> Result<bool> {
    // Checked first so a bad path fails before the dictionary is loaded.
    if !cli.path.exists() {
        return Err(AnalysisError::InputNotFound(cli.path.clone()));
    }
    let analyzer = VibratoAnalyzer::from_path(&cli.dictionary)?;
    let scorer = load_scorer(cli)?;
    let mut pipeline = Pipeline::new(analyzer, scorer, cli.options())?;
    let report = pipeline.analyze_path(&cli.path)?;

    println!("{}", report.result);
    if !report.failed_files.is_empty() {
        print_failed_files(&report.failed_files);
        return Ok(false);
    }
    Ok(true)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    }
}
