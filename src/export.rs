//! Rendering and writing of output artifacts.
//!
//! Everything for one input file is rendered in memory first. Writing goes
//! through `*.partial` files that are renamed only once all of them are on
//! disk, so a failed file never leaves half of its outputs behind.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use csv::WriterBuilder;
use log::warn;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::polarity::SentimentScore;
use crate::ranking::{RankedWord, RankingReport};
use crate::records::{LectureSummary, ReviewRecord};
use crate::tokenizer::Document;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Format of the ranking report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

/// Guards against spreadsheet formula injection: text starting with a
/// formula trigger is prefixed with `'`.
pub fn csv_safe_cell(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

/// A rendered output, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: &'static str,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// `<stem>_<stamp>_<kind>.<ext>`
    pub fn file_name(&self, stem: &str, stamp: &str) -> String {
        format!("{stem}_{stamp}_{}.{}", self.kind, self.extension)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.bytes.strip_prefix(UTF8_BOM).unwrap_or(&self.bytes))
            .into_owned()
    }
}

/// One row of the sentiment table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentRow {
    pub name: String,
    pub rating_text: String,
    pub free_text: String,
    pub cleaned_text: String,
    pub sentiment: SentimentScore,
}

fn render_table<I>(kind: &'static str, delimiter: u8, bom: bool, header: &[&str], rows: I) -> Result<Artifact>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut buffer = Vec::new();
    if bom {
        buffer.extend_from_slice(UTF8_BOM);
    }
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(buffer);
    wtr.write_record(header).map_err(|e| AnalysisError::csv(kind, e))?;
    for row in rows {
        wtr.write_record(&row).map_err(|e| AnalysisError::csv(kind, e))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AnalysisError::io(kind, e.into_error()))?;
    let extension = if delimiter == b'\t' { "tsv" } else { "csv" };
    Ok(Artifact {
        kind,
        extension,
        bytes,
    })
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn summary_csv(summaries: &[LectureSummary]) -> Result<Artifact> {
    render_table(
        "summary",
        b',',
        true,
        &[
            "name",
            "respondent_count",
            "enrolled_count",
            "average_rating",
            "comment_count",
        ],
        summaries.iter().map(|s| {
            vec![
                csv_safe_cell(&s.name),
                optional(s.respondent_count),
                optional(s.enrolled_count),
                optional(s.average_rating),
                s.comment_count.to_string(),
            ]
        }),
    )
}

pub fn comments_csv(records: &[ReviewRecord]) -> Result<Artifact> {
    render_table(
        "comments",
        b',',
        true,
        &["name", "average_rating_text", "free_text"],
        records.iter().map(|r| {
            vec![
                csv_safe_cell(&r.name),
                csv_safe_cell(&r.rating_text),
                csv_safe_cell(&r.free_text()),
            ]
        }),
    )
}

pub fn sentiment_csv(rows: &[SentimentRow]) -> Result<Artifact> {
    render_table(
        "sentiment",
        b',',
        true,
        &[
            "name",
            "average_rating_text",
            "free_text",
            "cleaned_text",
            "sentiment_score",
            "positive_terms",
            "negative_terms",
        ],
        rows.iter().map(|r| {
            vec![
                csv_safe_cell(&r.name),
                csv_safe_cell(&r.rating_text),
                csv_safe_cell(&r.free_text),
                csv_safe_cell(&r.cleaned_text),
                r.sentiment.score.to_string(),
                csv_safe_cell(&r.sentiment.positive.join(", ")),
                csv_safe_cell(&r.sentiment.negative.join(", ")),
            ]
        }),
    )
}

/// One row per token, for inspecting what the analyzer produced.
pub fn tokens_csv(documents: &[(&str, &Document)]) -> Result<Artifact> {
    let rows = documents.iter().flat_map(|&(name, doc)| {
        doc.tokens.iter().map(move |t| {
            vec![
                doc.id.to_string(),
                csv_safe_cell(name),
                csv_safe_cell(&t.surface),
                t.pos_major.clone(),
                t.pos_minor1.clone(),
                t.pos_minor2.clone(),
                t.pos_minor3.clone(),
                t.conjugation_type.clone(),
                t.conjugation_form.clone(),
                optional(t.base_form.as_deref()),
                optional(t.reading.as_deref()),
                optional(t.pronunciation.as_deref()),
            ]
        })
    });
    render_table(
        "tokens",
        b',',
        true,
        &[
            "document_id",
            "name",
            "surface",
            "pos",
            "pos_detail1",
            "pos_detail2",
            "pos_detail3",
            "conjugation_type",
            "conjugation_form",
            "base_form",
            "reading",
            "pronunciation",
        ],
        rows,
    )
}

/// Plain-text ranking, also used for console output.
pub fn render_ranking_text(report: &RankingReport) -> String {
    let mut out = String::from("--- Terms associated with high ratings ---\n");
    for word in &report.positive {
        out.push_str(&format!("{}\t{:.4}\n", word.term, word.weight));
    }
    out.push_str("\n--- Terms associated with low ratings ---\n");
    for word in &report.negative {
        out.push_str(&format!("{}\t{:.4}\n", word.term, word.weight));
    }
    out
}

fn ranking_rows(label: &str, words: &[RankedWord]) -> Vec<Vec<String>> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            vec![
                (i + 1).to_string(),
                label.to_string(),
                csv_safe_cell(&w.term),
                format!("{:.6}", w.weight),
            ]
        })
        .collect()
}

pub fn ranking_artifact(report: &RankingReport, format: ExportFormat) -> Result<Artifact> {
    let rows = || {
        let mut all = ranking_rows("positive", &report.positive);
        all.extend(ranking_rows("negative", &report.negative));
        all
    };
    let header = ["rank", "polarity", "term", "weight"];
    let mut artifact = match format {
        ExportFormat::Txt => Artifact {
            kind: "ranking",
            extension: "txt",
            bytes: render_ranking_text(report).into_bytes(),
        },
        ExportFormat::Csv => render_table("ranking", b',', true, &header, rows())?,
        ExportFormat::Tsv => render_table("ranking", b'\t', false, &header, rows())?,
        ExportFormat::Json => Artifact {
            kind: "ranking",
            extension: "json",
            bytes: serde_json::to_vec_pretty(report)?,
        },
    };
    artifact.extension = format.extension();
    Ok(artifact)
}

/// Writes all artifacts or none of them. Returns the final paths.
pub fn write_artifacts(
    out_dir: &Path,
    stem: &str,
    stamp: &str,
    artifacts: &[Artifact],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| AnalysisError::io(out_dir, e))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let target = out_dir.join(artifact.file_name(stem, stamp));
        let partial = target.with_extension(format!("{}.partial", artifact.extension));
        if let Err(e) = fs::write(&partial, &artifact.bytes) {
            discard(staged.iter().map(|(p, _)| p).chain([&partial]));
            return Err(AnalysisError::io(partial, e));
        }
        staged.push((partial, target));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (i, (partial, target)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(partial, target) {
            discard(written.iter().chain(staged[i..].iter().map(|(p, _)| p)));
            return Err(AnalysisError::io(target, e));
        }
        written.push(target.clone());
    }
    Ok(written)
}

fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove {}: {e}", path.display());
            }
        }
    }
}
