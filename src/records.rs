//! Reading survey exports: column schema, metadata parsing, summaries.
//!
//! An export has a header row followed by one row per respondent group:
//! a metadata cell (`47人 履修者：　52人`), the lecture name, the average
//! rating text and any number of free-text comment cells.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AnalysisError, FieldError, Result};
use crate::labels::parse_rating;

/// Lecture name used by the survey system for "no applicable course".
pub const NO_COURSE_SENTINEL: &str = "該当授業はありません";

pub const COMMENT_SEPARATOR: &str = " / ";

const NAME_HEADERS: [&str; 4] = ["講義名", "授業名", "科目名", "name"];
const RATING_HEADERS: [&str; 3] = ["平均評価ポイント", "平均評価", "average_rating"];

static RESPONDENTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)人").expect("valid respondents regex"));
static ENROLLED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"履修者[：:]\s*(\d+)人").expect("valid enrolled regex"));

/// Where the fields of a row live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub metadata: usize,
    pub name: usize,
    pub rating: usize,
    /// First comment column; every later column is a comment too.
    pub comments_from: usize,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            metadata: 0,
            name: 2,
            rating: 3,
            comments_from: 4,
        }
    }
}

impl ColumnSchema {
    /// Locates the columns from the header row. Known header names win over
    /// the default positions; a header too short to hold the required
    /// columns is rejected.
    pub fn resolve(headers: &StringRecord, path: &Path) -> Result<Self> {
        let defaults = Self::default();
        if headers.len() < defaults.comments_from {
            return Err(AnalysisError::Schema {
                path: path.to_path_buf(),
                reason: format!(
                    "header has {} column(s); expected metadata, name and rating columns (at least {})",
                    headers.len(),
                    defaults.comments_from
                ),
            });
        }

        let find = |candidates: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim_start_matches('\u{feff}').trim();
                candidates.iter().any(|c| h == *c)
            })
        };
        let name = find(&NAME_HEADERS).unwrap_or(defaults.name);
        let rating = find(&RATING_HEADERS).unwrap_or(defaults.rating);
        if name == rating {
            return Err(AnalysisError::Schema {
                path: path.to_path_buf(),
                reason: format!("name and rating resolve to the same column {name}"),
            });
        }
        let metadata = defaults.metadata;
        let comments_from = metadata.max(name).max(rating) + 1;
        Ok(Self {
            metadata,
            name,
            rating,
            comments_from,
        })
    }

    fn min_len(&self) -> usize {
        self.metadata.max(self.name).max(self.rating) + 1
    }
}

/// Respondent and enrolment counts from a metadata cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCounts {
    pub respondents: Result<u32, FieldError>,
    pub enrolled: Result<u32, FieldError>,
}

/// Full-width digits are folded (NFKC) before matching.
pub fn parse_counts(metadata: &str) -> ResponseCounts {
    let folded: String = metadata.nfkc().collect();
    ResponseCounts {
        respondents: capture_count(&RESPONDENTS_RE, folded.trim(), "respondent_count"),
        enrolled: capture_count(&ENROLLED_RE, &folded, "enrolled_count"),
    }
}

fn capture_count(re: &Regex, text: &str, field: &'static str) -> Result<u32, FieldError> {
    let digits = re
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or(FieldError::Missing { field })?
        .as_str();
    digits.parse().map_err(|_| FieldError::Invalid {
        field,
        value: digits.to_string(),
    })
}

/// Joins the non-blank comment cells with `" / "`.
pub fn join_comments<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(COMMENT_SEPARATOR)
}

/// Rows with these names are removed before any other stage.
pub fn is_dropped_name(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.contains(NO_COURSE_SENTINEL)
}

/// One evaluation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    /// 1-based line in the source file.
    pub line: u64,
    pub name: String,
    pub metadata_text: String,
    pub rating_text: String,
    /// Non-blank comment cells, trimmed.
    pub comments: Vec<String>,
}

impl ReviewRecord {
    pub fn free_text(&self) -> String {
        join_comments(&self.comments)
    }

    pub fn has_comment(&self) -> bool {
        !self.comments.is_empty()
    }

    pub fn counts(&self) -> ResponseCounts {
        parse_counts(&self.metadata_text)
    }

    pub fn rating(&self) -> Result<f64, FieldError> {
        if self.rating_text.trim().is_empty() {
            return Err(FieldError::Missing {
                field: "average_rating",
            });
        }
        parse_rating(&self.rating_text).ok_or_else(|| FieldError::Invalid {
            field: "average_rating",
            value: self.rating_text.clone(),
        })
    }
}

/// Records of one export, plus what was skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct ReviewTable {
    pub records: Vec<ReviewRecord>,
    /// Rows removed for an empty or sentinel name.
    pub dropped: usize,
    /// Rows too short to hold the schema's columns.
    pub short_rows: usize,
}

pub fn read_reviews(path: &Path) -> Result<ReviewTable> {
    let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    read_reviews_from(file, path)
}

/// Reads an export from any reader; `path` is only used in diagnostics.
///
/// The header must be valid UTF-8. Data cells are decoded lossily, so a
/// stray invalid byte in a comment becomes U+FFFD instead of failing the file.
pub fn read_reviews_from<R: Read>(reader: R, path: &Path) -> Result<ReviewTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers().map_err(|e| AnalysisError::csv(path, e))?.clone();
    let schema = ColumnSchema::resolve(&headers, path)?;

    let mut table = ReviewTable::default();
    for row in rdr.byte_records() {
        let row = row.map_err(|e| AnalysisError::csv(path, e))?;
        let line = row.position().map_or(0, |p| p.line());
        if row.len() < schema.min_len() {
            debug!("{}:{line}: skipping row with {} cell(s)", path.display(), row.len());
            table.short_rows += 1;
            continue;
        }
        if std::str::from_utf8(row.as_slice()).is_err() {
            debug!("{}:{line}: invalid UTF-8 replaced", path.display());
        }
        let cell = |i: usize| String::from_utf8_lossy(row.get(i).unwrap_or(b"")).into_owned();
        let name = cell(schema.name).trim().to_string();
        if is_dropped_name(&name) {
            table.dropped += 1;
            continue;
        }
        let comments = row
            .iter()
            .skip(schema.comments_from)
            .map(|c| String::from_utf8_lossy(c).trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        table.records.push(ReviewRecord {
            line,
            name,
            metadata_text: cell(schema.metadata),
            rating_text: cell(schema.rating).trim().to_string(),
            comments,
        });
    }
    Ok(table)
}

/// One summary row per distinct lecture name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LectureSummary {
    pub name: String,
    pub respondent_count: Option<u32>,
    pub enrolled_count: Option<u32>,
    pub average_rating: Option<f64>,
    pub comment_count: usize,
}

/// Merges rows by name in first-seen order. The first row's counts and
/// rating are kept; `comment_count` counts the rows that carry comments.
pub fn summarize(records: &[ReviewRecord]) -> Vec<LectureSummary> {
    let mut lectures: IndexMap<&str, LectureSummary> = IndexMap::new();
    for record in records {
        let with_comment = usize::from(record.has_comment());
        if let Some(summary) = lectures.get_mut(record.name.as_str()) {
            summary.comment_count += with_comment;
            continue;
        }
        let counts = record.counts();
        for issue in [&counts.respondents, &counts.enrolled]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
        {
            debug!("line {} ({}): {issue}", record.line, record.name);
        }
        lectures.insert(
            record.name.as_str(),
            LectureSummary {
                name: record.name.clone(),
                respondent_count: counts.respondents.ok(),
                enrolled_count: counts.enrolled.ok(),
                average_rating: record.rating().ok(),
                comment_count: with_comment,
            },
        );
    }
    lectures.into_values().collect()
}
