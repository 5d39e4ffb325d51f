//! Integration tests for `rating_words`.
//
// This suite verifies:
// - Library runs over survey exports (summary merge, comments, sentiment, ranking)
// - All-or-nothing output per file and combined mode
// - CLI argument handling and fatal diagnostics
//
// Notes:
// - Library tests use an in-test dictionary analyzer instead of a real
//   morphological dictionary.
// - CLI tests run the binary with a per-process working directory (no global CWD change).
// - Tests that change global CWD are marked #[serial].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use csv::ReaderBuilder;
use predicates::prelude::*;
use regex::Regex;
use serde_json::Value as Json;
use serial_test::serial;
use tempfile::tempdir;

use rating_words::{
    AnalysisError, ExportFormat, MorphAnalyzer, Node, Pipeline, PipelineOptions, PolarityLexicon,
    PolarityScorer, collect_files, csv_safe_cell,
};

// --------------------- helpers ---------------------

/// Greedy longest-match analyzer over a small IPADIC-style word list.
struct DictAnalyzer {
    words: Vec<(&'static str, &'static str)>,
}

impl DictAnalyzer {
    fn new() -> Self {
        Self {
            words: vec![
                ("授業", "名詞,一般,*,*,*,*,授業,ジュギョウ,ジュギョー"),
                ("先生", "名詞,一般,*,*,*,*,先生,センセイ,センセイ"),
                ("丁寧", "名詞,形容動詞語幹,*,*,*,*,丁寧,テイネイ,テイネイ"),
                ("退屈", "名詞,形容動詞語幹,*,*,*,*,退屈,タイクツ,タイクツ"),
                (
                    "分かりやすい",
                    "形容詞,自立,*,*,形容詞・アウオ段,基本形,分かりやすい,ワカリヤスイ,ワカリヤスイ",
                ),
                ("楽しい", "形容詞,自立,*,*,形容詞・イ段,基本形,楽しい,タノシイ,タノシイ"),
                ("楽しかっ", "形容詞,自立,*,*,形容詞・イ段,連用タ接続,楽しい,タノシカッ,タノシカッ"),
                ("難しい", "形容詞,自立,*,*,形容詞・イ段,基本形,難しい,ムズカシイ,ムズカシイ"),
                ("です", "助動詞,*,*,*,特殊・デス,基本形,です,デス,デス"),
                ("た", "助動詞,*,*,*,特殊・タ,基本形,た,タ,タ"),
                ("が", "助詞,格助詞,一般,*,*,*,が,ガ,ガ"),
                ("は", "助詞,係助詞,*,*,*,*,は,ハ,ワ"),
                ("とても", "副詞,助詞類接続,*,*,*,*,とても,トテモ,トテモ"),
            ],
        }
    }
}

impl MorphAnalyzer for DictAnalyzer {
    fn parse_nodes(&mut self, text: &str) -> Vec<Node> {
        let mut nodes = vec![Node::new("", "BOS/EOS,*,*,*,*,*,*,*,*")];
        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            if c.is_whitespace() {
                rest = &rest[c.len_utf8()..];
                continue;
            }
            let hit = self
                .words
                .iter()
                .filter(|(surface, _)| rest.starts_with(surface))
                .max_by_key(|(surface, _)| surface.len());
            match hit {
                Some((surface, feature)) => {
                    nodes.push(Node::new(*surface, *feature));
                    rest = &rest[surface.len()..];
                }
                None => {
                    nodes.push(Node::new(c.to_string(), "記号,一般,*,*,*,*,*"));
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        nodes.push(Node::new("", "BOS/EOS,*,*,*,*,*,*,*,*"));
        nodes
    }
}

const HEADER: &str = "回答状況,区分,講義名,平均評価ポイント,自由記述1,自由記述2\n";

/// Survey export with a duplicated lecture, a sentinel row and four
/// labeled comments (median 4.2).
fn survey_csv() -> String {
    format!(
        "\u{feff}{HEADER}\
         10人 履修者：20人,A,統計学,平均 4.50,授業が分かりやすい,先生が丁寧\n\
         12人 履修者：20人,A,統計学,平均 4.20,,\n\
         8人 履修者：30人,A,英語,平均 2.10,授業が退屈,\n\
         5人,A,該当授業はありません,,,\n\
         7人 履修者：9人,A,物理学,平均 3.90,難しい,\n\
         6人,A,化学,平均 4.80,楽しい授業！,\n"
    )
}

fn lexicon() -> PolarityScorer {
    PolarityScorer::new(PolarityLexicon::from_entries([
        ("楽しい", 0.9),
        ("退屈", -0.8),
        ("難しい", -0.5),
    ]))
}

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// Options writing into `out_dir`.
fn opts(out_dir: &Path, fmt: ExportFormat) -> PipelineOptions {
    PipelineOptions {
        export_format: fmt,
        out_dir: out_dir.to_path_buf(),
        ..PipelineOptions::default()
    }
}

fn pipeline(out_dir: &Path, fmt: ExportFormat) -> Pipeline<DictAnalyzer> {
    Pipeline::new(DictAnalyzer::new(), Some(lexicon()), opts(out_dir, fmt)).unwrap()
}

/// Run CLI expecting failure with a specific working directory.
fn run_cli_fail_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("rating_words").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().failure()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Find the output file ending with a given suffix (e.g. "_summary.csv").
fn find_with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    for entry in fs::read_dir(dir).unwrap().filter_map(|e| e.ok()) {
        let p = entry.path();
        if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(suffix) {
                return p;
            }
        }
    }
    panic!("No file found ending with {}", suffix);
}

/// CSV rows including the header, BOM checked and stripped.
fn read_csv_rows(p: &Path) -> Vec<Vec<String>> {
    let text = fs::read_to_string(p).unwrap();
    assert!(text.starts_with('\u{feff}'), "{} should start with a BOM", p.display());
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn ranking_terms(v: &Json, side: &str) -> Vec<String> {
    v[side]
        .as_array()
        .expect("ranking array")
        .iter()
        .map(|w| w["term"].as_str().expect("term str").to_string())
        .collect()
}

// --------------------- library tests ---------------------

#[test]
fn lib_per_file_run_writes_every_artifact() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let out = tempdir().unwrap();

    let mut p = pipeline(out.path(), ExportFormat::Json);
    let report = p.analyze_path(&input).expect("analyze_path");
    assert!(report.failed_files.is_empty());
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].written.len(), 4);
    assert_eq!(report.files[0].labeled, 4);
    let median = report.files[0].median.expect("median");
    assert!((median - 4.2).abs() < 1e-9);

    let names = file_names(out.path());
    for kind in ["summary\\.csv", "comments\\.csv", "sentiment\\.csv", "ranking\\.json"] {
        let re = Regex::new(&format!(r"^survey_\d{{8}}_\d{{6}}_{kind}$")).unwrap();
        assert!(
            names.iter().any(|n| re.is_match(n)),
            "missing {kind} in {names:?}"
        );
    }
    assert!(!names.iter().any(|n| n.ends_with(".partial")));
}

#[test]
fn lib_summary_merges_duplicate_lectures() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let out = tempdir().unwrap();
    pipeline(out.path(), ExportFormat::Txt)
        .analyze_path(&input)
        .unwrap();

    let rows = read_csv_rows(&find_with_suffix(out.path(), "_summary.csv"));
    assert_eq!(
        rows[0],
        vec!["name", "respondent_count", "enrolled_count", "average_rating", "comment_count"]
    );
    assert_eq!(rows.len(), 5, "header + 4 lectures, sentinel dropped");
    assert_eq!(rows[1], vec!["統計学", "10", "20", "4.5", "1"]);
    assert_eq!(rows[2][0], "英語");
    assert_eq!(rows[4], vec!["化学", "6", "", "4.8", "1"]);
    assert!(!rows.iter().any(|r| r[0].contains("該当授業")));
}

#[test]
fn lib_comments_are_joined() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let out = tempdir().unwrap();
    pipeline(out.path(), ExportFormat::Txt)
        .analyze_path(&input)
        .unwrap();

    let rows = read_csv_rows(&find_with_suffix(out.path(), "_comments.csv"));
    assert_eq!(rows[0], vec!["name", "average_rating_text", "free_text"]);
    assert_eq!(rows[1], vec!["統計学", "平均 4.50", "授業が分かりやすい / 先生が丁寧"]);
    // Rows without any comment are listed too.
    assert_eq!(rows[2], vec!["統計学", "平均 4.20", ""]);
    assert_eq!(rows.len(), 6, "header + 5 records, sentinel dropped");
}

#[test]
fn lib_invalid_byte_in_comment_keeps_the_file() {
    let td = assert_fs::TempDir::new().unwrap();
    let mut bytes = HEADER.as_bytes().to_vec();
    bytes.extend_from_slice("10人,A,英語,平均 4.00,楽しい授業,\n".as_bytes());
    bytes.extend_from_slice("8人,A,化学,平均 2.00,退屈".as_bytes());
    bytes.push(0xFF);
    bytes.extend_from_slice("です,\n".as_bytes());
    let input = td.child("survey.csv");
    fs::write(input.path(), &bytes).unwrap();

    let out = tempdir().unwrap();
    let analysis = pipeline(out.path(), ExportFormat::Txt)
        .analyze_file(input.path())
        .expect("invalid bytes are replaced, not fatal");
    assert_eq!(analysis.records, 2);
    let row = analysis
        .sentiment
        .iter()
        .find(|r| r.name == "化学")
        .expect("sentiment row");
    assert_eq!(row.free_text, "退屈\u{FFFD}です");
    assert_eq!(row.cleaned_text, "退屈です");
}

#[test]
fn lib_same_stem_in_subdirectories_keeps_both_outputs() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("a").create_dir_all().unwrap();
    td.child("b").create_dir_all().unwrap();
    write_file(&td, "a/s.csv", &survey_csv());
    write_file(&td, "b/s.csv", &survey_csv());
    let out = tempdir().unwrap();

    let report = pipeline(out.path(), ExportFormat::Txt)
        .analyze_path(td.path())
        .unwrap();
    assert!(report.failed_files.is_empty(), "{:?}", report.failed_files);

    let names = file_names(out.path());
    assert_eq!(names.len(), 8, "{names:?}");
    assert_eq!(names.iter().filter(|n| n.starts_with("a_s_")).count(), 4);
    assert_eq!(names.iter().filter(|n| n.starts_with("b_s_")).count(), 4);
}

#[test]
fn lib_colliding_output_names_fail_the_later_file() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("a").create_dir_all().unwrap();
    write_file(&td, "a/s.csv", &survey_csv());
    write_file(&td, "a_s.csv", &survey_csv());
    let out = tempdir().unwrap();

    let report = pipeline(out.path(), ExportFormat::Txt)
        .analyze_path(td.path())
        .unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.failed_files.len(), 1);
    let (failed, reason) = &report.failed_files[0];
    assert!(failed.ends_with("a_s.csv"), "{failed}");
    assert!(reason.contains("already used"), "{reason}");
    assert_eq!(file_names(out.path()).len(), 4);
}

#[test]
fn lib_invalid_solver_parameter_is_rejected() {
    let out = tempdir().unwrap();
    let options = PipelineOptions {
        c: 0.0,
        ..opts(out.path(), ExportFormat::Txt)
    };
    let err = Pipeline::new(DictAnalyzer::new(), None, options)
        .err()
        .expect("C = 0 is rejected");
    assert!(matches!(err, AnalysisError::InvalidParameter { name: "C", .. }));
}

#[test]
fn lib_sentiment_scores_cleaned_comments() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let out = tempdir().unwrap();
    pipeline(out.path(), ExportFormat::Txt)
        .analyze_path(&input)
        .unwrap();

    let rows = read_csv_rows(&find_with_suffix(out.path(), "_sentiment.csv"));
    assert_eq!(rows[0][3], "cleaned_text");
    let chem = rows.iter().find(|r| r[0] == "化学").expect("化学 row");
    assert_eq!(chem[3], "楽しい授業");
    let score: f64 = chem[4].parse().unwrap();
    assert!((score - 0.45).abs() < 1e-9);
    assert_eq!(chem[5], "楽しい(0.90)");
    assert_eq!(chem[6], "");

    let english = rows.iter().find(|r| r[0] == "英語").expect("英語 row");
    assert_eq!(english[6], "退屈(-0.80)");
}

#[test]
fn lib_ranking_separates_high_and_low_vocabulary() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let out = tempdir().unwrap();
    pipeline(out.path(), ExportFormat::Json)
        .analyze_path(&input)
        .unwrap();

    let s = fs::read_to_string(find_with_suffix(out.path(), "_ranking.json")).unwrap();
    let v: Json = serde_json::from_str(&s).expect("valid json");
    let positive = ranking_terms(&v, "positive");
    let negative = ranking_terms(&v, "negative");

    assert!(["退屈", "難しい"].contains(&negative[0].as_str()), "{negative:?}");
    assert!(
        ["分かりやすい", "先生", "丁寧", "楽しい"].contains(&positive[0].as_str()),
        "{positive:?}"
    );
    // Function words never become features.
    assert!(!positive.iter().chain(&negative).any(|t| t == "が" || t == "です"));
    assert!(v["negative"][0]["weight"].as_f64().unwrap() < 0.0);
}

#[test]
fn lib_ranking_is_deterministic() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let out = tempdir().unwrap();
    let mut p = pipeline(out.path(), ExportFormat::Json);
    let first = p.analyze_file(&input).unwrap();
    let second = p.analyze_file(&input).unwrap();
    assert_eq!(first.ranking, second.ranking);
    assert_eq!(first.artifacts, second.artifacts);
}

#[test]
fn lib_stopwords_remove_terms() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let stop = write_file(&td, "stop.txt", "授業\n");
    let out = tempdir().unwrap();

    let options = PipelineOptions {
        stopwords_file: Some(stop),
        ..opts(out.path(), ExportFormat::Json)
    };
    let mut p = Pipeline::new(DictAnalyzer::new(), None, options).unwrap();
    let analysis = p.analyze_file(&input).unwrap();
    let ranking = analysis.ranking.expect("ranking");
    assert!(
        !ranking
            .positive
            .iter()
            .chain(&ranking.negative)
            .any(|w| w.term == "授業")
    );
    // No lexicon: no sentiment table.
    assert_eq!(analysis.artifacts.len(), 3);
}

#[test]
fn lib_single_class_file_fails_and_writes_nothing() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(
        &td,
        "flat.csv",
        &format!("{HEADER}1人,A,英語,3.00,楽しい,\n2人,A,数学,3.00,退屈,\n"),
    );
    let out = tempdir().unwrap();

    let mut p = pipeline(out.path(), ExportFormat::Csv);
    let err = p.analyze_file(&input).unwrap_err();
    assert!(matches!(err, AnalysisError::DataInsufficient(_)), "{err}");

    let report = p.analyze_path(&input).unwrap();
    assert_eq!(report.failed_files.len(), 1);
    assert!(report.failed_files[0].0.contains("flat.csv"));
    assert!(report.failed_files[0].1.contains("not enough data"));
    assert!(file_names(out.path()).is_empty(), "no partial output");
}

#[test]
fn lib_bad_file_does_not_stop_the_run() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "a_short.csv", "a,b\n1,2\n");
    write_file(&td, "b_survey.csv", &survey_csv());
    let out = tempdir().unwrap();

    let report = pipeline(out.path(), ExportFormat::Txt)
        .analyze_path(td.path())
        .unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.failed_files.len(), 1);
    assert!(report.failed_files[0].0.contains("a_short.csv"));
    assert!(file_names(out.path()).iter().all(|n| n.starts_with("b_survey_")));
}

#[test]
fn lib_combined_mode_pools_files() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(
        &td,
        "high.csv",
        &format!("{HEADER}1人,A,化学,4.50,楽しい授業,\n2人,A,統計学,4.80,分かりやすい,\n"),
    );
    write_file(
        &td,
        "low.csv",
        &format!("{HEADER}1人,A,英語,2.00,退屈,\n2人,A,物理学,2.50,難しい,\n"),
    );
    // Single-class on its own; fine once pooled.
    write_file(&td, "flat.csv", &format!("{HEADER}1人,A,数学,3.00,授業,\n"));
    let out = tempdir().unwrap();

    let options = PipelineOptions {
        combine: true,
        ..opts(out.path(), ExportFormat::Csv)
    };
    let mut p = Pipeline::new(DictAnalyzer::new(), None, options).unwrap();
    let report = p.analyze_path(td.path()).expect("combined run");
    assert!(report.failed_files.is_empty(), "{:?}", report.failed_files);
    assert_eq!(report.files.len(), 3);
    assert!(report.files.iter().all(|f| f.ranking.is_none()));

    let names = file_names(out.path());
    let re = Regex::new(r"^combined_\d{8}_\d{6}_ranking\.csv$").unwrap();
    assert!(names.iter().any(|n| re.is_match(n)), "{names:?}");
    for stem in ["flat", "high", "low"] {
        assert!(names.iter().any(|n| n.starts_with(stem) && n.ends_with("_summary.csv")));
        assert!(!names.iter().any(|n| n.starts_with(stem) && n.contains("_ranking")));
    }

    let rows = read_csv_rows(&find_with_suffix(out.path(), "_ranking.csv"));
    assert_eq!(rows[0], vec!["rank", "polarity", "term", "weight"]);
    let combined = report.combined.expect("combined ranking");
    assert!(["退屈", "難しい"].contains(&combined.negative[0].term.as_str()));
}

#[test]
fn lib_export_tokens_writes_token_table() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "survey.csv", &survey_csv());
    let out = tempdir().unwrap();
    let options = PipelineOptions {
        export_tokens: true,
        ..opts(out.path(), ExportFormat::Txt)
    };
    let mut p = Pipeline::new(DictAnalyzer::new(), None, options).unwrap();
    p.analyze_path(&input).unwrap();

    let rows = read_csv_rows(&find_with_suffix(out.path(), "_tokens.csv"));
    assert_eq!(rows[0][2], "surface");
    let first = &rows[1];
    assert_eq!(first[1], "統計学");
    assert_eq!(first[2], "授業");
    assert_eq!(first[3], "名詞");
    assert_eq!(first[9], "授業");
    // BOS/EOS nodes are not tokens.
    assert!(rows.iter().skip(1).all(|r| !r[2].is_empty()));
}

#[test]
fn lib_missing_path_is_input_not_found() {
    let td = tempdir().unwrap();
    let bad = td.path().join("does_not_exist_here");
    let err = pipeline(td.path(), ExportFormat::Txt)
        .analyze_path(&bad)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InputNotFound(_)));
    assert!(err.to_string().contains("does_not_exist_here"));
}

#[test]
fn lib_collect_files_skips_outputs_and_sorts() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "b.csv", HEADER);
    write_file(&td, "a.CSV", HEADER);
    write_file(&td, "notes.txt", "x");
    write_file(&td, "b_20250101_120000_summary.csv", "x");
    td.child("sub").create_dir_all().unwrap();
    write_file(&td, "sub/c.csv", HEADER);

    let files = collect_files(td.path());
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.CSV", "b.csv", "c.csv"]);
}

#[test]
#[serial]
fn lib_default_output_goes_to_working_directory() {
    let td = assert_fs::TempDir::new().unwrap();
    let _input = write_file(&td, "survey.csv", &survey_csv());
    let options = PipelineOptions {
        export_format: ExportFormat::Tsv,
        ..PipelineOptions::default()
    };
    // Change CWD so relative outputs are written into td
    std::env::set_current_dir(td.path()).unwrap();
    let mut p = Pipeline::new(DictAnalyzer::new(), None, options).unwrap();
    let stamp = p.stamp().to_string();
    p.analyze_path(td.path()).expect("analyze_path");

    let ranking = td.path().join(format!("survey_{stamp}_ranking.tsv"));
    let text = fs::read_to_string(&ranking).unwrap();
    assert!(text.starts_with("rank\tpolarity\tterm\tweight\n"));
}

#[test]
fn csv_safe_cell_escapes_formulas() {
    assert_eq!(csv_safe_cell("=HYPERLINK(\"x\")"), "'=HYPERLINK(\"x\")");
    assert_eq!(csv_safe_cell("+1"), "'+1");
    assert_eq!(csv_safe_cell("授業"), "授業");
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_nonexistent_path_fails() {
    let td = tempdir().unwrap();
    let bad = td.path().join("does_not_exist_here");
    run_cli_fail_in(
        td.path(),
        &[
            bad.to_string_lossy().as_ref(),
            "--dictionary",
            "system.dic",
        ],
    )
    .stderr(predicate::str::contains("does_not_exist_here"));
}

#[test]
fn cli_unreadable_dictionary_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "survey.csv", &survey_csv());
    let dict = write_file(&td, "broken.dic", "not a dictionary");

    run_cli_fail_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--dictionary",
            dict.to_str().unwrap(),
        ],
    )
    .stderr(predicate::str::contains("broken.dic"));

    let outputs = file_names(td.path());
    assert!(!outputs.iter().any(|n| n.contains("_summary")));
}

#[test]
fn cli_requires_dictionary() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "survey.csv", &survey_csv());
    run_cli_fail_in(td.path(), &[td.path().to_string_lossy().as_ref()])
        .stderr(predicate::str::contains("--dictionary"));
}

#[test]
fn cli_require_lexicon_needs_lexicon() {
    let td = assert_fs::TempDir::new().unwrap();
    run_cli_fail_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--dictionary",
            "system.dic",
            "--require-lexicon",
        ],
    )
    .stderr(predicate::str::contains("--lexicon"));
}

#[test]
fn cli_rejects_unknown_export_format() {
    let td = assert_fs::TempDir::new().unwrap();
    run_cli_fail_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--dictionary",
            "system.dic",
            "--export-format",
            "xml",
        ],
    );
}
