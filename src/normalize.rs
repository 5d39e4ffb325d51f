//! Text cleaning applied to every comment before tokenization.
//!
//! [`normalize`] is pure and idempotent for a fixed set of options: the
//! cleaning pass is repeated until the text no longer changes, so removing a
//! URL or a punctuation mark can never leave behind something a second call
//! would still strip.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Switches for the individual cleaning stages. Whitespace is always collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// NFKC plus Japanese width, hyphen and long-vowel folding.
    pub unicode: bool,
    pub urls: bool,
    pub emoji: bool,
    /// Sentence punctuation and `(笑)` laugh markers.
    pub punctuation: bool,
    /// Replace every run of digits with a single `0`.
    pub fold_digits: bool,
    /// Drop replacement characters and stray control characters.
    pub sanitize: bool,
    /// Remove survey date stamps such as `2025/04/10（木）`.
    pub strip_dates: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            unicode: true,
            urls: true,
            emoji: true,
            punctuation: true,
            fold_digits: false,
            sanitize: true,
            strip_dates: true,
        }
    }
}

impl NormalizeOptions {
    /// Only the mandatory whitespace collapse.
    pub fn minimal() -> Self {
        Self {
            unicode: false,
            urls: false,
            emoji: false,
            punctuation: false,
            fold_digits: false,
            sanitize: false,
            strip_dates: false,
        }
    }
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z][A-Za-z0-9+.\-]*://[A-Za-z0-9_/:%#$&?()\[\]~.=+\-@!*',;]+")
        .expect("valid url regex")
});

static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\u{FE0E}\u{FE0F}\u{200D}\u{20E3}]|[^\u{0000}-\u{FFFF}]")
        .expect("valid emoji regex")
});

static LAUGH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[（(]笑+[)）]").expect("valid laugh regex"));

static PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!！?？。、．，,.]").expect("valid punctuation regex"));

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[～〜~]\s*)?[0-9]{4}/[0-9]{1,2}/[0-9]{1,2}\s*[（(][月火水木金土日][)）]")
        .expect("valid date regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digit regex"));

static LONG_VOWEL_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ー{2,}").expect("valid long vowel regex"));

/// Cleans `text` according to `options`.
///
/// # Example
/// ```
/// use rating_words::{normalize, NormalizeOptions};
/// let cleaned = normalize("ｽｺﾞｲ!!  https://example.com 楽しかった(笑)", &NormalizeOptions::default());
/// assert_eq!(cleaned, "スゴイ楽しかった");
/// ```
pub fn normalize(text: &str, options: &NormalizeOptions) -> String {
    // After the first pass the text is in NFKC form and every later pass
    // only removes or folds characters, so this reaches a fixpoint.
    let mut current = clean_pass(text, options);
    loop {
        let next = clean_pass(&current, options);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Like [`normalize`], for cells that may be absent. Absent cells become `""`.
pub fn normalize_cell(cell: Option<&str>, options: &NormalizeOptions) -> String {
    cell.map(|text| normalize(text, options)).unwrap_or_default()
}

/// Decodes bytes lossily before cleaning; invalid sequences never survive
/// when `sanitize` is on.
pub fn normalize_bytes(bytes: &[u8], options: &NormalizeOptions) -> String {
    normalize(&String::from_utf8_lossy(bytes), options)
}

fn clean_pass(text: &str, options: &NormalizeOptions) -> String {
    let mut out: String = if options.sanitize {
        text.chars()
            .filter(|&c| c != '\u{FFFD}' && !(c.is_control() && !c.is_whitespace()))
            .collect()
    } else {
        text.to_string()
    };

    if options.unicode {
        out = fold_japanese(&out);
    }
    if options.strip_dates {
        out = DATE_RE.replace_all(&out, "").into_owned();
    }
    if options.urls {
        out = URL_RE.replace_all(&out, "").into_owned();
    }
    if options.emoji {
        out = EMOJI_RE.replace_all(&out, "").into_owned();
    }
    if options.punctuation {
        out = LAUGH_RE.replace_all(&out, "").into_owned();
        out = PUNCT_RE.replace_all(&out, "").into_owned();
    }

    out = WHITESPACE_RE.replace_all(&out, " ").trim().to_string();
    if options.unicode {
        out = drop_spaces_near_japanese(&out);
    }
    if options.fold_digits {
        out = DIGITS_RE.replace_all(&out, "0").into_owned();
    }
    out
}

fn fold_japanese(text: &str) -> String {
    let folded: String = text
        .nfkc()
        .filter_map(|c| match c {
            '˗' | '֊' | '‐' | '‑' | '‒' | '–' | '⁃' | '⁻' | '₋' | '−' => Some('-'),
            '﹣' | '－' | 'ｰ' | '—' | '―' | '─' | '━' => Some('ー'),
            '~' | '∼' | '∾' | '〜' | '〰' | '～' => None,
            other => Some(other),
        })
        .collect();
    LONG_VOWEL_RUN_RE.replace_all(&folded, "ー").into_owned()
}

/// Spaces only separate words in running Latin text; a space touching a
/// Japanese character is dropped.
fn drop_spaces_near_japanese(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let before = i.checked_sub(1).map(|j| chars[j]);
            let after = chars.get(i + 1).copied();
            if before.is_some_and(is_japanese) || after.is_some_and(is_japanese) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn is_japanese(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{303F}'
        | '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF66}'..='\u{FF9F}')
}
