use std::sync::LazyLock;

use regex::Regex;

use crate::fingerprint::content_hash;

static RE_INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// Normalized monograph text plus its content fingerprint.
///
/// Flattened table rows are appended after the body, one per line, so they
/// take part in sentence and line scanning like any other text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonographDocument {
    text: String,
    fingerprint: String,
}

impl MonographDocument {
    pub fn new(text: &str) -> Self {
        Self::with_table_rows(text, &[])
    }

    pub fn with_table_rows(text: &str, table_rows: &[String]) -> Self {
        let mut lines: Vec<String> = normalize_lines(text);
        for row in table_rows {
            lines.extend(normalize_lines(row));
        }
        let text = lines.join("\n");
        let fingerprint = content_hash(text.as_bytes());
        Self { text, fingerprint }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Base64 SHA-256 of the normalized text.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Copy of this document cut to at most `max_chars` characters.
    pub fn truncated(&self, max_chars: usize) -> Self {
        match self.text.char_indices().nth(max_chars) {
            Some((cut, _)) => Self::new(&self.text[..cut]),
            None => self.clone(),
        }
    }

    /// Non-empty lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().filter(|l| !l.is_empty())
    }

    /// Sentences, split at whitespace that follows a period or contains a
    /// line break. Decimal points ("2.5 mg") never split.
    pub fn sentences(&self) -> Vec<&str> {
        split_sentences(&self.text)
    }
}

fn normalize_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| RE_INLINE_SPACE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((idx, c)) = chars.next() {
        if !c.is_whitespace() {
            prev = Some(c);
            continue;
        }
        // Consume the whole whitespace run.
        let mut end = idx + c.len_utf8();
        let mut has_newline = c == '\n';
        while let Some(&(next_idx, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            has_newline |= next == '\n';
            end = next_idx + next.len_utf8();
            chars.next();
        }
        if has_newline || prev == Some('.') {
            push_trimmed(&mut sentences, &text[start..idx]);
            start = end;
        }
        prev = Some(c);
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece);
    }
}
