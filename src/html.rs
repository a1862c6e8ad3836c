//! HTML table and link extraction.
//!
//! The results site renders every classification as a plain `<table>`:
//! one header row of `<th>` cells followed by `<tr>`/`<td>` rows. Layout
//! columns with empty headers pad both sides of the table and are dropped.

use regex::Regex;
use std::sync::LazyLock;

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").expect("valid regex"));
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").expect("valid regex"));
static CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<t([hd])\b[^>]*>(.*?)</t[hd]\s*>").expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*?\bhref\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

/// Row-oriented table as published, header names kept verbatim
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell value for `name` in `row`; `None` for absent columns or empty cells
    pub fn value<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        let idx = self.column_index(name)?;
        row.get(idx).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Keep the first row for each distinct key; returns the number dropped
    pub fn retain_first_by<K, F>(&mut self, mut key: F) -> usize
    where
        K: Eq + std::hash::Hash,
        F: FnMut(&RawTable, &[String]) -> K,
    {
        let before = self.rows.len();
        let mut seen = std::collections::HashSet::new();
        let rows = std::mem::take(&mut self.rows);
        self.rows = rows
            .into_iter()
            .filter(|row| seen.insert(key(self, row)))
            .collect();
        before - self.rows.len()
    }
}

/// Extract the first `<table>` of a document
pub fn first_table(doc: &str) -> Option<RawTable> {
    let table = TABLE_RE.captures(doc)?.get(1)?.as_str();

    let mut header: Option<Vec<String>> = None;
    let mut body: Vec<Vec<String>> = Vec::new();

    for row in ROW_RE.captures_iter(table) {
        let inner = row.get(1).map_or("", |m| m.as_str());
        let mut is_header_row = false;
        let cells: Vec<String> = CELL_RE
            .captures_iter(inner)
            .map(|cap| {
                if cap.get(1).is_some_and(|k| k.as_str().eq_ignore_ascii_case("h")) {
                    is_header_row = true;
                }
                cell_text(cap.get(2).map_or("", |m| m.as_str()))
            })
            .collect();

        if cells.is_empty() {
            continue;
        }
        if header.is_none() && (is_header_row || body.is_empty()) {
            header = Some(cells);
        } else {
            body.push(cells);
        }
    }

    let header = header?;
    let keep: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty())
        .map(|(i, _)| i)
        .collect();

    let headers = keep.iter().map(|&i| header[i].clone()).collect();
    let rows = body
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Some(RawTable::new(headers, rows))
}

/// All hrefs in document order, entities decoded
pub fn links(doc: &str) -> Vec<String> {
    HREF_RE
        .captures_iter(doc)
        .filter_map(|cap| cap.get(1))
        .map(|m| normalize_entities(m.as_str()))
        .collect()
}

/// Visible text of a cell: tags stripped, entities decoded, whitespace collapsed
pub fn cell_text(fragment: &str) -> String {
    let without_tags = TAG_RE.replace_all(fragment, " ");
    normalize_ws(&normalize_entities(&without_tags))
}

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
