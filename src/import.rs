// src/import.rs

//! Student roster import from worksheet rows.
//!
//! The client converts the spreadsheet into either JSON row objects (one
//! object per row, keyed by header) or CSV text. Headers are matched
//! case-insensitively against the Indonesian and English variants.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::student::NewStudent;

pub const NAME_HEADERS: &[&str] = &["name", "nama"];
pub const NISN_HEADERS: &[&str] = &["nisn", "nis"];
pub const CLASS_HEADERS: &[&str] = &["class", "kelas"];

pub const BAD_FORMAT: &str = "Format file tidak sesuai. Pastikan ada kolom Nama, NISN, dan Kelas.";

/// Header line of the downloadable template.
pub const TEMPLATE_CSV: &str = "Nama,NISN,Kelas\n";

/// Import request body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImportPayload {
    Rows { rows: Vec<Map<String, Value>> },
    Csv { csv: String },
}

impl ImportPayload {
    pub fn into_students(self) -> Vec<NewStudent> {
        match self {
            ImportPayload::Rows { rows } => students_from_rows(&rows),
            ImportPayload::Csv { csv } => students_from_csv(&csv),
        }
    }
}

/// Cell text: strings are trimmed, numbers are written out (NISN cells are
/// often numeric). Anything else counts as missing.
fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// First header variant present with a usable value, in variant order.
fn pick(row: &Map<String, Value>, variants: &[&str]) -> Option<String> {
    variants.iter().find_map(|variant| {
        row.iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(variant))
            .and_then(|(_, value)| cell_text(value))
    })
}

/// Keeps only rows with all of name, NISN and class.
pub fn students_from_rows(rows: &[Map<String, Value>]) -> Vec<NewStudent> {
    rows.iter()
        .filter_map(|row| {
            Some(NewStudent {
                name: pick(row, NAME_HEADERS)?,
                nisn: pick(row, NISN_HEADERS)?,
                class: pick(row, CLASS_HEADERS)?,
            })
        })
        .collect()
}

/// Semicolon when the header line uses more semicolons than commas,
/// comma otherwise.
pub fn detect_delimiter(header: &str) -> char {
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();
    if semicolons > commas { ';' } else { ',' }
}

pub fn parse_csv_record(line: &str, delimiter: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// CSV with a header line. Comma or semicolon separated (spreadsheet exports
/// in Indonesian locales use semicolons); the header decides which, and the
/// other character is plain cell text.
pub fn students_from_csv(text: &str) -> Vec<NewStudent> {
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .filter(|l| !l.trim().is_empty());

    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let delimiter = detect_delimiter(header);
    let headers = parse_csv_record(header, delimiter);

    let rows: Vec<Map<String, Value>> = lines
        .map(|line| {
            headers
                .iter()
                .zip(parse_csv_record(line, delimiter))
                .map(|(h, v)| (h.trim().to_string(), Value::String(v)))
                .collect()
        })
        .collect();

    students_from_rows(&rows)
}
