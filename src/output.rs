//! Output types: question records, per-span diagnostics and run statistics.
//!
//! [`QuestionRecord`] is the only entity that is persisted. Everything else in
//! [`ExtractionOutput`] describes *how* the records were obtained, so callers
//! can audit a run without scraping log lines.

use crate::error::{DiscardReason, PageError, Pdf2QuizError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One of the four answer letters. Ordered `A < B < C < D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub fn as_char(self) -> char {
        match self {
            OptionLetter::A => 'A',
            OptionLetter::B => 'B',
            OptionLetter::C => 'C',
            OptionLetter::D => 'D',
        }
    }
}

impl FromStr for OptionLetter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionLetter::A),
            "B" => Ok(OptionLetter::B),
            "C" => Ok(OptionLetter::C),
            "D" => Ok(OptionLetter::D),
            _ => Err(()),
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A validated multiple-choice question.
///
/// Serialises to `{ "id", "question", "options", "correct_answer" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Dense 1-based position in the final set, not the printed number.
    pub id: u32,
    /// Prompt text preceding the first option, watermark removed.
    pub question: String,
    /// At least two options; letters need not be contiguous.
    pub options: BTreeMap<OptionLetter, String>,
    pub correct_answer: OptionLetter,
}

/// Why one span produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 0-based index of the span in text order.
    pub span_index: usize,
    /// Number printed after the marker. Diagnostic only.
    pub declared_number: u64,
    pub reason: DiscardReason,
}

/// Counters and timings for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document (0 for in-memory text).
    pub total_pages: usize,
    /// Pages selected for reading.
    pub pages_read: usize,
    pub unreadable_pages: usize,
    /// Characters in the concatenated text blob.
    pub total_chars: usize,
    pub markers_found: usize,
    /// Spans that went through parsing (after the length pre-filter).
    pub spans_parsed: usize,
    pub accepted: usize,
    pub discarded: usize,
    /// `true` when `max_questions` stopped the run early.
    pub capped: bool,
    pub acquisition_ms: u64,
    pub parse_ms: u64,
    pub total_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Accepted records with ids `1..=N`.
    pub questions: Vec<QuestionRecord>,
    /// One entry per discarded span, in span order.
    pub diagnostics: Vec<Diagnostic>,
    /// Pages whose text could not be decoded.
    pub page_errors: Vec<PageError>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Number of discarded spans per reason.
    pub fn discard_counts(&self) -> BTreeMap<DiscardReason, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.diagnostics {
            *counts.entry(d.reason).or_insert(0) += 1;
        }
        counts
    }

    /// The question array as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        questions_to_json(&self.questions)
    }
}

/// Serialise records with a 4-space indent, matching the on-disk bank format.
pub fn questions_to_json(questions: &[QuestionRecord]) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(questions.len() * 512);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    questions.serialize(&mut ser)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse a JSON array of records.
pub fn questions_from_json(
    json: &str,
    path: &Path,
) -> Result<Vec<QuestionRecord>, Pdf2QuizError> {
    serde_json::from_str(json).map_err(|e| Pdf2QuizError::Serialization {
        path: path.to_path_buf(),
        source: e,
    })
}
