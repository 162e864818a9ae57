//! Question segmentation: cut the text blob into one span per question marker.
//!
//! A single forward scan finds every non-overlapping marker. The span for
//! marker *i* runs from the end of marker *i* to the start of marker *i + 1*,
//! or to the end of the text for the last marker. Declared numbers are kept
//! for sorting and diagnostics only; duplicates, gaps and out-of-order numbers
//! are expected.

use regex::{Captures, Regex};

/// The text between one question marker and the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    /// 0-based position in text order.
    pub index: usize,
    /// Number printed after the marker.
    pub declared_number: u64,
    /// Byte offset of the marker itself in the source text.
    pub marker_start: usize,
    /// Untrimmed span text.
    pub text: &'a str,
}

impl Span<'_> {
    /// Span text with surrounding whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Cheap pre-filter: `true` when the trimmed span is under `min_chars`.
    pub fn is_too_short(&self, min_chars: usize) -> bool {
        self.trimmed().chars().count() < min_chars
    }
}

/// Split `text` at every match of `marker`.
///
/// Matches whose capture group did not participate are ignored, so only the
/// documented pattern counts as a marker.
pub fn segment<'a>(text: &'a str, marker: &Regex) -> Vec<Span<'a>> {
    let markers: Vec<(u64, usize, usize)> = marker
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = first_group(&caps)?;
            Some((parse_declared(number), whole.start(), whole.end()))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, &(declared_number, marker_start, end))| {
            let stop = markers.get(i + 1).map_or(text.len(), |next| next.1);
            Span {
                index: i,
                declared_number,
                marker_start,
                text: &text[end..stop],
            }
        })
        .collect()
}

/// First capture group that took part in the match.
pub(crate) fn first_group<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.iter().skip(1).flatten().next().map(|m| m.as_str())
}

/// Numbers too long for `u64` sort last.
fn parse_declared(digits: &str) -> u64 {
    digits.trim().parse().unwrap_or(u64::MAX)
}
