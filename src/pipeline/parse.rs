//! Question parsing and validation: turn one span into a provisional record.
//!
//! ## Rule Order
//!
//! Each rule either passes or discards the span with a [`DiscardReason`]:
//!
//! 1. Answer: first `Answer: <letter>` marker            → `NoAnswerMarker`
//! 2. Options: `<letter>.` markers, first occurrence wins → `InsufficientOptions`
//! 3. Stem boundary: earliest option marker, after offset 0 → `NoOptionsBoundary`
//! 4. Stem: watermark stripped, trimmed, length check    → `StemTooShort`
//! 5. Answer must name an extracted option (optional)    → `AnswerNotInOptions`
//!
//! Ids are not assigned here; see [`renumber`].

use crate::config::{ExtractionConfig, ExtractionPatterns};
use crate::error::DiscardReason;
use crate::output::{OptionLetter, QuestionRecord};
use crate::pipeline::segment::{first_group, Span};
use std::collections::BTreeMap;
use std::ops::Range;

/// A record that passed validation but has no final id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    /// Sort key for the final pass; dropped from the output.
    pub declared_number: u64,
    pub stem: String,
    pub options: BTreeMap<OptionLetter, String>,
    pub answer: OptionLetter,
}

/// Acceptance thresholds, split out of [`ExtractionConfig`] so the parser
/// does not depend on I/O settings.
#[derive(Debug, Clone, Copy)]
pub struct AcceptanceRules {
    pub min_stem_chars: usize,
    pub min_options: usize,
    pub require_answer_in_options: bool,
}

impl From<&ExtractionConfig> for AcceptanceRules {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            min_stem_chars: config.min_stem_chars,
            min_options: config.min_options,
            require_answer_in_options: config.require_answer_in_options,
        }
    }
}

/// One option marker found in the span.
#[derive(Debug, Clone, Copy)]
struct OptionMarker {
    letter: OptionLetter,
    start: usize,
    end: usize,
}

/// Parse a single span.
pub fn parse_span(
    span: &Span<'_>,
    patterns: &ExtractionPatterns,
    rules: &AcceptanceRules,
) -> Result<ParsedQuestion, DiscardReason> {
    let text = span.trimmed();

    // ── Rule 1: answer ───────────────────────────────────────────────────
    let (answer, answer_at) = find_answer(text, patterns).ok_or(DiscardReason::NoAnswerMarker)?;
    let answer_start = answer_at.start;

    // ── Rule 2: options ──────────────────────────────────────────────────
    // `Answer: D.` must not read as an option marker for D
    let markers: Vec<OptionMarker> = find_option_markers(text, patterns)
        .into_iter()
        .filter(|m| !answer_at.contains(&m.start))
        .collect();
    let options = collect_options(text, &markers, answer_start);
    if options.len() < rules.min_options {
        return Err(DiscardReason::InsufficientOptions);
    }

    // ── Rule 3: stem boundary ────────────────────────────────────────────
    let boundary = markers
        .first()
        .map(|m| m.start)
        .filter(|&start| start > 0)
        .ok_or(DiscardReason::NoOptionsBoundary)?;

    // ── Rule 4: stem ─────────────────────────────────────────────────────
    let stem = clean_stem(&text[..boundary], patterns);
    if stem.chars().count() <= rules.min_stem_chars {
        return Err(DiscardReason::StemTooShort);
    }

    // ── Rule 5: answer ∈ options ─────────────────────────────────────────
    if rules.require_answer_in_options && !options.contains_key(&answer) {
        return Err(DiscardReason::AnswerNotInOptions);
    }

    Ok(ParsedQuestion {
        declared_number: span.declared_number,
        stem,
        options,
        answer,
    })
}

/// First answer marker whose captured letter is A–D, with its byte range.
fn find_answer(
    text: &str,
    patterns: &ExtractionPatterns,
) -> Option<(OptionLetter, Range<usize>)> {
    patterns.answer.captures_iter(text).find_map(|caps| {
        let letter = first_group(&caps)?.parse().ok()?;
        Some((letter, caps.get(0)?.range()))
    })
}

/// All option markers in text order. Markers whose letter is not A–D are skipped.
fn find_option_markers(text: &str, patterns: &ExtractionPatterns) -> Vec<OptionMarker> {
    patterns
        .option
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let letter = first_group(&caps)?.parse().ok()?;
            Some(OptionMarker {
                letter,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Option text runs to the next option marker, the answer marker, or the
/// end of the span, whichever comes first. Repeated letters keep the first.
fn collect_options(
    text: &str,
    markers: &[OptionMarker],
    answer_start: usize,
) -> BTreeMap<OptionLetter, String> {
    let mut options = BTreeMap::new();
    for (i, marker) in markers.iter().enumerate() {
        let mut stop = markers.get(i + 1).map_or(text.len(), |next| next.start);
        if answer_start >= marker.end && answer_start < stop {
            stop = answer_start;
        }
        options
            .entry(marker.letter)
            .or_insert_with(|| text[marker.end..stop].trim().to_string());
    }
    options
}

fn clean_stem(raw: &str, patterns: &ExtractionPatterns) -> String {
    patterns.watermark.replace_all(raw, "").trim().to_string()
}

/// Final pass: optionally stable-sort by declared number, then assign ids
/// `1..=N` in that order.
pub fn renumber(mut parsed: Vec<ParsedQuestion>, sort_by_declared: bool) -> Vec<QuestionRecord> {
    if sort_by_declared {
        // sort_by_key is stable: equal numbers keep span order
        parsed.sort_by_key(|p| p.declared_number);
    }
    parsed
        .into_iter()
        .zip(1u32..)
        .map(|(p, id)| QuestionRecord {
            id,
            question: p.stem,
            options: p.options,
            correct_answer: p.answer,
        })
        .collect()
}
