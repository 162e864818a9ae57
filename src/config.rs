//! Configuration types for question extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The three text patterns that drive the
//! pipeline (question marker, option marker, answer marker) plus the watermark
//! are named constants and can be substituted per document family instead of
//! forking the extractor.

use crate::error::Pdf2QuizError;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// `Question 12`, `QUESTION: 12`, `question12`. Group 1 is the declared number.
pub const DEFAULT_MARKER_PATTERN: &str = r"(?i)question:?\s*([0-9]+)";

/// `A.` … `D.` at a word boundary. Group 1 is the letter.
pub const DEFAULT_OPTION_PATTERN: &str = r"\b([A-D])\.";

/// `Answer: B`, `ANSWER B`. Only the keyword is case-insensitive.
pub const DEFAULT_ANSWER_PATTERN: &str = r"(?i:answer):?\s*([A-D])\b";

/// Vendor watermark injected into the dump, with or without the inner space.
pub const DEFAULT_WATERMARK_PATTERN: &str = r"Certy\s*IQ";

static RE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_MARKER_PATTERN).unwrap());
static RE_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_OPTION_PATTERN).unwrap());
static RE_ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_ANSWER_PATTERN).unwrap());
static RE_WATERMARK: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_WATERMARK_PATTERN).unwrap());

/// The compiled patterns the pipeline matches against.
///
/// For `marker`, `option` and `answer` the first capture group that
/// participates in a match is the payload, so alternations such as
/// `Question\s+(\d+)|QUESTION\s+(\d+)` work unchanged.
#[derive(Debug, Clone)]
pub struct ExtractionPatterns {
    pub marker: Regex,
    pub option: Regex,
    pub answer: Regex,
    pub watermark: Regex,
}

impl Default for ExtractionPatterns {
    fn default() -> Self {
        Self {
            marker: RE_MARKER.clone(),
            option: RE_OPTION.clone(),
            answer: RE_ANSWER.clone(),
            watermark: RE_WATERMARK.clone(),
        }
    }
}

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2quiz::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .min_accepted(25)
///     .max_questions(200)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    pub patterns: ExtractionPatterns,

    /// Spans shorter than this many characters (after trimming) are dropped
    /// before parsing. Default: 20.
    pub min_span_chars: usize,

    /// The cleaned stem must be strictly longer than this. Default: 10.
    pub min_stem_chars: usize,

    /// Minimum number of distinct option letters. Never below 2. Default: 2.
    pub min_options: usize,

    /// Fewer surviving records than this ends the run with
    /// [`Pdf2QuizError::InsufficientYield`]. Default: 10.
    pub min_accepted: usize,

    /// Stop accepting once this many records exist. Default: no cap.
    pub max_questions: Option<usize>,

    /// Stable-sort by declared number before assigning ids. Default: true.
    pub sort_by_declared: bool,

    /// Reject spans whose answer letter is not one of the options. Default: true.
    pub require_answer_in_options: bool,

    /// Pages to read. Default: all.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional progress event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            patterns: ExtractionPatterns::default(),
            min_span_chars: 20,
            min_stem_chars: 10,
            min_options: 2,
            min_accepted: 10,
            max_questions: None,
            sort_by_declared: true,
            require_answer_in_options: true,
            pages: PageSelection::default(),
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("marker", &self.patterns.marker.as_str())
            .field("option", &self.patterns.option.as_str())
            .field("answer", &self.patterns.answer.as_str())
            .field("watermark", &self.patterns.watermark.as_str())
            .field("min_span_chars", &self.min_span_chars)
            .field("min_stem_chars", &self.min_stem_chars)
            .field("min_options", &self.min_options)
            .field("min_accepted", &self.min_accepted)
            .field("max_questions", &self.max_questions)
            .field("sort_by_declared", &self.sort_by_declared)
            .field("require_answer_in_options", &self.require_answer_in_options)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
            marker: None,
            option: None,
            answer: None,
            watermark: None,
        }
    }
}

/// Builder for [`ExtractionConfig`].
///
/// Pattern setters take source strings; they are compiled and checked in
/// [`build`](Self::build).
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
    marker: Option<String>,
    option: Option<String>,
    answer: Option<String>,
    watermark: Option<String>,
}

impl ExtractionConfigBuilder {
    pub fn marker_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.marker = Some(pattern.into());
        self
    }

    pub fn option_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.option = Some(pattern.into());
        self
    }

    pub fn answer_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.answer = Some(pattern.into());
        self
    }

    pub fn watermark_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.watermark = Some(pattern.into());
        self
    }

    pub fn min_span_chars(mut self, n: usize) -> Self {
        self.config.min_span_chars = n;
        self
    }

    pub fn min_stem_chars(mut self, n: usize) -> Self {
        self.config.min_stem_chars = n;
        self
    }

    pub fn min_options(mut self, n: usize) -> Self {
        self.config.min_options = n.clamp(2, 4);
        self
    }

    pub fn min_accepted(mut self, n: usize) -> Self {
        self.config.min_accepted = n;
        self
    }

    pub fn max_questions(mut self, n: usize) -> Self {
        self.config.max_questions = Some(n);
        self
    }

    pub fn sort_by_declared(mut self, v: bool) -> Self {
        self.config.sort_by_declared = v;
        self
    }

    pub fn require_answer_in_options(mut self, v: bool) -> Self {
        self.config.require_answer_in_options = v;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, compiling and validating custom patterns.
    pub fn build(mut self) -> Result<ExtractionConfig, Pdf2QuizError> {
        if let Some(src) = self.marker.take() {
            self.config.patterns.marker = compile("marker", &src, true)?;
        }
        if let Some(src) = self.option.take() {
            self.config.patterns.option = compile("option", &src, true)?;
        }
        if let Some(src) = self.answer.take() {
            self.config.patterns.answer = compile("answer", &src, true)?;
        }
        if let Some(src) = self.watermark.take() {
            self.config.patterns.watermark = compile("watermark", &src, false)?;
        }
        if self.config.max_questions == Some(0) {
            return Err(Pdf2QuizError::InvalidConfig(
                "max_questions must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

fn compile(name: &str, src: &str, needs_group: bool) -> Result<Regex, Pdf2QuizError> {
    let re = Regex::new(src).map_err(|e| {
        Pdf2QuizError::InvalidConfig(format!("{name} pattern {src:?} does not compile: {e}"))
    })?;
    // captures_len counts the implicit whole-match group
    if needs_group && re.captures_len() < 2 {
        return Err(Pdf2QuizError::InvalidConfig(format!(
            "{name} pattern {src:?} needs a capture group"
        )));
    }
    if re.is_match("") {
        return Err(Pdf2QuizError::InvalidConfig(format!(
            "{name} pattern {src:?} matches the empty string"
        )));
    }
    Ok(re)
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Read all pages (default).
    #[default]
    All,
    /// Read a single page (1-indexed).
    Single(usize),
    /// Read a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Read specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.min_span_chars, 20);
        assert_eq!(c.min_stem_chars, 10);
        assert_eq!(c.min_options, 2);
        assert_eq!(c.min_accepted, 10);
        assert!(c.max_questions.is_none());
        assert!(c.sort_by_declared);
        assert!(c.require_answer_in_options);
        assert_eq!(c.patterns.marker.as_str(), DEFAULT_MARKER_PATTERN);
    }

    #[test]
    fn default_marker_matches_both_spellings() {
        let re = &ExtractionPatterns::default().marker;
        assert_eq!(&re.captures("Question 12").unwrap()[1], "12");
        assert_eq!(&re.captures("QUESTION: 7").unwrap()[1], "7");
        assert!(re.captures("Question without number").is_none());
    }

    #[test]
    fn default_answer_letter_is_case_sensitive() {
        let re = &ExtractionPatterns::default().answer;
        assert_eq!(&re.captures("ANSWER: C").unwrap()[1], "C");
        assert_eq!(&re.captures("answer D").unwrap()[1], "D");
        assert!(re.captures("Answer: a").is_none());
        assert!(re.captures("the answer Azure").is_none());
    }

    #[test]
    fn custom_patterns_are_compiled() {
        let c = ExtractionConfig::builder()
            .marker_pattern(r"Q(\d+)\)")
            .option_pattern(r"\(([A-D])\)")
            .build()
            .unwrap();
        assert!(c.patterns.marker.is_match("Q5)"));
        assert!(c.patterns.option.is_match("(B)"));
    }

    #[test]
    fn pattern_without_group_is_rejected() {
        let err = ExtractionConfig::builder()
            .answer_pattern(r"Answer:\s*[A-D]")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2QuizError::InvalidConfig(_)));
    }

    #[test]
    fn broken_pattern_is_rejected() {
        let err = ExtractionConfig::builder()
            .marker_pattern(r"Question(\d+")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("marker"));
    }

    #[test]
    fn empty_matching_watermark_is_rejected() {
        assert!(ExtractionConfig::builder()
            .watermark_pattern(r"(Certy)?")
            .build()
            .is_err());
    }

    #[test]
    fn min_options_never_below_two() {
        let c = ExtractionConfig::builder().min_options(0).build().unwrap();
        assert_eq!(c.min_options, 2);
    }

    #[test]
    fn zero_cap_is_invalid() {
        assert!(ExtractionConfig::builder().max_questions(0).build().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ExtractionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2]
        );
    }
}
