//! Error types for the pdf2quiz library.
//!
//! Three distinct types reflect three distinct failure modes:
//!
//! * [`Pdf2QuizError`] — **Fatal**: the run cannot produce a usable question
//!   set (source PDF cannot be opened, too few questions survived, output
//!   cannot be written). Returned as `Err(Pdf2QuizError)` from the top-level
//!   `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page's text could not be decoded.
//!   The page contributes empty text and extraction continues.
//!
//! * [`DiscardReason`] — **Non-fatal**: a question span was rejected by one
//!   of the parsing rules. Recorded as a [`crate::output::Diagnostic`] and
//!   skipped.

use crate::output::ExtractionOutput;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2quiz library.
#[derive(Debug, Error)]
pub enum Pdf2QuizError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    SourceUnavailable { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection does not overlap the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Yield errors ──────────────────────────────────────────────────────
    /// Fewer questions survived validation than the configured minimum.
    ///
    /// The partial output is carried along so the caller can inspect the
    /// diagnostics or decide to substitute a fallback question set.
    #[error("Only {accepted} questions were extracted, at least {required} are required")]
    InsufficientYield {
        accepted: usize,
        required: usize,
        partial: Box<ExtractionOutput>,
    },

    // ── Question bank errors ──────────────────────────────────────────────
    /// No record carries the requested id.
    #[error("Question {id} not found")]
    QuestionNotFound { id: u32 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A question set could not be (de)serialised.
    #[error("JSON error for '{path}': {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2QuizError {
    /// `true` for every variant meaning the source PDF could not be opened.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            Pdf2QuizError::FileNotFound { .. }
                | Pdf2QuizError::PermissionDenied { .. }
                | Pdf2QuizError::NotAPdf { .. }
                | Pdf2QuizError::SourceUnavailable { .. }
                | Pdf2QuizError::PasswordRequired { .. }
                | Pdf2QuizError::WrongPassword { .. }
        )
    }
}

/// A non-fatal error for a single page.
///
/// The page contributes empty text; the remaining pages are still read.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PageError {
    /// pdfium could not load the page or its text layer.
    #[error("Page {page}: text could not be decoded: {detail}")]
    UnreadablePage { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::UnreadablePage { page, .. } => *page,
        }
    }
}

/// Why a question span was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// The span was too short to hold a question at all.
    SpanTooShort,
    /// No `Answer: <letter>` marker in the span.
    NoAnswerMarker,
    /// Fewer distinct option letters than required.
    InsufficientOptions,
    /// No stem text precedes the first option marker.
    NoOptionsBoundary,
    /// The cleaned stem is too short.
    StemTooShort,
    /// The answer letter is not one of the extracted options.
    AnswerNotInOptions,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiscardReason::SpanTooShort => "span too short",
            DiscardReason::NoAnswerMarker => "no answer marker",
            DiscardReason::InsufficientOptions => "not enough options",
            DiscardReason::NoOptionsBoundary => "no stem before options",
            DiscardReason::StemTooShort => "stem too short",
            DiscardReason::AnswerNotInOptions => "answer is not an option",
        };
        f.write_str(s)
    }
}
