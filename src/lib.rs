//! # pdf2quiz
//!
//! Extract multiple-choice exam questions from PDF question dumps into a
//! validated, densely numbered JSON question bank.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Acquire   page text via pdfium, concatenated in page order
//!  ├─ 2. Segment   split at "Question N" / "QUESTION N" markers
//!  ├─ 3. Parse     answer, options A–D, stem; reject malformed spans
//!  └─ 4. Renumber  stable sort by printed number, ids 1..N
//! ```
//!
//! Every rejected span is reported as a [`Diagnostic`] with its reason; a
//! run that keeps fewer than `min_accepted` questions returns
//! [`Pdf2QuizError::InsufficientYield`] so the caller can decide what to do.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2quiz::{extract_to_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract_to_file("dump.pdf", "questions.json", &config).await?;
//!     eprintln!("{} questions, {} spans discarded",
//!         output.stats.accepted,
//!         output.stats.discarded);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2quiz` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod bank;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use bank::QuestionBank;
pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, ExtractionPatterns, PageSelection,
    DEFAULT_ANSWER_PATTERN, DEFAULT_MARKER_PATTERN, DEFAULT_OPTION_PATTERN,
    DEFAULT_WATERMARK_PATTERN,
};
pub use error::{DiscardReason, PageError, Pdf2QuizError};
pub use extract::{extract, extract_sync, extract_text, extract_to_file, write_questions};
pub use output::{
    Diagnostic, ExtractionOutput, ExtractionStats, OptionLetter, QuestionRecord,
};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
