//! Extraction entry points.
//!
//! [`extract`] reads a PDF and runs the full pipeline; [`extract_text`] runs
//! the same pipeline over text that is already in memory. Both return an
//! [`ExtractionOutput`] carrying the records, every discard diagnostic and the
//! run statistics, or a fatal [`Pdf2QuizError`].
//!
//! A run that keeps fewer than `min_accepted` records ends in
//! [`Pdf2QuizError::InsufficientYield`]. The library never substitutes
//! placeholder questions; that decision belongs to the caller.

use crate::config::ExtractionConfig;
use crate::error::{DiscardReason, Pdf2QuizError};
use crate::output::{questions_to_json, Diagnostic, ExtractionOutput, ExtractionStats, QuestionRecord};
use crate::pipeline::acquire::{self, AcquiredText};
use crate::pipeline::parse::{self, AcceptanceRules};
use crate::pipeline::segment;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract questions from the PDF at `path`.
///
/// # Errors
/// - the PDF cannot be opened (see [`Pdf2QuizError::is_source_unavailable`])
/// - the page selection does not overlap the document
/// - fewer than `config.min_accepted` records survive
pub async fn extract(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2QuizError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    info!("Starting extraction: {}", path.display());

    // ── Step 1: Acquire text ─────────────────────────────────────────────
    let acquire_start = Instant::now();
    let acquired = acquire::acquire_pdf_text(path, config).await?;
    let acquisition_ms = acquire_start.elapsed().as_millis() as u64;
    info!("Acquired text in {}ms", acquisition_ms);

    // ── Step 2–4: Segment, parse, renumber ───────────────────────────────
    let mut output = run_pipeline(acquired, config);
    output.stats.acquisition_ms = acquisition_ms;
    output.stats.total_ms = total_start.elapsed().as_millis() as u64;

    check_yield(output, config)
}

/// Run the pipeline over in-memory text. No PDF or pdfium is involved.
pub fn extract_text(
    text: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2QuizError> {
    let total_start = Instant::now();
    let acquired = AcquiredText {
        text: text.to_string(),
        ..Default::default()
    };
    let mut output = run_pipeline(acquired, config);
    output.stats.total_ms = total_start.elapsed().as_millis() as u64;
    check_yield(output, config)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2QuizError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2QuizError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(path, config))
}

/// Extract from `input` and write the question array to `output_path`.
///
/// Nothing is written when extraction fails, including on
/// [`Pdf2QuizError::InsufficientYield`].
pub async fn extract_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2QuizError> {
    let output = extract(input, config).await?;
    write_questions(output_path, &output.questions).await?;
    Ok(output)
}

/// Write records as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_questions(
    output_path: impl AsRef<Path>,
    questions: &[QuestionRecord],
) -> Result<(), Pdf2QuizError> {
    let path = output_path.as_ref();
    let json = questions_to_json(questions).map_err(|e| Pdf2QuizError::Serialization {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2QuizError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| Pdf2QuizError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2QuizError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Saved {} questions to {}", questions.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Segment, parse and renumber. Never fails; every rejected span becomes a
/// [`Diagnostic`].
fn run_pipeline(acquired: AcquiredText, config: &ExtractionConfig) -> ExtractionOutput {
    let parse_start = Instant::now();
    let rules = AcceptanceRules::from(config);
    let text = acquired.text.as_str();

    let spans = segment::segment(text, &config.patterns.marker);
    info!("Found {} question markers", spans.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_parse_start(spans.len());
    }

    let mut parsed = Vec::new();
    let mut diagnostics = Vec::new();
    let mut spans_parsed = 0usize;
    let mut capped = false;

    for span in &spans {
        if config.max_questions.is_some_and(|max| parsed.len() >= max) {
            capped = true;
            info!(
                "Reached max_questions={}, {} spans left unread",
                parsed.len(),
                spans.len() - span.index
            );
            break;
        }

        let outcome = if span.is_too_short(config.min_span_chars) {
            Err(DiscardReason::SpanTooShort)
        } else {
            spans_parsed += 1;
            parse::parse_span(span, &config.patterns, &rules)
        };

        match outcome {
            Ok(question) => {
                parsed.push(question);
                if parsed.len() % 50 == 0 {
                    debug!("Accepted {} questions so far", parsed.len());
                }
            }
            Err(reason) => {
                debug!("Question {}: {}, skipping", span.declared_number, reason);
                diagnostics.push(Diagnostic {
                    span_index: span.index,
                    declared_number: span.declared_number,
                    reason,
                });
            }
        }
    }

    let questions = parse::renumber(parsed, config.sort_by_declared);

    let stats = ExtractionStats {
        total_pages: acquired.total_pages,
        pages_read: acquired.pages.len(),
        unreadable_pages: acquired.page_errors.len(),
        total_chars: text.chars().count(),
        markers_found: spans.len(),
        spans_parsed,
        accepted: questions.len(),
        discarded: diagnostics.len(),
        capped,
        acquisition_ms: 0,
        parse_ms: parse_start.elapsed().as_millis() as u64,
        total_ms: 0,
    };

    if !diagnostics.is_empty() {
        warn!(
            "Discarded {} of {} spans",
            diagnostics.len(),
            spans.len()
        );
    }
    info!(
        "Extraction complete: {} questions accepted in {}ms",
        stats.accepted, stats.parse_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(stats.accepted, stats.discarded);
    }

    ExtractionOutput {
        questions,
        diagnostics,
        page_errors: acquired.page_errors,
        stats,
    }
}

fn check_yield(
    output: ExtractionOutput,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2QuizError> {
    if output.questions.len() < config.min_accepted {
        warn!(
            "Only {} questions extracted, {} required",
            output.questions.len(),
            config.min_accepted
        );
        return Err(Pdf2QuizError::InsufficientYield {
            accepted: output.questions.len(),
            required: config.min_accepted,
            partial: Box::new(output),
        });
    }
    Ok(output)
}
