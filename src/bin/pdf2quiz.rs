//! CLI binary for pdf2quiz.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig`, writes the question bank and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2quiz::{
    extract, write_questions, ExtractionConfig, ExtractionOutput, ExtractionProgressCallback,
    PageSelection, Pdf2QuizError, ProgressCallback, QuestionBank, QuestionRecord,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a page bar while pdfium reads the document,
/// then a spinner while spans are parsed.
struct CliProgressCallback {
    bar: ProgressBar,
    unreadable: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_extraction_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            unreadable: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Reading");
        self.bar.reset_eta();
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_extracted(&self, _page_num: usize, _total_pages: usize, _chars: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.unreadable.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>4}/{:<4}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_parse_start(&self, spans: usize) {
        self.bar.set_prefix("Parsing");
        self.bar.set_message(format!("{spans} question markers"));
    }

    fn on_extraction_complete(&self, accepted: usize, discarded: usize) {
        self.bar.finish_and_clear();
        let unreadable = self.unreadable.load(Ordering::SeqCst);
        eprintln!(
            "{} {} questions accepted  {}",
            if accepted > 0 { green("✔") } else { red("✘") },
            bold(&accepted.to_string()),
            dim(&format!("({discarded} spans discarded, {unreadable} pages unreadable)")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to a JSON question bank
  pdf2quiz dump.pdf -o questions.json

  # Only the first 50 pages, stop after 100 questions
  pdf2quiz --pages 1-50 --max-questions 100 dump.pdf -o questions.json

  # Fall back to a seed bank when fewer than 25 questions survive
  pdf2quiz --min-accepted 25 --fallback seed.json dump.pdf -o questions.json

  # Show why spans were discarded
  pdf2quiz --diagnostics dump.pdf > questions.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise ./ then the system library)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Extract multiple-choice questions from a PDF dump into JSON.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2quiz",
    version,
    about = "Extract multiple-choice exam questions from a PDF dump into JSON",
    long_about = "Read a PDF of exam dumps, split it at \"Question N\" markers, extract the stem, \
options A–D and the \"Answer: X\" letter for each question, and write the validated set as a \
pretty-printed JSON array with ids 1..N.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "PDF2QUIZ_OUTPUT")]
    output: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2QUIZ_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2QUIZ_PASSWORD")]
    password: Option<String>,

    /// Fail (or use --fallback) when fewer questions survive.
    #[arg(long, env = "PDF2QUIZ_MIN_ACCEPTED", default_value_t = 10)]
    min_accepted: usize,

    /// Stop once this many questions were accepted.
    #[arg(long, env = "PDF2QUIZ_MAX_QUESTIONS",
          value_parser = clap::value_parser!(u64).range(1..))]
    max_questions: Option<u64>,

    /// Keep document order instead of sorting by printed question number.
    #[arg(long, env = "PDF2QUIZ_NO_SORT")]
    no_sort: bool,

    /// Accept questions whose answer letter is not among the extracted options.
    #[arg(long, env = "PDF2QUIZ_ALLOW_FOREIGN_ANSWER")]
    allow_foreign_answer: bool,

    /// Custom question-marker regex; group 1 is the question number.
    #[arg(long, env = "PDF2QUIZ_MARKER_PATTERN")]
    marker_pattern: Option<String>,

    /// Custom option-marker regex; group 1 is the letter.
    #[arg(long, env = "PDF2QUIZ_OPTION_PATTERN")]
    option_pattern: Option<String>,

    /// Custom answer-marker regex; group 1 is the letter.
    #[arg(long, env = "PDF2QUIZ_ANSWER_PATTERN")]
    answer_pattern: Option<String>,

    /// Custom watermark regex stripped from stems.
    #[arg(long, env = "PDF2QUIZ_WATERMARK_PATTERN")]
    watermark_pattern: Option<String>,

    /// Question bank JSON written instead when too few questions survive.
    #[arg(long, env = "PDF2QUIZ_FALLBACK")]
    fallback: Option<PathBuf>,

    /// Print every discarded span and its reason to stderr.
    #[arg(long, env = "PDF2QUIZ_DIAGNOSTICS")]
    diagnostics: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2QUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2QUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2QUIZ_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let questions = match extract(&cli.input, &config).await {
        Ok(output) => {
            report(&cli, &output);
            output.questions
        }
        Err(Pdf2QuizError::InsufficientYield {
            accepted,
            required,
            partial,
        }) => {
            report(&cli, &partial);
            let Some(ref seed) = cli.fallback else {
                anyhow::bail!(
                    "Only {accepted} questions extracted, {required} required \
                     (pass --fallback <FILE> to substitute a seed bank)"
                );
            };
            warn!(
                "Only {} of {} required questions extracted, using fallback {}",
                accepted,
                required,
                seed.display()
            );
            if !cli.quiet {
                eprintln!(
                    "{}  {} of {} required questions, using fallback {}",
                    yellow("⚠"),
                    accepted,
                    required,
                    bold(&seed.display().to_string()),
                );
            }
            load_fallback(seed)?
        }
        Err(e) => return Err(e).context("Extraction failed"),
    };

    // ── Write output ─────────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        write_questions(output_path, &questions)
            .await
            .context("Failed to write question bank")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} questions  →  {}",
                green("✔"),
                questions.len(),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let json = pdf2quiz::output::questions_to_json(&questions)
            .context("Failed to serialise questions")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .pages(parse_pages(&cli.pages)?)
        .min_accepted(cli.min_accepted)
        .sort_by_declared(!cli.no_sort)
        .require_answer_in_options(!cli.allow_foreign_answer);

    if let Some(max) = cli.max_questions {
        builder = builder.max_questions(usize::try_from(max).unwrap_or(usize::MAX));
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref p) = cli.marker_pattern {
        builder = builder.marker_pattern(p.clone());
    }
    if let Some(ref p) = cli.option_pattern {
        builder = builder.option_pattern(p.clone());
    }
    if let Some(ref p) = cli.answer_pattern {
        builder = builder.answer_pattern(p.clone());
    }
    if let Some(ref p) = cli.watermark_pattern {
        builder = builder.watermark_pattern(p.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Seed records, renumbered so the written bank keeps dense ids.
fn load_fallback(path: &Path) -> Result<Vec<QuestionRecord>> {
    let bank = QuestionBank::load(path)
        .with_context(|| format!("Failed to load fallback bank {:?}", path))?;
    if bank.is_empty() {
        anyhow::bail!("Fallback bank {:?} is missing or empty", path);
    }
    Ok(bank
        .into_records()
        .into_iter()
        .zip(1u32..)
        .map(|(q, id)| QuestionRecord { id, ..q })
        .collect())
}

/// Print the discard summary (and, with --diagnostics, every discard).
fn report(cli: &Cli, output: &ExtractionOutput) {
    if cli.quiet {
        return;
    }
    if cli.diagnostics {
        for d in &output.diagnostics {
            eprintln!(
                "  {} span {:>4}  question {:>5}  {}",
                cyan("·"),
                d.span_index,
                d.declared_number,
                d.reason
            );
        }
        for e in &output.page_errors {
            eprintln!("  {} {}", red("✗"), e);
        }
    }
    let counts = output.discard_counts();
    if !counts.is_empty() {
        let summary: Vec<String> = counts
            .iter()
            .map(|(reason, n)| format!("{reason}: {n}"))
            .collect();
        eprintln!("   {}", dim(&summary.join("  ·  ")));
    }
    eprintln!(
        "   {}",
        dim(&format!(
            "{} pages, {} markers, {}ms total",
            output.stats.pages_read, output.stats.markers_found, output.stats.total_ms
        ))
    );
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_forms() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages(" 7 ").unwrap(), PageSelection::Single(7));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            parse_pages("1,3,5").unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn parse_pages_rejects_bad_input() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("9-2").is_err());
        assert!(parse_pages("1,x").is_err());
        assert!(parse_pages("1,0").is_err());
    }

    #[test]
    fn cli_maps_onto_config() {
        let cli = Cli::parse_from([
            "pdf2quiz",
            "dump.pdf",
            "--min-accepted",
            "3",
            "--max-questions",
            "40",
            "--no-sort",
            "--allow-foreign-answer",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.min_accepted, 3);
        assert_eq!(config.max_questions, Some(40));
        assert!(!config.sort_by_declared);
        assert!(!config.require_answer_in_options);
    }

    #[test]
    fn fallback_is_renumbered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 4, "question": "Which vault stores backups?", "options": {"A": "Recovery Services", "B": "Key Vault"}, "correct_answer": "A"},
                {"id": 9, "question": "Which gateway routes by URL path?", "options": {"C": "Application Gateway", "D": "Load Balancer"}, "correct_answer": "C"}
            ]"#,
        )
        .unwrap();
        let records = load_fallback(&path).unwrap();
        let ids: Vec<u32> = records.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn missing_fallback_is_an_error() {
        assert!(load_fallback(Path::new("/definitely/not/seed.json")).is_err());
    }
}
