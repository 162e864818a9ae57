//! Text acquisition: read the selected pages of a PDF into one text blob.
//!
//! Page text comes from pdfium's text layer in reading order. Every page
//! contributes its text followed by `"\n"`; a page whose text cannot be
//! decoded contributes only the newline and a [`PageError`], and reading
//! continues. Page boundaries are kept for progress reporting only.
//!
//! `pdfium-render` wraps a C++ library with thread-local state, so the whole
//! read runs inside `tokio::task::spawn_blocking`. Everything after this
//! stage operates on the in-memory blob.

use crate::config::{ExtractionConfig, PageSelection};
use crate::error::{PageError, Pdf2QuizError};
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::io::Read;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Anything that can hand out plain text per page.
///
/// Implemented for pdfium documents; tests use in-memory pages.
pub trait PageTextSource {
    /// Total pages in the document.
    fn page_count(&self) -> usize;

    /// Plain text of the page at 0-based `index`, or a human-readable reason.
    fn page_text(&self, index: usize) -> Result<String, String>;
}

/// Where one page's text sits inside [`AcquiredText::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpan {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Byte range, including the trailing newline.
    pub range: Range<usize>,
}

/// The concatenated text of all selected pages.
#[derive(Debug, Clone, Default)]
pub struct AcquiredText {
    pub text: String,
    pub pages: Vec<PageSpan>,
    pub page_errors: Vec<PageError>,
    /// Pages in the document, selected or not.
    pub total_pages: usize,
}

/// Read the selected pages of `source` in page order.
pub fn collect_pages(
    source: &dyn PageTextSource,
    selection: &PageSelection,
    progress: Option<&ProgressCallback>,
) -> Result<AcquiredText, Pdf2QuizError> {
    let total_pages = source.page_count();
    let indices = selection.to_indices(total_pages);
    if indices.is_empty() {
        return Err(Pdf2QuizError::PageOutOfRange {
            page: first_requested_page(selection, total_pages),
            total: total_pages,
        });
    }

    if let Some(cb) = progress {
        cb.on_extraction_start(indices.len());
    }

    let mut acquired = AcquiredText {
        total_pages,
        ..Default::default()
    };

    for idx in indices {
        let page_num = idx + 1;
        let start = acquired.text.len();
        match source.page_text(idx) {
            Ok(text) => {
                acquired.text.push_str(&text);
                debug!("Page {}: {} chars", page_num, text.chars().count());
                if let Some(cb) = progress {
                    cb.on_page_extracted(page_num, total_pages, text.chars().count());
                }
            }
            Err(detail) => {
                warn!("Page {} unreadable, skipping: {}", page_num, detail);
                if let Some(cb) = progress {
                    cb.on_page_error(page_num, total_pages, &detail);
                }
                acquired
                    .page_errors
                    .push(PageError::UnreadablePage { page: page_num, detail });
            }
        }
        acquired.text.push('\n');
        acquired.pages.push(PageSpan {
            page_num,
            range: start..acquired.text.len(),
        });
    }

    info!(
        "Read {} pages ({} unreadable), {} chars",
        acquired.pages.len(),
        acquired.page_errors.len(),
        acquired.text.chars().count()
    );
    Ok(acquired)
}

/// First page the selection asked for that the document does not have.
fn first_requested_page(selection: &PageSelection, total_pages: usize) -> usize {
    match selection {
        PageSelection::All => 1,
        PageSelection::Single(p) => *p,
        PageSelection::Range(start, _) => *start,
        PageSelection::Set(pages) => pages
            .iter()
            .copied()
            .find(|&p| p < 1 || p > total_pages)
            .unwrap_or(1),
    }
}

/// Validate that `path` exists, is readable and starts with `%PDF`.
pub fn validate_source(path: &Path) -> Result<(), Pdf2QuizError> {
    if !path.exists() {
        return Err(Pdf2QuizError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2QuizError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2QuizError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(Pdf2QuizError::SourceUnavailable {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
    }

    debug!("Validated PDF source: {}", path.display());
    Ok(())
}

/// Read the configured pages of the PDF at `path`.
pub async fn acquire_pdf_text(
    path: &Path,
    config: &ExtractionConfig,
) -> Result<AcquiredText, Pdf2QuizError> {
    validate_source(path)?;

    let path = path.to_path_buf();
    let password = config.password.clone();
    let selection = config.pages.clone();
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        acquire_blocking(&path, password.as_deref(), &selection, progress.as_ref())
    })
    .await
    .map_err(|e| Pdf2QuizError::Internal(format!("Text extraction task panicked: {}", e)))?
}

fn acquire_blocking(
    path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
    progress: Option<&ProgressCallback>,
) -> Result<AcquiredText, Pdf2QuizError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, path, password)?;
    let pages = PdfiumPages { document };
    info!("PDF loaded: {} pages", pages.page_count());
    collect_pages(&pages, selection, progress)
}

/// pdfium document adapter.
pub struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
}

impl PageTextSource for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, String> {
        let idx = PdfPageIndex::try_from(index).map_err(|e| e.to_string())?;
        let page = self.document.pages().get(idx).map_err(|e| format!("{:?}", e))?;
        let text = page.text().map_err(|e| format!("{:?}", e))?;
        Ok(text.all())
    }
}

/// Bind to pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the
/// system library.
fn bind_pdfium() -> Result<Pdfium, Pdf2QuizError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) if !lib.is_empty() => Pdfium::bind_to_library(PathBuf::from(lib)),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2QuizError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2QuizError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2QuizError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                Pdf2QuizError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            Pdf2QuizError::SourceUnavailable {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ExtractionProgressCallback;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MemoryPages(Vec<Result<&'static str, &'static str>>);

    impl PageTextSource for MemoryPages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, index: usize) -> Result<String, String> {
            self.0[index]
                .map(str::to_string)
                .map_err(str::to_string)
        }
    }

    #[derive(Default)]
    struct Counter {
        started: AtomicUsize,
        ok: AtomicUsize,
        failed: AtomicUsize,
    }

    impl ExtractionProgressCallback for Counter {
        fn on_extraction_start(&self, total_pages: usize) {
            self.started.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_extracted(&self, _page_num: usize, _total_pages: usize, _chars: usize) {
            self.ok.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn pages_are_joined_with_newlines_in_order() {
        let src = MemoryPages(vec![Ok("one"), Ok("two"), Ok("three")]);
        let acquired = collect_pages(&src, &PageSelection::All, None).unwrap();
        assert_eq!(acquired.text, "one\ntwo\nthree\n");
        assert_eq!(acquired.total_pages, 3);
        assert_eq!(acquired.pages[1].page_num, 2);
        assert_eq!(&acquired.text[acquired.pages[1].range.clone()], "two\n");
    }

    #[test]
    fn unreadable_page_contributes_empty_text() {
        let src = MemoryPages(vec![Ok("one"), Err("bad stream"), Ok("three")]);
        let acquired = collect_pages(&src, &PageSelection::All, None).unwrap();
        assert_eq!(acquired.text, "one\n\nthree\n");
        assert_eq!(
            acquired.page_errors,
            vec![PageError::UnreadablePage {
                page: 2,
                detail: "bad stream".into()
            }]
        );
    }

    #[test]
    fn selection_limits_pages() {
        let src = MemoryPages(vec![Ok("one"), Ok("two"), Ok("three"), Ok("four")]);
        let acquired = collect_pages(&src, &PageSelection::Range(2, 3), None).unwrap();
        assert_eq!(acquired.text, "two\nthree\n");
        assert_eq!(acquired.total_pages, 4);
    }

    #[test]
    fn empty_selection_is_out_of_range() {
        let src = MemoryPages(vec![Ok("one")]);
        let err = collect_pages(&src, &PageSelection::Single(5), None).unwrap_err();
        assert!(matches!(
            err,
            Pdf2QuizError::PageOutOfRange { page: 5, total: 1 }
        ));
        assert_eq!(
            err.to_string(),
            "Page 5 is out of range (document has 1 pages)"
        );
    }

    #[test]
    fn out_of_range_reports_requested_page() {
        let src = MemoryPages(vec![Ok("one"), Ok("two")]);
        let err = collect_pages(&src, &PageSelection::Range(7, 9), None).unwrap_err();
        assert!(matches!(err, Pdf2QuizError::PageOutOfRange { page: 7, total: 2 }));

        let err = collect_pages(&src, &PageSelection::Set(vec![4, 6]), None).unwrap_err();
        assert!(matches!(err, Pdf2QuizError::PageOutOfRange { page: 4, total: 2 }));

        let empty = MemoryPages(Vec::new());
        let err = collect_pages(&empty, &PageSelection::All, None).unwrap_err();
        assert!(matches!(err, Pdf2QuizError::PageOutOfRange { page: 1, total: 0 }));
    }

    #[test]
    fn progress_events_fire_per_page() {
        let counter = Arc::new(Counter::default());
        let cb: ProgressCallback = counter.clone();
        let src = MemoryPages(vec![Ok("one"), Err("broken"), Ok("three")]);
        collect_pages(&src, &PageSelection::All, Some(&cb)).unwrap();
        assert_eq!(counter.started.load(Ordering::SeqCst), 3);
        assert_eq!(counter.ok.load(Ordering::SeqCst), 2);
        assert_eq!(counter.failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = validate_source(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2QuizError::FileNotFound { .. }));
        assert!(err.is_source_unavailable());
    }

    #[test]
    fn non_pdf_is_rejected_by_magic_bytes() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 not a pdf").unwrap();
        let err = validate_source(f.path()).unwrap_err();
        assert!(matches!(err, Pdf2QuizError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        assert!(validate_source(f.path()).is_ok());
    }
}
