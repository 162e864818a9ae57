//! Pipeline stages for question extraction.
//!
//! Each submodule implements exactly one transformation step. Data flows
//! strictly forward; no stage looks back at an earlier one.
//!
//! ## Data Flow
//!
//! ```text
//! acquire ──▶ segment ──▶ parse ──▶ renumber
//!  (pdfium)    (markers)   (rules)   (ids 1..N)
//! ```
//!
//! 1. [`acquire`] — read selected pages into one text blob; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`segment`] — split the blob at `Question N` markers
//! 3. [`parse`]   — extract answer, options and stem from each span, apply
//!    the acceptance rules, then assign dense ids

pub mod acquire;
pub mod parse;
pub mod segment;
