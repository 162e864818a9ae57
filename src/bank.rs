//! Read-only question bank consumed by the serving layer.
//!
//! Wraps the extracted record set and answers the two queries the quiz API
//! needs: list (optionally a random sample) and fetch by id.

use crate::error::Pdf2QuizError;
use crate::output::{questions_from_json, QuestionRecord};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;
use tracing::{debug, info};

/// An immutable, in-memory list of questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
}

impl QuestionBank {
    pub fn from_records(questions: Vec<QuestionRecord>) -> Self {
        Self { questions }
    }

    /// Load a JSON array written by [`crate::write_questions`].
    ///
    /// A missing file is an empty bank, so a server can start before the
    /// first extraction has run.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Pdf2QuizError> {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No question bank at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Pdf2QuizError::Internal(format!(
                    "Failed to read question bank '{}': {}",
                    path.display(),
                    e
                )))
            }
        };
        let questions = questions_from_json(&json, path)?;
        info!("Loaded {} questions from {}", questions.len(), path.display());
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn into_records(self) -> Vec<QuestionRecord> {
        self.questions
    }

    /// All questions, or a random sample of `limit` of them.
    pub fn list(&self, limit: Option<usize>) -> Vec<&QuestionRecord> {
        self.list_with_rng(limit, &mut rand::thread_rng())
    }

    /// Like [`list`](Self::list) with a caller-supplied RNG.
    ///
    /// A `limit` of 0, or one at least the bank size, returns every record
    /// in stored order. Otherwise the sample is uniform and without
    /// replacement.
    pub fn list_with_rng<R: Rng + ?Sized>(
        &self,
        limit: Option<usize>,
        rng: &mut R,
    ) -> Vec<&QuestionRecord> {
        match limit {
            Some(n) if n > 0 && n < self.questions.len() => {
                self.questions.choose_multiple(rng, n).collect()
            }
            _ => self.questions.iter().collect(),
        }
    }

    /// The record with the given id.
    pub fn get(&self, id: u32) -> Result<&QuestionRecord, Pdf2QuizError> {
        self.questions
            .iter()
            .find(|q| q.id == id)
            .ok_or(Pdf2QuizError::QuestionNotFound { id })
    }
}
