//! Shared error types for the services crate.

use thiserror::Error;

/// Errors emitted by quiz sessions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("question index {index} is out of range (session has {total} questions)")]
    QuestionOutOfRange { index: usize, total: usize },
}

/// Errors emitted while turning a source document into questions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to load PDF: {0}")]
    Load(String),
    #[error("failed to extract text from page {page}: {reason}")]
    Extract { page: u32, reason: String },
    #[error("no questions found in {path}")]
    NoQuestions { path: String },
}

/// Errors emitted by `SessionRegistry`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("session not found")]
    NotFound,
    #[error("session registry lock poisoned: {0}")]
    Poisoned(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}
