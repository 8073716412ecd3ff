//! Turning a document on disk into the quiz's question list.

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use quiz_core::{Extractor, ExtractorConfig, Question};

use crate::error::SourceError;

/// Backend that yields the raw text of a document, one physical line per row.
pub trait TextSource: Send + Sync {
    /// Extract the full text content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` when the file cannot be read or decoded.
    fn extract_text(&self, path: &Path) -> Result<String, SourceError>;
}

/// Reads the text layer of a PDF with `lopdf`, page by page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn extract_text(&self, path: &Path) -> Result<String, SourceError> {
        let doc = Document::load(path).map_err(|e| SourceError::Load(e.to_string()))?;

        let pages = doc.get_pages();
        debug!(path = %path.display(), pages = pages.len(), "loaded PDF");

        let mut text = String::new();
        for page in pages.keys() {
            let content = doc.extract_text(&[*page]).map_err(|e| SourceError::Extract {
                page: *page,
                reason: e.to_string(),
            })?;
            text.push_str(&content);
            text.push('\n');
        }
        Ok(text)
    }
}

/// Reads a UTF-8 text file as-is. Useful for quizzes kept as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract_text(&self, path: &Path) -> Result<String, SourceError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Picks the PDF backend for `.pdf` files and plain text for anything else.
#[must_use]
pub fn source_for_path(path: &Path) -> Box<dyn TextSource> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Box::new(PdfTextSource)
    } else {
        Box::new(PlainTextSource)
    }
}

/// Extract text from `path` and parse it into questions.
///
/// # Errors
///
/// Propagates backend failures and returns `SourceError::NoQuestions` when the
/// text holds no recognisable question, since there is no quiz to run then.
pub fn load_questions(
    source: &dyn TextSource,
    path: &Path,
    config: ExtractorConfig,
) -> Result<Vec<Question>, SourceError> {
    let text = source.extract_text(path)?;
    let questions = Extractor::new(config).extract(&text);
    if questions.is_empty() {
        warn!(path = %path.display(), "no questions recognised");
        return Err(SourceError::NoQuestions {
            path: path.display().to_string(),
        });
    }
    Ok(questions)
}
