use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question recovered from source text.
///
/// `correct_indices` is kept sorted and always points inside `options`.
/// An empty `correct_indices` means the source never marked an answer; such a
/// question is "unscored" and no selection can match it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: String,
    text: String,
    options: Vec<String>,
    correct_indices: Vec<usize>,
}

impl Question {
    /// Creates a question with no options yet.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options: Vec::new(),
            correct_indices: Vec::new(),
        }
    }

    /// Builds a question from already-parsed parts.
    ///
    /// Indices outside `options` are dropped and the rest deduplicated, so the
    /// invariant holds regardless of input.
    #[must_use]
    pub fn from_parts(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        let correct: BTreeSet<usize> = correct_indices
            .into_iter()
            .filter(|idx| *idx < options.len())
            .collect();
        Self {
            id: id.into(),
            text: text.into(),
            options,
            correct_indices: correct.into_iter().collect(),
        }
    }

    /// Label as printed in the source (`"10"` for `10. ...`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_indices(&self) -> &[usize] {
        &self.correct_indices
    }

    /// True when the source marked at least one option as correct.
    #[must_use]
    pub fn is_scored(&self) -> bool {
        !self.correct_indices.is_empty()
    }

    /// Texts of the options marked correct, in option order.
    #[must_use]
    pub fn correct_options(&self) -> Vec<&str> {
        self.correct_indices
            .iter()
            .filter_map(|idx| self.options.get(*idx).map(String::as_str))
            .collect()
    }

    /// Exact set comparison between `selected` and the marked answers.
    ///
    /// Unscored questions never match. Duplicates in `selected` collapse, and
    /// out-of-range indices make the selection wrong rather than panicking.
    #[must_use]
    pub fn matches(&self, selected: &[usize]) -> bool {
        if !self.is_scored() {
            return false;
        }
        let selected: BTreeSet<usize> = selected.iter().copied().collect();
        selected.len() == self.correct_indices.len()
            && selected.iter().eq(self.correct_indices.iter())
    }

    pub(crate) fn append_text(&mut self, fragment: &str) {
        self.text.push(' ');
        self.text.push_str(fragment);
    }

    pub(crate) fn push_option(&mut self, text: String, correct: bool) {
        self.options.push(text);
        if correct {
            self.correct_indices.push(self.options.len() - 1);
        }
    }

    /// Appends to the last option. Returns `false` when there is none.
    pub(crate) fn append_to_last_option(&mut self, fragment: &str) -> bool {
        match self.options.last_mut() {
            Some(last) => {
                last.push(' ');
                last.push_str(fragment);
                true
            }
            None => false,
        }
    }
}
