//! Line-oriented recovery of multiple-choice questions from extracted PDF text.
//!
//! Input is whatever a PDF text layer yields: one physical line per row, with
//! numbering like `12. Prompt` for questions and `b) Option` for answers. A
//! reserved marker character placed on an option line flags that option as a
//! correct answer.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace};

use crate::model::Question;

/// Marker used when none is configured.
pub const DEFAULT_MARKER: char = '@';

// Digits, a period, then a non-digit. The character class right after the
// period stands in for a "not followed by a digit" lookahead, so `10.000 lei`
// is never read as question 10.
static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\D.*)$").expect("question pattern is valid"));

static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z])\)\s*(.+)$").expect("option pattern is valid"));

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("marker cannot be whitespace")]
    WhitespaceMarker,

    #[error("marker {0:?} collides with question or option numbering")]
    ReservedMarker(char),

    #[error("marker must be a single character, got {0:?}")]
    NotSingleChar(String),
}

/// Authoring conventions of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    marker: char,
}

impl ExtractorConfig {
    /// Validates `marker` against the characters the line patterns depend on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::WhitespaceMarker` for whitespace and
    /// `ConfigError::ReservedMarker` for letters, digits, `.` and `)`.
    pub fn new(marker: char) -> Result<Self, ConfigError> {
        if marker.is_whitespace() {
            return Err(ConfigError::WhitespaceMarker);
        }
        if marker.is_alphanumeric() || marker == '.' || marker == ')' {
            return Err(ConfigError::ReservedMarker(marker));
        }
        Ok(Self { marker })
    }

    #[must_use]
    pub fn marker(&self) -> char {
        self.marker
    }
}

impl FromStr for ExtractorConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(marker), None) => Self::new(marker),
            _ => Err(ConfigError::NotSingleChar(s.to_string())),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER,
        }
    }
}

//
// ─── LINE CLASSIFIER ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Question { id: &'a str, text: &'a str },
    Option { text: &'a str },
    Continuation(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if let Some(caps) = QUESTION_RE.captures(line) {
        if let (Some(id), Some(rest)) = (caps.get(1), caps.get(2)) {
            return Line::Question {
                id: id.as_str(),
                text: rest.as_str().trim_start(),
            };
        }
    }
    if let Some(text) = OPTION_RE.captures(line).and_then(|caps| caps.get(2)) {
        return Line::Option {
            text: text.as_str(),
        };
    }
    Line::Continuation(line)
}

//
// ─── EXTRACTOR ─────────────────────────────────────────────────────────────────
//

/// Single forward pass over the text; never fails, skips what it cannot place.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    #[must_use]
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Returns the questions found in `raw`, in source order.
    ///
    /// An empty result means no question marker was recognised.
    #[must_use]
    pub fn extract(&self, raw: &str) -> Vec<Question> {
        let marker = self.config.marker;
        let mut questions = Vec::new();
        let mut current: Option<Question> = None;

        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match classify(line) {
                Line::Question { id, text } => {
                    if let Some(done) = current.take() {
                        flush(&mut questions, done);
                    }
                    current = Some(Question::new(id, text.trim()));
                }
                Line::Option { text } => {
                    let Some(question) = current.as_mut() else {
                        continue;
                    };
                    question.push_option(strip_marker(text, marker), line.contains(marker));
                }
                Line::Continuation(text) => {
                    let Some(question) = current.as_mut() else {
                        continue;
                    };
                    let fragment = strip_marker(text, marker);
                    if fragment.is_empty() {
                        continue;
                    }
                    if !question.append_to_last_option(&fragment) {
                        question.append_text(&fragment);
                    }
                }
            }
        }

        if let Some(done) = current {
            flush(&mut questions, done);
        }

        debug!(
            total = questions.len(),
            unscored = questions.iter().filter(|q| !q.is_scored()).count(),
            "extracted questions"
        );
        questions
    }
}

/// Extracts with the default `@` marker.
#[must_use]
pub fn extract(raw: &str) -> Vec<Question> {
    Extractor::default().extract(raw)
}

fn strip_marker(text: &str, marker: char) -> String {
    text.replace(marker, "").trim().to_string()
}

fn flush(questions: &mut Vec<Question>, question: Question) {
    trace!(
        id = question.id(),
        options = question.options().len(),
        correct = ?question.correct_indices(),
        "question complete"
    );
    questions.push(question);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "1. What is 2+2?\na) 3\nb) 4@\nc) 5\n2. Capital of France?\na) Paris@\nb) Berlin\n";

    #[test]
    fn extracts_sample_quiz() {
        let questions = extract(SAMPLE);
        assert_eq!(questions.len(), 2);

        assert_eq!(questions[0].id(), "1");
        assert_eq!(questions[0].text(), "What is 2+2?");
        assert_eq!(questions[0].options(), &["3", "4", "5"]);
        assert_eq!(questions[0].correct_indices(), &[1]);

        assert_eq!(questions[1].id(), "2");
        assert_eq!(questions[1].options(), &["Paris", "Berlin"]);
        assert_eq!(questions[1].correct_indices(), &[0]);
    }

    #[test]
    fn numeric_value_is_not_a_question_marker() {
        let raw = "3. How much is the fee?\nPrice is 10.000 lei\na) yes@\n10.000 units\n10. What is X?\na) x";
        let questions = extract(raw);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text(), "How much is the fee? Price is 10.000 lei");
        assert_eq!(questions[0].options(), &["yes 10.000 units"]);
        assert_eq!(questions[1].id(), "10");
        assert_eq!(questions[1].text(), "What is X?");
    }

    #[test]
    fn line_starting_with_decimal_is_continuation() {
        assert_eq!(classify("10.000 lei"), Line::Continuation("10.000 lei"));
        assert_eq!(
            classify("10. What is X?"),
            Line::Question {
                id: "10",
                text: "What is X?"
            }
        );
    }

    #[test]
    fn question_marker_needs_text_after_period() {
        assert_eq!(classify("10."), Line::Continuation("10."));
        assert_eq!(
            classify("4.Compact"),
            Line::Question {
                id: "4",
                text: "Compact"
            }
        );
    }

    #[test]
    fn option_marker_needs_text_after_paren() {
        assert_eq!(classify("a)"), Line::Continuation("a)"));
        assert_eq!(classify("B)   spaced"), Line::Option { text: "spaced" });
        assert_eq!(classify("ab) two letters"), Line::Continuation("ab) two letters"));
    }

    #[test]
    fn marker_is_stripped_and_flags_option() {
        let questions = extract("1. Pick\na) wrong\nb) ri@ght\nc) @also right");
        let q = &questions[0];
        assert_eq!(q.options(), &["wrong", "right", "also right"]);
        assert_eq!(q.correct_indices(), &[1, 2]);
    }

    #[test]
    fn question_line_keeps_marker_verbatim() {
        let questions = extract("1. Q about x@y.com\na) one\nb) two");
        let q = &questions[0];
        assert_eq!(q.text(), "Q about x@y.com");
        assert_eq!(q.options(), &["one", "two"]);
        assert!(q.correct_indices().is_empty());
        assert!(!q.is_scored());
    }

    #[test]
    fn multi_line_prompt_is_space_joined() {
        let questions = extract("5. First half of the prompt\nsecond half?\na) one");
        assert_eq!(questions[0].text(), "First half of the prompt second half?");
    }

    #[test]
    fn continuation_extends_last_option_without_flagging_it() {
        let questions = extract("1. Q\na) long option\nwrapped @ here\nb) other");
        let q = &questions[0];
        assert_eq!(q.options()[0], "long option wrapped  here");
        assert!(q.correct_indices().is_empty());
    }

    #[test]
    fn lines_before_first_question_are_ignored() {
        let questions = extract("Header text\na) stray@\n\n1. Real\na) ok");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options(), &["ok"]);
        assert!(questions[0].correct_indices().is_empty());
    }

    #[test]
    fn question_without_options_is_kept() {
        let questions = extract("1. Lonely\n2. Next\na) x@");
        assert_eq!(questions.len(), 2);
        assert!(questions[0].options().is_empty());
        assert!(!questions[0].is_scored());
    }

    #[test]
    fn no_markers_yields_empty_result() {
        assert!(extract("just prose\nwithout numbering").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn custom_marker_replaces_default() {
        let extractor = Extractor::new(ExtractorConfig::new('`').unwrap());
        let questions = extractor.extract("1. Q\na) one`\nb) two@");
        assert_eq!(questions[0].correct_indices(), &[0]);
        assert_eq!(questions[0].options(), &["one", "two@"]);
    }

    #[test]
    fn crlf_and_indentation_are_tolerated() {
        let questions = extract("  1. Q\r\n    a) yes@\r\n\tb) no\r\n");
        assert_eq!(questions[0].options(), &["yes", "no"]);
        assert_eq!(questions[0].correct_indices(), &[0]);
    }

    #[test]
    fn correct_indices_stay_in_range_for_noisy_input() {
        let raw = "@@@\n1.@\na)@\nb) @\n2. x\n7.5\nz) q@\n@\n3.\n4. end";
        for q in extract(raw) {
            assert!(q.correct_indices().iter().all(|i| *i < q.options().len()));
        }
    }

    #[test]
    fn correct_indices_stay_in_range_for_generated_input() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        const FRAGMENTS: &[&str] = &[
            "1. Question",
            "12.Compact prompt@",
            "3.",
            "10.000 lei",
            "7.5",
            "a) plain",
            "b) flagged@",
            "C)@",
            "z) @ leading",
            "a)",
            "ab) not an option",
            "@",
            "@@@",
            "wrapped text @",
            "",
            "   ",
            "\t",
            "42",
        ];

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let count = rng.random_range(0..40);
            let raw = (0..count)
                .map(|_| FRAGMENTS[rng.random_range(0..FRAGMENTS.len())])
                .collect::<Vec<_>>()
                .join(if rng.random_bool(0.2) { "\r\n" } else { "\n" });
            for q in extract(&raw) {
                assert!(
                    q.correct_indices().iter().all(|i| *i < q.options().len()),
                    "out of range indices for {raw:?}"
                );
                assert!(q.correct_indices().windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn config_rejects_colliding_markers() {
        assert_eq!(ExtractorConfig::new(' '), Err(ConfigError::WhitespaceMarker));
        assert_eq!(ExtractorConfig::new('a'), Err(ConfigError::ReservedMarker('a')));
        assert_eq!(ExtractorConfig::new('7'), Err(ConfigError::ReservedMarker('7')));
        assert_eq!(ExtractorConfig::new(')'), Err(ConfigError::ReservedMarker(')')));
        assert_eq!(ExtractorConfig::new('*').unwrap().marker(), '*');
    }

    #[test]
    fn config_parses_from_single_char_string() {
        assert_eq!("`".parse::<ExtractorConfig>().unwrap().marker(), '`');
        assert!(matches!(
            "@@".parse::<ExtractorConfig>(),
            Err(ConfigError::NotSingleChar(_))
        ));
        assert!("".parse::<ExtractorConfig>().is_err());
    }
}
