use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use quiz_core::{Clock, Question, SessionId};

use super::progress::SessionProgress;
use super::score::{FinalScore, Verdict};
use crate::error::SessionError;

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Option indices a user has ticked for one question.
///
/// Kept by the presentation layer between renders; the session only looks at
/// it when the question is verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<usize>);

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `index` and returns whether it is now selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.0.remove(&index) {
            false
        } else {
            self.0.insert(index);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected indices in ascending order.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<usize> for Selection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's pass over a shuffled question list.
///
/// Each question goes `Unverified -> Verified` at most once per run. All
/// per-question state is keyed by position in the current order, which only
/// changes on `restart`.
pub struct QuizSession {
    session_id: SessionId,
    questions: Vec<Question>,
    verified: BTreeSet<usize>,
    correct: BTreeSet<usize>,
    rng: StdRng,
    clock: Clock,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session with an OS-seeded shuffle and the system clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>) -> Result<Self, SessionError> {
        Self::with_rng(questions, StdRng::from_os_rng(), Clock::default())
    }

    /// Start a session whose shuffles are reproducible from `seed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn seeded(questions: Vec<Question>, seed: u64, clock: Clock) -> Result<Self, SessionError> {
        Self::with_rng(questions, StdRng::seed_from_u64(seed), clock)
    }

    /// Start a session with an explicit random source and clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn with_rng(
        mut questions: Vec<Question>,
        mut rng: StdRng,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        questions.shuffle(&mut rng);

        Ok(Self {
            session_id: SessionId::default(),
            questions,
            verified: BTreeSet::new(),
            correct: BTreeSet::new(),
            rng,
            clock,
            started_at: clock.now(),
            completed_at: None,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Questions in their current (shuffled) order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_verified(&self, index: usize) -> bool {
        self.verified.contains(&index)
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        self.correct.contains(&index)
    }

    /// Key for presentation-side widget state of one option checkbox.
    ///
    /// Includes the run id so keys from a previous run never match.
    #[must_use]
    pub fn widget_key(&self, question_index: usize, option_index: usize) -> String {
        format!("chk_{}_{question_index}_{option_index}", self.session_id)
    }

    /// Record the user's answer for a question.
    ///
    /// Only the first call per question and run counts; later calls return
    /// `Verdict::AlreadyVerified` and leave the score untouched. Option indices
    /// outside the question simply make the selection wrong.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionOutOfRange` if `question_index` does not
    /// name a question in this session.
    pub fn verify(
        &mut self,
        question_index: usize,
        selected: &[usize],
    ) -> Result<Verdict, SessionError> {
        let total = self.questions.len();
        let Some(question) = self.questions.get(question_index) else {
            return Err(SessionError::QuestionOutOfRange {
                index: question_index,
                total,
            });
        };

        if self.verified.contains(&question_index) {
            return Ok(Verdict::AlreadyVerified);
        }

        let verdict = if !question.is_scored() {
            Verdict::Unscored
        } else if question.matches(selected) {
            Verdict::Correct
        } else {
            Verdict::Incorrect {
                correct_options: question
                    .correct_options()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }
        };

        self.verified.insert(question_index);
        if verdict.is_correct() {
            self.correct.insert(question_index);
        }
        if self.is_complete() && self.completed_at.is_none() {
            self.completed_at = Some(self.clock.now());
        }

        debug!(
            session = %self.session_id,
            question = question_index,
            ?verdict,
            "question verified"
        );
        Ok(verdict)
    }

    /// Begin a new run: bump the run id, forget all verdicts, reshuffle.
    pub fn restart(&mut self) {
        self.session_id = self.session_id.next();
        self.verified.clear();
        self.correct.clear();
        self.questions.shuffle(&mut self.rng);
        self.started_at = self.clock.now();
        self.completed_at = None;
        debug!(session = %self.session_id, "session restarted");
    }

    /// Returns a summary of the current run's progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let verified = self.verified.len();
        SessionProgress {
            total,
            verified,
            correct: self.correct.len(),
            remaining: total.saturating_sub(verified),
            is_complete: self.is_complete(),
        }
    }

    /// Share of verified questions answered correctly, `None` before the first
    /// verification.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn live_accuracy(&self) -> Option<f64> {
        if self.verified.is_empty() {
            return None;
        }
        Some(self.correct.len() as f64 / self.verified.len() as f64)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty() && self.verified.len() == self.questions.len()
    }

    /// Final score, available once every question has been verified.
    #[must_use]
    pub fn final_score(&self) -> Option<FinalScore> {
        if !self.is_complete() {
            return None;
        }
        let valid_total = self.questions.iter().filter(|q| q.is_scored()).count();
        Some(FinalScore::compute(
            self.correct.len(),
            valid_total,
            self.questions.len(),
        ))
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("session_id", &self.session_id)
            .field("questions_len", &self.questions.len())
            .field("verified", &self.verified)
            .field("correct", &self.correct)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
