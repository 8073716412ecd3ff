use serde::Serialize;

/// Minimum percentage for a passing verdict.
pub const PASS_THRESHOLD: f64 = 50.0;

/// Immediate feedback for a single `verify` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    /// Selection did not match; carries the marked answers for display.
    Incorrect { correct_options: Vec<String> },
    /// The source never marked an answer for this question.
    Unscored,
    /// The question was verified earlier in this run; nothing changed.
    AlreadyVerified,
}

impl Verdict {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Score for a completed run.
///
/// Unscored questions are left out of `valid_total` and reported as
/// `excluded`, so missing answer marks in the source never cost points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinalScore {
    pub correct: usize,
    pub valid_total: usize,
    pub excluded: usize,
    pub percentage: f64,
}

impl FinalScore {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(correct: usize, valid_total: usize, total: usize) -> Self {
        let percentage = if valid_total > 0 {
            100.0 * correct as f64 / valid_total as f64
        } else {
            0.0
        };
        Self {
            correct,
            valid_total,
            excluded: total.saturating_sub(valid_total),
            percentage,
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.percentage >= PASS_THRESHOLD
    }
}
