use serde::{Deserialize, Serialize};

/// Final result of a quiz session.
///
/// Plain numbers only, so the record can be handed between screens or
/// serialized without carrying any session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub percentage: u8,
    pub correct_count: u32,
    pub total_count: u32,
}

impl Score {
    /// Build a score from counts, rounding the percentage half-up.
    ///
    /// A `total_count` of zero yields 0%. `correct_count` is clamped to
    /// `total_count`.
    #[must_use]
    pub fn from_counts(correct_count: u32, total_count: u32) -> Self {
        let correct_count = correct_count.min(total_count);
        Self {
            percentage: percentage(correct_count, total_count),
            correct_count,
            total_count,
        }
    }

    #[must_use]
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_percentage(self.percentage)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    // round(100 * c / t) with halves rounded up, in integers
    let correct = u64::from(correct);
    let total = u64::from(total);
    ((200 * correct + total) / (2 * total)) as u8
}

/// Feedback bucket shown next to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTier {
    Excellent,
    Great,
    Good,
    KeepLearning,
    TryAgain,
}

impl ScoreTier {
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            90..=u8::MAX => Self::Excellent,
            75..=89 => Self::Great,
            60..=74 => Self::Good,
            50..=59 => Self::KeepLearning,
            _ => Self::TryAgain,
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent!",
            Self::Great => "Great Job!",
            Self::Good => "Good!",
            Self::KeepLearning => "Keep Learning!",
            Self::TryAgain => "Try Again!",
        }
    }
}

/// What a finished session reports after the high score has been updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub score: Score,
    pub previous_highest: u8,
    pub is_new_record: bool,
}

impl QuizOutcome {
    #[must_use]
    pub fn new(score: Score, previous_highest: u8) -> Self {
        Self {
            score,
            previous_highest,
            is_new_record: score.percentage > previous_highest,
        }
    }

    /// Highest score after this session was taken into account.
    #[must_use]
    pub fn highest_score(&self) -> u8 {
        self.previous_highest.max(self.score.percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(Score::from_counts(1, 8).percentage, 13); // 12.5
        assert_eq!(Score::from_counts(1, 3).percentage, 33);
        assert_eq!(Score::from_counts(2, 3).percentage, 67);
        assert_eq!(Score::from_counts(1, 4).percentage, 25);
        assert_eq!(Score::from_counts(4, 4).percentage, 100);
    }

    #[test]
    fn empty_total_is_zero_percent() {
        let score = Score::from_counts(0, 0);
        assert_eq!(score.percentage, 0);
        assert_eq!(score.total_count, 0);
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(ScoreTier::from_percentage(100), ScoreTier::Excellent);
        assert_eq!(ScoreTier::from_percentage(90), ScoreTier::Excellent);
        assert_eq!(ScoreTier::from_percentage(89), ScoreTier::Great);
        assert_eq!(ScoreTier::from_percentage(60), ScoreTier::Good);
        assert_eq!(ScoreTier::from_percentage(50), ScoreTier::KeepLearning);
        assert_eq!(ScoreTier::from_percentage(49), ScoreTier::TryAgain);
    }

    #[test]
    fn outcome_flags_new_record_only_when_strictly_greater() {
        let score = Score::from_counts(3, 4);
        assert!(QuizOutcome::new(score, 50).is_new_record);
        assert!(!QuizOutcome::new(score, 75).is_new_record);
        assert_eq!(QuizOutcome::new(score, 90).highest_score(), 90);
    }

    #[test]
    fn score_serializes_as_plain_numbers() {
        let json = serde_json::to_string(&Score::from_counts(1, 4)).unwrap();
        assert_eq!(json, r#"{"percentage":25,"correct_count":1,"total_count":4}"#);
    }
}
