use quiz_core::time::format_countdown;
use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining_seconds: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    /// `"Question 2 of 4"`.
    #[must_use]
    pub fn position_label(&self) -> String {
        format!("Question {} of {}", self.position, self.total)
    }

    /// Countdown rendered as `m:ss`.
    #[must_use]
    pub fn countdown_label(&self) -> String {
        format_countdown(self.remaining_seconds)
    }
}
