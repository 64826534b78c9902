use thiserror::Error;

/// Countdown used when no timer has been configured (5 minutes).
pub const DEFAULT_TIMER_SECONDS: u32 = 300;

/// Highest representable score percentage.
pub const MAX_PERCENTAGE: u8 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizConfigError {
    #[error("quiz timer must be > 0 seconds")]
    InvalidTimer,

    #[error("score percentage must be <= 100, got {0}")]
    InvalidPercentage(u8),
}

/// Persisted quiz configuration: the whole-session countdown and the best
/// percentage achieved so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    timer_seconds: u32,
    highest_score: u8,
}

impl QuizConfig {
    /// # Errors
    ///
    /// Returns `QuizConfigError` if the timer is zero or the score exceeds 100.
    pub fn new(timer_seconds: u32, highest_score: u8) -> Result<Self, QuizConfigError> {
        if timer_seconds == 0 {
            return Err(QuizConfigError::InvalidTimer);
        }
        if highest_score > MAX_PERCENTAGE {
            return Err(QuizConfigError::InvalidPercentage(highest_score));
        }
        Ok(Self {
            timer_seconds,
            highest_score,
        })
    }

    #[must_use]
    pub fn timer_seconds(&self) -> u32 {
        self.timer_seconds
    }

    #[must_use]
    pub fn highest_score(&self) -> u8 {
        self.highest_score
    }

    /// # Errors
    ///
    /// Returns `QuizConfigError::InvalidTimer` for a zero timer.
    pub fn set_timer_seconds(&mut self, timer_seconds: u32) -> Result<(), QuizConfigError> {
        if timer_seconds == 0 {
            return Err(QuizConfigError::InvalidTimer);
        }
        self.timer_seconds = timer_seconds;
        Ok(())
    }

    /// Raise the highest score if `percentage` beats it.
    ///
    /// Returns `true` when the stored value changed. Equal or lower values
    /// leave the config untouched.
    ///
    /// # Errors
    ///
    /// Returns `QuizConfigError::InvalidPercentage` for values above 100.
    pub fn record_score(&mut self, percentage: u8) -> Result<bool, QuizConfigError> {
        if percentage > MAX_PERCENTAGE {
            return Err(QuizConfigError::InvalidPercentage(percentage));
        }
        if percentage > self.highest_score {
            self.highest_score = percentage;
            return Ok(true);
        }
        Ok(false)
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            timer_seconds: DEFAULT_TIMER_SECONDS,
            highest_score: 0,
        }
    }
}
