use std::sync::Arc;

use quiz_core::defaults::default_questions;
use quiz_core::model::{
    DEFAULT_TIMER_SECONDS, MAX_PERCENTAGE, Question, QuestionDraft, QuestionId, QuizConfig,
    next_question_id, validate_bank,
};
use storage::documents::{decode_questions, decode_scalar, encode_questions, encode_scalar};
use storage::repository::{InMemoryRepository, KeyValueRepository, keys};
use tracing::{debug, info, warn};

use crate::error::QuestionStoreError;

/// Durable holder of the question bank and quiz configuration.
///
/// Reads never fail: a missing or unreadable document is replaced by the
/// built-in default (logged at `warn`). Writes replace the whole document and
/// surface every failure to the caller.
#[derive(Clone)]
pub struct QuestionStore {
    repo: Arc<dyn KeyValueRepository>,
    defaults: Arc<[Question]>,
}

impl QuestionStore {
    #[must_use]
    pub fn new(repo: Arc<dyn KeyValueRepository>) -> Self {
        Self {
            repo,
            defaults: default_questions().into(),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Seed the default bank and timer where nothing is stored yet.
    ///
    /// Safe to call on every start; existing values (even unreadable ones)
    /// are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `QuestionStoreError::Storage` if presence cannot be checked or
    /// a seed write fails.
    pub async fn initialize(&self) -> Result<(), QuestionStoreError> {
        if self.repo.get(keys::QUESTIONS).await?.is_none() {
            info!(count = self.defaults.len(), "seeding default question bank");
            self.repo
                .set(keys::QUESTIONS, &encode_questions(&self.defaults)?)
                .await?;
        }
        if self.repo.get(keys::QUIZ_TIMER).await?.is_none() {
            info!(seconds = DEFAULT_TIMER_SECONDS, "seeding default quiz timer");
            self.repo
                .set(keys::QUIZ_TIMER, &encode_scalar(&DEFAULT_TIMER_SECONDS)?)
                .await?;
        }
        Ok(())
    }

    /// Load the question bank, or the defaults if none is readable.
    ///
    /// Questions that fail validation are returned as stored (so they can be
    /// edited) and logged.
    pub async fn load_questions(&self) -> Vec<Question> {
        let raw = match self.repo.get(keys::QUESTIONS).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.defaults.to_vec(),
            Err(err) => {
                warn!(error = %err, "failed to read question bank, using defaults");
                return self.defaults.to_vec();
            }
        };

        match decode_questions(&raw) {
            Ok(questions) => {
                for question in &questions {
                    if let Err(err) = question.validate() {
                        warn!(error = %err, "stored question fails validation");
                    }
                }
                questions
            }
            Err(err) => {
                warn!(error = %err, "stored question bank is corrupt, using defaults");
                self.defaults.to_vec()
            }
        }
    }

    /// Replace the entire persisted bank.
    ///
    /// # Errors
    ///
    /// Returns `QuestionStoreError::Question` if the bank is inconsistent
    /// (nothing is written), or `QuestionStoreError::Storage` if the write fails.
    pub async fn save_questions(&self, questions: &[Question]) -> Result<(), QuestionStoreError> {
        validate_bank(questions)?;
        self.repo
            .set(keys::QUESTIONS, &encode_questions(questions)?)
            .await?;
        debug!(count = questions.len(), "saved question bank");
        Ok(())
    }

    /// Look up one question by id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionStoreError::NotFound` if no question has that id, or
    /// `QuestionStoreError::Storage` if the stored bank cannot be read.
    pub async fn question(&self, id: QuestionId) -> Result<Question, QuestionStoreError> {
        self.load_questions_for_edit()
            .await?
            .into_iter()
            .find(|q| q.id == id)
            .ok_or(QuestionStoreError::NotFound(id))
    }

    /// Append a new question with the next free id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionStoreError` if the draft is invalid or the write fails.
    pub async fn add_question(&self, draft: QuestionDraft) -> Result<Question, QuestionStoreError> {
        let mut questions = self.load_questions_for_edit().await?;
        let question = draft.assign_id(next_question_id(&questions))?;
        questions.push(question.clone());
        self.save_questions(&questions).await?;
        Ok(question)
    }

    /// Replace the question that has the same id, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns `QuestionStoreError::NotFound` if no question has that id.
    pub async fn update_question(&self, question: Question) -> Result<(), QuestionStoreError> {
        let mut questions = self.load_questions_for_edit().await?;
        let slot = questions
            .iter_mut()
            .find(|q| q.id == question.id)
            .ok_or(QuestionStoreError::NotFound(question.id))?;
        *slot = question;
        self.save_questions(&questions).await
    }

    /// # Errors
    ///
    /// Returns `QuestionStoreError::NotFound` if no question has that id.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), QuestionStoreError> {
        let mut questions = self.load_questions_for_edit().await?;
        let before = questions.len();
        questions.retain(|q| q.id != id);
        if questions.len() == before {
            return Err(QuestionStoreError::NotFound(id));
        }
        self.save_questions(&questions).await
    }

    /// Stored countdown, or 300 if unset or unreadable.
    pub async fn load_timer_seconds(&self) -> u32 {
        let seconds = self
            .load_scalar::<u32>(keys::QUIZ_TIMER)
            .await
            .unwrap_or(DEFAULT_TIMER_SECONDS);
        if seconds == 0 {
            warn!("stored quiz timer is zero, using default");
            return DEFAULT_TIMER_SECONDS;
        }
        seconds
    }

    /// # Errors
    ///
    /// Returns `QuestionStoreError::Config` for a zero timer, or
    /// `QuestionStoreError::Storage` if the write fails.
    pub async fn save_timer_seconds(&self, seconds: u32) -> Result<(), QuestionStoreError> {
        let mut config = self.load_config().await;
        config.set_timer_seconds(seconds)?;
        self.repo
            .set(keys::QUIZ_TIMER, &encode_scalar(&config.timer_seconds())?)
            .await?;
        info!(seconds, "quiz timer updated");
        Ok(())
    }

    /// Stored best percentage, or 0 if unset, unreadable or above 100.
    pub async fn load_highest_score(&self) -> u8 {
        match self.load_scalar::<u8>(keys::HIGHEST_SCORE).await {
            Some(score) if score <= MAX_PERCENTAGE => score,
            Some(score) => {
                warn!(score, "stored highest score is out of range, using 0");
                0
            }
            None => 0,
        }
    }

    /// Persist `percentage` only if it beats the stored highest score.
    ///
    /// Returns `true` when a write happened.
    ///
    /// # Errors
    ///
    /// Returns `QuestionStoreError::Config` for values above 100, or
    /// `QuestionStoreError::Storage` if the write fails.
    pub async fn save_highest_score_if_greater(
        &self,
        percentage: u8,
    ) -> Result<bool, QuestionStoreError> {
        let mut config = self.load_config().await;
        if !config.record_score(percentage)? {
            return Ok(false);
        }
        self.repo
            .set(keys::HIGHEST_SCORE, &encode_scalar(&config.highest_score())?)
            .await?;
        info!(percentage, "new highest score");
        Ok(true)
    }

    /// Timer and highest score as one record.
    pub async fn load_config(&self) -> QuizConfig {
        let timer = self.load_timer_seconds().await;
        let highest = self.load_highest_score().await;
        QuizConfig::new(timer, highest).unwrap_or_else(|err| {
            warn!(error = %err, "stored quiz config is invalid, using defaults");
            QuizConfig::default()
        })
    }

    /// Bank for read-modify-write edits.
    ///
    /// Unlike `load_questions` this never substitutes defaults for an
    /// unreadable document, so an edit cannot overwrite it.
    async fn load_questions_for_edit(&self) -> Result<Vec<Question>, QuestionStoreError> {
        match self.repo.get(keys::QUESTIONS).await? {
            Some(raw) => Ok(decode_questions(&raw)?),
            None => Ok(self.defaults.to_vec()),
        }
    }

    async fn load_scalar<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.repo.get(key).await {
            Ok(Some(raw)) => decode_scalar(&raw)
                .inspect_err(|err| warn!(key, error = %err, "stored value is corrupt"))
                .ok(),
            Ok(None) => None,
            Err(err) => {
                warn!(key, error = %err, "failed to read stored value");
                None
            }
        }
    }
}
