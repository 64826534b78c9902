use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::answer::{Answer, ChoiceLabel};
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Data-integrity problems in a question or a question bank.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id}: prompt cannot be empty")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id}: at least one choice is required")]
    EmptyChoices { id: QuestionId },

    #[error("question {id}: choice labels cannot be blank")]
    BlankLabel { id: QuestionId },

    #[error("question {id}: answer cannot be empty")]
    EmptyAnswer { id: QuestionId },

    #[error("question {id}: answer label {label} is not one of the choices")]
    UnknownAnswerLabel { id: QuestionId, label: ChoiceLabel },

    #[error("question id {0} is used more than once")]
    DuplicateId(QuestionId),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// The `type` tag of a question. Only `"multiple"` is produced today; other
/// tags are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionKind {
    #[default]
    Multiple,
    Other(String),
}

impl From<String> for QuestionKind {
    fn from(value: String) -> Self {
        if value == "multiple" {
            Self::Multiple
        } else {
            Self::Other(value)
        }
    }
}

impl From<QuestionKind> for String {
    fn from(value: QuestionKind) -> Self {
        match value {
            QuestionKind::Multiple => "multiple".to_string(),
            QuestionKind::Other(tag) => tag,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question as stored in the question bank.
///
/// Field names follow the persisted layout (`type`, `question`), so a bank
/// written by older clients deserializes as-is. Choices keep their insertion
/// order, which is also their display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(rename = "question")]
    pub prompt: String,
    pub choices: IndexMap<ChoiceLabel, String>,
    pub answer: Answer,
}

impl Question {
    /// Check that the question is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` found. The answer must name only
    /// labels that exist in `choices`.
    pub fn validate(&self) -> Result<(), QuestionError> {
        let id = self.id;
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if self.choices.is_empty() {
            return Err(QuestionError::EmptyChoices { id });
        }
        if self.choices.keys().any(ChoiceLabel::is_blank) {
            return Err(QuestionError::BlankLabel { id });
        }
        self.validate_answer_key()
    }

    /// Check only that the answer key is usable for grading.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyAnswer` or `QuestionError::UnknownAnswerLabel`.
    pub fn validate_answer_key(&self) -> Result<(), QuestionError> {
        let id = self.id;
        if self.answer.is_empty() {
            return Err(QuestionError::EmptyAnswer { id });
        }
        if let Some(label) = self
            .answer
            .labels()
            .into_iter()
            .find(|label| !self.choices.contains_key(*label))
        {
            return Err(QuestionError::UnknownAnswerLabel {
                id,
                label: label.clone(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn has_choice(&self, label: &ChoiceLabel) -> bool {
        self.choices.contains_key(label)
    }

    /// Choice labels in display order.
    pub fn labels(&self) -> impl Iterator<Item = &ChoiceLabel> {
        self.choices.keys()
    }

    #[must_use]
    pub fn is_multi_answer(&self) -> bool {
        matches!(self.answer, Answer::Multiple(_))
    }
}

/// Validate a whole bank: each question plus id uniqueness.
///
/// # Errors
///
/// Returns the first `QuestionError` found, in bank order.
pub fn validate_bank(questions: &[Question]) -> Result<(), QuestionError> {
    let mut seen = HashSet::with_capacity(questions.len());
    for question in questions {
        question.validate()?;
        if !seen.insert(question.id) {
            return Err(QuestionError::DuplicateId(question.id));
        }
    }
    Ok(())
}

/// Next free id for a bank: one past the current maximum, or 1 when empty.
#[must_use]
pub fn next_question_id(questions: &[Question]) -> QuestionId {
    questions
        .iter()
        .map(|q| q.id)
        .max()
        .map_or_else(|| QuestionId::new(1), |max| max.next())
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A question that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub kind: QuestionKind,
    pub prompt: String,
    pub choices: IndexMap<ChoiceLabel, String>,
    pub answer: Option<Answer>,
}

impl QuestionDraft {
    /// Blank draft with the four conventional labels `A`..`D`.
    #[must_use]
    pub fn with_standard_labels() -> Self {
        let choices = ["A", "B", "C", "D"]
            .into_iter()
            .map(|label| (ChoiceLabel::new(label), String::new()))
            .collect();
        Self {
            choices,
            ..Self::default()
        }
    }

    /// Attach an id and validate.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the resulting question is inconsistent.
    pub fn assign_id(self, id: QuestionId) -> Result<Question, QuestionError> {
        let answer = self
            .answer
            .ok_or(QuestionError::EmptyAnswer { id })?;
        let question = Question {
            id,
            kind: self.kind,
            prompt: self.prompt.trim().to_string(),
            choices: self.choices,
            answer,
        };
        question.validate()?;
        Ok(question)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
