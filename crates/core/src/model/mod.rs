mod answer;
mod ids;
mod question;
mod quiz_config;
mod score;

pub use ids::{ParseIdError, QuestionId};

pub use answer::{Answer, ChoiceLabel};
pub use question::{
    Question, QuestionDraft, QuestionError, QuestionKind, next_question_id, validate_bank,
};
pub use quiz_config::{DEFAULT_TIMER_SECONDS, MAX_PERCENTAGE, QuizConfig, QuizConfigError};
pub use score::{QuizOutcome, Score, ScoreTier};
