#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod question_store;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuestionStoreError, QuizLoopError, SessionError};
pub use question_store::QuestionStore;

pub use sessions::{
    AdvancePolicy, CompletionReason, Countdown, CountdownState, IntervalTicker, ManualTicker,
    QuizLoopService, QuizSession, SessionBuilder, SessionProgress, SessionStatus, SessionStep,
    SharedSession, TickHandle, Ticker, manual_ticker,
};
