mod countdown;
mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::{
    Countdown, CountdownState, IntervalTicker, ManualTicker, SharedSession, TickHandle, Ticker,
    manual_ticker,
};
pub use plan::SessionBuilder;
pub use progress::SessionProgress;
pub use service::{AdvancePolicy, CompletionReason, QuizSession, SessionStatus, SessionStep};
pub use workflow::QuizLoopService;
