use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use super::service::QuizSession;
use crate::error::SessionError;

/// Session shared between the countdown task and the input loop.
///
/// The lock is only held for one transition and never across an `.await`.
pub type SharedSession = Arc<Mutex<QuizSession>>;

//
// ─── TICKERS ───────────────────────────────────────────────────────────────────
//

/// Source of one-second ticks.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick. Returns `false` once the source is exhausted.
    async fn tick(&mut self) -> bool;
}

/// Wall-clock ticker; first tick fires one period after creation.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    #[must_use]
    pub fn every_second() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticker fed by a `TickHandle`.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Sending side of a `ManualTicker`. Dropping every handle ends the ticker.
#[derive(Clone)]
pub struct TickHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl TickHandle {
    /// Emit one tick. Returns `false` if the ticker is gone.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

#[must_use]
pub fn manual_ticker() -> (TickHandle, ManualTicker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TickHandle { tx }, ManualTicker { rx })
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

/// Countdown snapshot published after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    pub remaining_seconds: u32,
    pub completed: bool,
}

impl CountdownState {
    fn of(session: &QuizSession) -> Self {
        Self {
            remaining_seconds: session.remaining_seconds(),
            completed: session.is_complete(),
        }
    }
}

/// Background task ticking a shared session until it completes.
///
/// Stops on completion (from expiry or from the user finishing), on
/// [`Countdown::cancel`], or when dropped.
pub struct Countdown {
    state: watch::Receiver<CountdownState>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Spawn the countdown on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if the session lock is poisoned.
    pub fn spawn<T>(session: SharedSession, mut ticker: T) -> Result<Self, SessionError>
    where
        T: Ticker + 'static,
    {
        let initial = {
            let guard = session.lock().map_err(|_| SessionError::Poisoned)?;
            CountdownState::of(&guard)
        };
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            if initial.completed {
                return;
            }
            while ticker.tick().await {
                match tick_once(&session) {
                    Ok(state) => {
                        tx.send_replace(state);
                        if state.completed {
                            debug!("countdown finished");
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "countdown stopped");
                        break;
                    }
                }
            }
        });

        Ok(Self { state: rx, task })
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        *self.state.borrow()
    }

    /// Wait until the session is completed.
    ///
    /// Returns `false` if the countdown stopped first (cancelled, ticker
    /// exhausted, poisoned lock).
    pub async fn completed(&mut self) -> bool {
        self.state.wait_for(|state| state.completed).await.is_ok()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn tick_once(session: &Mutex<QuizSession>) -> Result<CountdownState, SessionError> {
    let mut guard = session.lock().map_err(|_| SessionError::Poisoned)?;
    match guard.tick() {
        Ok(_) | Err(SessionError::Completed) => Ok(CountdownState::of(&guard)),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::service::{AdvancePolicy, CompletionReason, SessionStatus};
    use quiz_core::defaults::default_questions;
    use quiz_core::time::fixed_clock;

    fn shared(timer_seconds: u32) -> SharedSession {
        Arc::new(Mutex::new(
            QuizSession::new(
                default_questions(),
                timer_seconds,
                AdvancePolicy::free(),
                fixed_clock(),
            )
            .unwrap(),
        ))
    }

    #[tokio::test]
    async fn manual_ticks_expire_the_session() {
        let session = shared(3);
        let (handle, ticker) = manual_ticker();
        let mut countdown = Countdown::spawn(Arc::clone(&session), ticker).unwrap();
        assert_eq!(countdown.state().remaining_seconds, 3);

        for _ in 0..3 {
            assert!(handle.tick());
        }
        assert!(countdown.completed().await);
        assert_eq!(
            countdown.state(),
            CountdownState {
                remaining_seconds: 0,
                completed: true
            }
        );

        let guard = session.lock().unwrap();
        assert_eq!(guard.status(), SessionStatus::Completed);
        assert_eq!(guard.completion_reason(), Some(CompletionReason::TimeExpired));
    }

    #[tokio::test]
    async fn countdown_stops_when_user_finishes() {
        let session = shared(300);
        let (handle, ticker) = manual_ticker();
        let mut countdown = Countdown::spawn(Arc::clone(&session), ticker).unwrap();

        {
            let mut guard = session.lock().unwrap();
            while !guard.is_complete() {
                guard.advance().unwrap();
            }
        }
        assert!(handle.tick());
        assert!(countdown.completed().await);
        assert_eq!(countdown.state().remaining_seconds, 300);
        assert_eq!(
            session.lock().unwrap().completion_reason(),
            Some(CompletionReason::Finished)
        );
    }

    #[tokio::test]
    async fn cancelled_countdown_never_completes() {
        let session = shared(2);
        let (_handle, ticker) = manual_ticker();
        let mut countdown = Countdown::spawn(Arc::clone(&session), ticker).unwrap();

        countdown.cancel();
        assert!(!countdown.completed().await);
        assert!(countdown.is_finished());
        assert_eq!(session.lock().unwrap().remaining_seconds(), 2);
        assert!(!session.lock().unwrap().is_complete());
    }

    #[tokio::test]
    async fn exhausted_ticker_ends_the_task() {
        let session = shared(10);
        let (handle, ticker) = manual_ticker();
        let mut countdown = Countdown::spawn(Arc::clone(&session), ticker).unwrap();

        assert!(handle.tick());
        drop(handle);
        assert!(!countdown.completed().await);
        assert!(countdown.is_finished());
        assert_eq!(session.lock().unwrap().remaining_seconds(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticker_counts_real_seconds() {
        let session = shared(2);
        let mut countdown =
            Countdown::spawn(Arc::clone(&session), IntervalTicker::every_second()).unwrap();

        assert!(countdown.completed().await);
        assert!(session.lock().unwrap().is_complete());
    }
}
