use std::sync::{Arc, Mutex};

use quiz_core::model::{Answer, ScoreTier};
use quiz_core::time::fixed_now;
use services::{
    AdvancePolicy, AppServices, Clock, CompletionReason, Countdown, SessionError, SessionStep,
    manual_ticker,
};

#[tokio::test]
async fn guided_session_scores_and_records_high_score() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_quiz_loop_smoke?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        false,
    )
    .await
    .expect("services");
    let quiz_loop = services.quiz_loop();

    let mut session = quiz_loop
        .start_session(AdvancePolicy::guided())
        .await
        .expect("start session");
    assert_eq!(session.advance().unwrap_err(), SessionError::AnswerRequired);

    // Right on the first two, wrong on the rest.
    let mut index = 0;
    let score = loop {
        let answer = if index < 2 {
            session.current_question().answer.clone()
        } else {
            wrong_answer(&session)
        };
        session.record_answer(answer).expect("record");
        index += 1;
        if let SessionStep::Completed(score) = session.advance().expect("advance") {
            break score;
        }
    };
    assert_eq!(score.percentage, 50);
    assert_eq!(score.tier(), ScoreTier::KeepLearning);

    let outcome = quiz_loop.finish(&session).await.expect("finish");
    assert!(outcome.is_new_record);
    assert_eq!(services.store().load_highest_score().await, 50);

    let retake = quiz_loop
        .start_session(AdvancePolicy::guided())
        .await
        .expect("retake");
    assert_eq!(retake.current_index(), 0);
    assert!(retake.answers().is_empty());
}

#[tokio::test]
async fn preview_session_expires_through_countdown() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_quiz_loop_preview?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        false,
    )
    .await
    .expect("services");
    services
        .store()
        .save_timer_seconds(3)
        .await
        .expect("timer");
    let quiz_loop = services.quiz_loop();

    let session = quiz_loop
        .start_session(AdvancePolicy::free())
        .await
        .expect("start session");
    let shared = Arc::new(Mutex::new(session));
    let (ticks, ticker) = manual_ticker();
    let mut countdown = Countdown::spawn(Arc::clone(&shared), ticker).expect("countdown");

    {
        let mut guard = shared.lock().unwrap();
        let answer = guard.current_question().answer.clone();
        guard.record_answer(answer).unwrap();
        assert_eq!(guard.advance().unwrap(), SessionStep::Continue);
    }
    for _ in 0..3 {
        assert!(ticks.tick());
    }
    assert!(countdown.completed().await);

    let snapshot = shared.lock().unwrap().clone();
    assert_eq!(snapshot.completion_reason(), Some(CompletionReason::TimeExpired));
    assert_eq!(snapshot.current_index(), 1);
    assert_eq!(snapshot.score().percentage, 25);

    let outcome = quiz_loop.finish(&snapshot).await.expect("finish");
    assert_eq!(outcome.score.correct_count, 1);
    assert_eq!(outcome.score.total_count, 4);
    assert_eq!(services.store().load_highest_score().await, 25);
}

fn wrong_answer(session: &services::QuizSession) -> Answer {
    let question = session.current_question();
    let label = question
        .labels()
        .into_iter()
        .find(|label| !question.answer.contains(label))
        .expect("question has a wrong choice")
        .clone();
    Answer::single(label)
}
