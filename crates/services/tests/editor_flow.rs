use std::sync::Arc;

use quiz_core::model::{Answer, ChoiceLabel, QuestionDraft, QuestionId};
use services::{QuestionStore, QuestionStoreError};
use storage::repository::Storage;

fn draft(prompt: &str, answer: &str) -> QuestionDraft {
    let mut draft = QuestionDraft::with_standard_labels();
    draft.prompt = prompt.to_string();
    for (label, text) in &mut draft.choices {
        *text = format!("choice {label}");
    }
    draft.answer = Some(Answer::single(answer));
    draft
}

#[tokio::test]
async fn editor_flow_add_edit_delete() {
    let storage = Storage::sqlite("sqlite:file:memdb_editor_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let store = QuestionStore::new(Arc::clone(&storage.documents));
    store.initialize().await.expect("seed");

    let added = store
        .add_question(draft("Which keyword declares a constant?", "C"))
        .await
        .expect("add question");
    assert_eq!(added.id, QuestionId::new(5));

    let mut edited = added.clone();
    edited.prompt = "Which keyword declares a compile-time constant?".to_string();
    edited.answer = Answer::multiple(["C", "D"]);
    store.update_question(edited.clone()).await.expect("update");

    let bank = store.load_questions().await;
    assert_eq!(bank.len(), 5);
    assert_eq!(bank.last(), Some(&edited));
    assert!(bank.last().unwrap().is_multi_answer());

    store.delete_question(added.id).await.expect("delete");
    let bank = store.load_questions().await;
    assert_eq!(bank.len(), 4);
    assert!(bank.iter().all(|q| q.id != added.id));

    let err = store.delete_question(added.id).await.unwrap_err();
    assert!(matches!(err, QuestionStoreError::NotFound(id) if id == added.id));
}

#[tokio::test]
async fn editor_rejects_answer_outside_choices() {
    let storage = Storage::sqlite("sqlite:file:memdb_editor_reject?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let store = QuestionStore::new(Arc::clone(&storage.documents));
    store.initialize().await.expect("seed");

    let mut bad = draft("Broken?", "A");
    bad.answer = Some(Answer::single(ChoiceLabel::new("Z")));
    let err = store.add_question(bad).await.unwrap_err();
    assert!(matches!(err, QuestionStoreError::Question(_)));
    assert_eq!(store.load_questions().await.len(), 4);
}

#[tokio::test]
async fn timer_and_high_score_survive_reconnect() {
    let url = "sqlite:file:memdb_editor_settings?mode=memory&cache=shared";
    let first = Storage::sqlite(url).await.expect("connect sqlite");
    let store = QuestionStore::new(Arc::clone(&first.documents));
    store.initialize().await.expect("seed");
    store.save_timer_seconds(120).await.expect("timer");
    assert!(store.save_highest_score_if_greater(70).await.expect("score"));

    let second = Storage::sqlite(url).await.expect("reconnect sqlite");
    let reopened = QuestionStore::new(Arc::clone(&second.documents));
    reopened.initialize().await.expect("seed again");

    let config = reopened.load_config().await;
    assert_eq!(config.timer_seconds(), 120);
    assert_eq!(config.highest_score(), 70);
    drop(first);
}
