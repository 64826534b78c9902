//! Built-in question bank used to seed empty storage.

use indexmap::IndexMap;

use crate::model::{Answer, ChoiceLabel, Question, QuestionId, QuestionKind};

fn choices(texts: [&str; 4]) -> IndexMap<ChoiceLabel, String> {
    ["A", "B", "C", "D"]
        .into_iter()
        .zip(texts)
        .map(|(label, text)| (ChoiceLabel::new(label), text.to_string()))
        .collect()
}

fn multiple(id: u64, prompt: &str, texts: [&str; 4], answer: &str) -> Question {
    Question {
        id: QuestionId::new(id),
        kind: QuestionKind::Multiple,
        prompt: prompt.to_string(),
        choices: choices(texts),
        answer: Answer::single(answer),
    }
}

/// The question bank shipped with the app.
#[must_use]
pub fn default_questions() -> Vec<Question> {
    vec![
        multiple(
            1,
            "Which keyword declares an immutable binding?",
            ["var", "let", "mut", "const fn"],
            "B",
        ),
        multiple(
            2,
            "What does the `?` operator do with an `Err` value?",
            [
                "Panics with the error",
                "Ignores it",
                "Returns it early from the function",
                "Converts it to `None`",
            ],
            "C",
        ),
        multiple(
            3,
            "Which type owns a growable, heap-allocated string?",
            ["&str", "char", "Box<str>", "String"],
            "D",
        ),
        multiple(
            4,
            "Which trait lets a value be duplicated with a bitwise copy?",
            ["Copy", "Clone", "Default", "Sized"],
            "A",
        ),
    ]
}
