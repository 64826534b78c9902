use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Short key identifying a choice within a question (e.g. `"A"`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceLabel(String);

impl ChoiceLabel {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ChoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChoiceLabel({:?})", self.0)
    }
}

impl fmt::Display for ChoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChoiceLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ChoiceLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A correct answer or a user's selection.
///
/// Persisted as a JSON string for a single label and as a JSON array for a
/// set of labels. Two answers are equal for grading purposes when they name
/// the same set of labels, see [`Answer::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(ChoiceLabel),
    Multiple(BTreeSet<ChoiceLabel>),
}

impl Answer {
    #[must_use]
    pub fn single(label: impl Into<ChoiceLabel>) -> Self {
        Self::Single(label.into())
    }

    #[must_use]
    pub fn multiple<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<ChoiceLabel>,
    {
        Self::Multiple(labels.into_iter().map(Into::into).collect())
    }

    /// Every label named by this answer.
    #[must_use]
    pub fn labels(&self) -> BTreeSet<&ChoiceLabel> {
        match self {
            Self::Single(label) => std::iter::once(label).collect(),
            Self::Multiple(labels) => labels.iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, label: &ChoiceLabel) -> bool {
        match self {
            Self::Single(own) => own == label,
            Self::Multiple(labels) => labels.contains(label),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(label) => label.is_blank(),
            Self::Multiple(labels) => labels.is_empty(),
        }
    }

    /// Set-equality of the labels on both sides.
    #[must_use]
    pub fn matches(&self, other: &Answer) -> bool {
        self.labels() == other.labels()
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(label) => write!(f, "{label}"),
            Self::Multiple(labels) => {
                let joined: Vec<&str> = labels.iter().map(ChoiceLabel::as_str).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}
