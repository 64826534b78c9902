use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String keys of the persisted quiz documents.
pub mod keys {
    /// JSON array of question records.
    pub const QUESTIONS: &str = "questions";
    /// JSON integer, countdown length in seconds.
    pub const QUIZ_TIMER: &str = "quizTimer";
    /// JSON integer, best percentage so far.
    pub const HIGHEST_SCORE: &str = "highestScore";
}

/// Repository contract for string-keyed documents.
///
/// Every write replaces the whole value stored under a key; there is no
/// partial update.
#[async_trait]
pub trait KeyValueRepository: Send + Sync {
    /// Fetch the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A missing key is
    /// `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the delete.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn key_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl KeyValueRepository for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Holds the document repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub documents: Arc<dyn KeyValueRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let documents: Arc<dyn KeyValueRepository> = Arc::new(InMemoryRepository::new());
        Self { documents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get(keys::QUIZ_TIMER).await.unwrap(), None);

        repo.set(keys::QUIZ_TIMER, "300").await.unwrap();
        repo.set(keys::QUIZ_TIMER, "120").await.unwrap();

        assert_eq!(
            repo.get(keys::QUIZ_TIMER).await.unwrap().as_deref(),
            Some("120")
        );
        assert_eq!(repo.key_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let repo = InMemoryRepository::new();
        repo.set(keys::HIGHEST_SCORE, "80").await.unwrap();
        repo.remove(keys::HIGHEST_SCORE).await.unwrap();
        repo.remove(keys::HIGHEST_SCORE).await.unwrap();
        assert_eq!(repo.get(keys::HIGHEST_SCORE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let repo = InMemoryRepository::new();
        let storage = Storage {
            documents: Arc::new(repo.clone()),
        };
        storage.documents.set(keys::QUESTIONS, "[]").await.unwrap();
        assert_eq!(repo.get(keys::QUESTIONS).await.unwrap().as_deref(), Some("[]"));
    }
}
