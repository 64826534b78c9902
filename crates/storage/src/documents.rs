//! JSON encoding of the persisted quiz documents.
//!
//! Values are stored as JSON text regardless of backend: the question bank as
//! an array of question records, scalars as bare JSON numbers.

use serde::Serialize;
use serde::de::DeserializeOwned;

use quiz_core::model::Question;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// # Errors
///
/// Returns `StorageError::Serialization` if a question cannot be encoded.
pub fn encode_questions(questions: &[Question]) -> Result<String, StorageError> {
    serde_json::to_string(questions).map_err(ser)
}

/// # Errors
///
/// Returns `StorageError::Serialization` if `raw` is not a JSON array of
/// question records.
pub fn decode_questions(raw: &str) -> Result<Vec<Question>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the value cannot be encoded.
pub fn encode_scalar<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

/// Decode a scalar, tolerating surrounding whitespace.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if `raw` does not parse as `T`
/// (including out-of-range numbers).
pub fn decode_scalar<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw.trim()).map_err(ser)
}
