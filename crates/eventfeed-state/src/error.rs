//! Error types for eventfeed-state

use thiserror::Error;

/// Errors that can occur while connecting to or preparing the backend
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Errors returned by `EventLog` and `AgentMemoryStore` operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend (database, lock) failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Payload or memory could not be (de)serialized
    #[error("storage serialization error: {0}")]
    Serialization(String),

    /// Event payloads must be JSON objects
    #[error("event payload for source {source_id} is not a JSON object")]
    InvalidPayload { source_id: String },

    /// Failure injected by a test fake
    #[error("injected failure: {operation}")]
    Injected { operation: String },
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}
