//! eventfeed-state: Event log and agent memory persistence
//!
//! This crate provides the storage layer the feed agent runs on: the
//! append-only event log it reads from and the per-agent memory blob it
//! keeps its window cache in.
//!
//! ## Key Components
//!
//! - `EventLog` / `AgentMemoryStore`: Backend-agnostic storage traits
//! - `SurrealFeedStore`: SurrealDB implementation of both traits
//! - `fakes`: In-memory implementations for tests

mod error;
pub mod fakes;
mod handle;
mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use handle::{CloudConfig, SurrealHandle};
pub use schema::{AgentMemoryRecord, EventRecord};
pub use storage_traits::{
    AgentId, AgentMemory, AgentMemoryStore, Event, EventId, EventLog, SourceId, StorageResult,
};
pub use surreal_store::SurrealFeedStore;

/// Result type for eventfeed-state setup operations
pub type Result<T> = std::result::Result<T, StateError>;
