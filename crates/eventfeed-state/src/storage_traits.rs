//! Storage trait definitions for eventfeed
//!
//! These traits define the collaborator contracts the feed agent consumes:
//! - `EventLog`: Append-only event log, queryable by source and id range
//! - `AgentMemoryStore`: Per-agent key-value memory blob (load/store)
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable numeric event identifier, monotonically increasing on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an upstream event producer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        SourceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one feed agent instance (scopes its memory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Generate a new random AgentId
    pub fn new() -> Self {
        AgentId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EventLog: Append-only Event Log
// ---------------------------------------------------------------------------

/// A single upstream event. Read-only from the feed agent's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic identifier assigned by the log
    pub id: EventId,
    /// Producer that emitted the event
    pub source_id: SourceId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Unstructured payload (JSON object)
    pub payload: serde_json::Value,
}

/// Append-only event log.
///
/// Guarantees:
/// - Ids are assigned in strictly increasing order by `append`.
/// - Ordered queries return events ascending by id.
/// - Events are never mutated or deleted through this interface.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append a new event for `source_id`, returning it with its assigned id.
    async fn append(
        &self,
        source_id: &SourceId,
        payload: serde_json::Value,
    ) -> StorageResult<Event>;

    /// All events emitted by a source, ascending by id.
    async fn events_by_source(&self, source_id: &SourceId) -> StorageResult<Vec<Event>>;

    /// The most recent `limit` events of a source, ascending by id.
    async fn recent_by_source(
        &self,
        source_id: &SourceId,
        limit: usize,
    ) -> StorageResult<Vec<Event>> {
        let mut events = self.events_by_source(source_id).await?;
        if events.len() > limit {
            events.drain(..events.len() - limit);
        }
        Ok(events)
    }

    /// Events with id strictly greater than `above` across `sources`,
    /// ascending by id.
    async fn events_above(
        &self,
        sources: &[SourceId],
        above: EventId,
    ) -> StorageResult<Vec<Event>>;

    /// Events whose ids are in `ids`, restricted to `sources`. Order unspecified.
    async fn events_by_id(
        &self,
        sources: &[SourceId],
        ids: &[EventId],
    ) -> StorageResult<Vec<Event>>;
}

// ---------------------------------------------------------------------------
// AgentMemoryStore: Per-agent Memory Blob
// ---------------------------------------------------------------------------

/// Persisted per-agent memory: a small string-keyed JSON mapping.
pub type AgentMemory = serde_json::Map<String, serde_json::Value>;

/// Per-agent memory store.
///
/// Semantics:
/// - `load_memory` returns an empty map for agents that never stored anything.
/// - `store_memory` replaces the whole blob for the agent in one write.
#[async_trait]
pub trait AgentMemoryStore: Send + Sync {
    /// Load the memory blob for an agent.
    async fn load_memory(&self, agent_id: &AgentId) -> StorageResult<AgentMemory>;

    /// Replace the memory blob for an agent.
    async fn store_memory(&self, agent_id: &AgentId, memory: &AgentMemory) -> StorageResult<()>;
}
