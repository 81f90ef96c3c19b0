//! SurrealDB-backed EventLog and AgentMemoryStore implementation
//!
//! Uses `schema::EventRecord` and `schema::AgentMemoryRecord` for
//! persistence, converting to/from `storage_traits` types at the boundary.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageError;
use crate::handle::SurrealHandle;
use crate::schema::{AgentMemoryRecord, EventRecord, SequenceRecord};
use crate::storage_traits::{
    AgentId, AgentMemory, AgentMemoryStore, Event, EventId, EventLog, SourceId, StorageResult,
};

fn backend(e: surrealdb::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn source_strings(sources: &[SourceId]) -> Vec<String> {
    sources.iter().map(|s| s.0.clone()).collect()
}

/// SurrealDB-backed implementation of [`EventLog`] and [`AgentMemoryStore`].
#[derive(Clone)]
pub struct SurrealFeedStore {
    handle: Arc<SurrealHandle>,
}

impl SurrealFeedStore {
    pub fn new(handle: Arc<SurrealHandle>) -> Self {
        Self { handle }
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        let handle = SurrealHandle::setup_db().await?;
        Ok(Self::new(Arc::new(handle)))
    }

    /// Create from environment variables (see [`SurrealHandle::setup_from_env`]).
    pub async fn from_env() -> crate::Result<Self> {
        let handle = SurrealHandle::setup_from_env().await?;
        Ok(Self::new(Arc::new(handle)))
    }

    async fn next_event_id(&self) -> StorageResult<u64> {
        let mut res = self
            .handle
            .db()
            .query("UPSERT event_sequence:global SET value = (value OR 0) + 1 RETURN value")
            .await
            .map_err(backend)?;

        let rows: Vec<SequenceRecord> = res.take(0).map_err(backend)?;
        rows.into_iter()
            .next()
            .map(|r| r.value)
            .ok_or_else(|| StorageError::Backend("event sequence returned no value".to_string()))
    }

    async fn select_events(
        &self,
        sql: &'static str,
        binds: Vec<(&'static str, serde_json::Value)>,
    ) -> StorageResult<Vec<Event>> {
        let mut query = self.handle.db().query(sql);
        for bind in binds {
            query = query.bind(bind);
        }
        let mut res = query.await.map_err(backend)?;
        let rows: Vec<EventRecord> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().map(EventRecord::into_event).collect())
    }
}

#[async_trait]
impl EventLog for SurrealFeedStore {
    async fn append(
        &self,
        source_id: &SourceId,
        payload: serde_json::Value,
    ) -> StorageResult<Event> {
        if !payload.is_object() {
            return Err(StorageError::InvalidPayload {
                source_id: source_id.0.clone(),
            });
        }

        let event_id = self.next_event_id().await?;
        let row = EventRecord::new(event_id, source_id.0.clone(), payload);
        debug!(event_id, source_id = %source_id, "appending event");

        self.handle
            .db()
            .query("CREATE events CONTENT $row RETURN NONE")
            .bind(("row", row.clone()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        Ok(row.into_event())
    }

    async fn events_by_source(&self, source_id: &SourceId) -> StorageResult<Vec<Event>> {
        self.select_events(
            "SELECT event_id, source_id, payload, created_at FROM events \
             WHERE source_id = $sid ORDER BY event_id ASC",
            vec![("sid", serde_json::Value::from(source_id.0.clone()))],
        )
        .await
    }

    async fn recent_by_source(
        &self,
        source_id: &SourceId,
        limit: usize,
    ) -> StorageResult<Vec<Event>> {
        let mut events = self
            .select_events(
                "SELECT event_id, source_id, payload, created_at FROM events \
                 WHERE source_id = $sid ORDER BY event_id DESC LIMIT $limit",
                vec![
                    ("sid", serde_json::Value::from(source_id.0.clone())),
                    ("limit", serde_json::Value::from(limit as u64)),
                ],
            )
            .await?;
        events.reverse();
        Ok(events)
    }

    async fn events_above(
        &self,
        sources: &[SourceId],
        above: EventId,
    ) -> StorageResult<Vec<Event>> {
        self.select_events(
            "SELECT event_id, source_id, payload, created_at FROM events \
             WHERE event_id > $above AND source_id IN $sources ORDER BY event_id ASC",
            vec![
                ("above", serde_json::Value::from(above.0)),
                ("sources", serde_json::Value::from(source_strings(sources))),
            ],
        )
        .await
    }

    async fn events_by_id(
        &self,
        sources: &[SourceId],
        ids: &[EventId],
    ) -> StorageResult<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<u64> = ids.iter().map(|id| id.0).collect();
        self.select_events(
            "SELECT event_id, source_id, payload, created_at FROM events \
             WHERE event_id IN $ids AND source_id IN $sources",
            vec![
                ("ids", serde_json::Value::from(ids)),
                ("sources", serde_json::Value::from(source_strings(sources))),
            ],
        )
        .await
    }
}

#[async_trait]
impl AgentMemoryStore for SurrealFeedStore {
    async fn load_memory(&self, agent_id: &AgentId) -> StorageResult<AgentMemory> {
        let mut res = self
            .handle
            .db()
            .query("SELECT agent_id, memory, updated_at FROM agent_memory WHERE agent_id = $aid")
            .bind(("aid", agent_id.0.clone()))
            .await
            .map_err(backend)?;

        let rows: Vec<AgentMemoryRecord> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().next().map(|r| r.memory).unwrap_or_default())
    }

    async fn store_memory(&self, agent_id: &AgentId, memory: &AgentMemory) -> StorageResult<()> {
        let row = AgentMemoryRecord::new(agent_id.0.clone(), memory.clone());
        debug!(agent_id = %agent_id, keys = memory.len(), "storing agent memory");

        self.handle
            .db()
            .query("UPSERT type::thing('agent_memory', $aid) CONTENT $row RETURN NONE")
            .bind(("aid", agent_id.0.clone()))
            .bind(("row", row))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        Ok(())
    }
}
