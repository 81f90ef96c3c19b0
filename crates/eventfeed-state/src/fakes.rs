//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryEventLog` and `MemoryAgentStore` that satisfy the trait
//! contracts without any external dependencies. Both can be told to fail a
//! named operation so callers can exercise their error paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::storage_traits::*;

fn lock<T>(mutex: &Mutex<T>) -> StorageResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| StorageError::Backend(format!("lock poisoned: {e}")))
}

/// Operation names that should fail on their next call.
#[derive(Debug, Default)]
struct FailurePlan {
    pending: Mutex<HashSet<String>>,
}

impl FailurePlan {
    fn arm(&self, operation: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(operation.to_string());
        }
    }

    fn check(&self, operation: &str) -> StorageResult<()> {
        if lock(&self.pending)?.remove(operation) {
            return Err(StorageError::Injected {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryEventLog
// ---------------------------------------------------------------------------

/// In-memory event log backed by a `Vec<Event>` kept in id order.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<Event>>,
    failures: FailurePlan,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event with an explicit id and timestamp.
    ///
    /// Ids must be strictly greater than any id already present.
    pub fn insert(
        &self,
        id: u64,
        source_id: &str,
        created_at: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> StorageResult<Event> {
        let mut events = lock(&self.events)?;
        if let Some(last) = events.last() {
            if last.id.0 >= id {
                return Err(StorageError::Backend(format!(
                    "event id {id} is not above current maximum {}",
                    last.id
                )));
            }
        }
        let event = Event {
            id: EventId(id),
            source_id: SourceId::new(source_id),
            created_at,
            payload,
        };
        events.push(event.clone());
        Ok(event)
    }

    /// Make the next call to `operation` (e.g. `"events_above"`) fail.
    pub fn fail_next(&self, operation: &str) {
        self.failures.arm(operation);
    }

    /// Number of events stored.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(
        &self,
        source_id: &SourceId,
        payload: serde_json::Value,
    ) -> StorageResult<Event> {
        self.failures.check("append")?;
        if !payload.is_object() {
            return Err(StorageError::InvalidPayload {
                source_id: source_id.0.clone(),
            });
        }
        let mut events = lock(&self.events)?;
        let next = events.last().map(|e| e.id.0 + 1).unwrap_or(1);
        let event = Event {
            id: EventId(next),
            source_id: source_id.clone(),
            created_at: Utc::now(),
            payload,
        };
        events.push(event.clone());
        Ok(event)
    }

    async fn events_by_source(&self, source_id: &SourceId) -> StorageResult<Vec<Event>> {
        self.failures.check("events_by_source")?;
        let events = lock(&self.events)?;
        Ok(events
            .iter()
            .filter(|e| &e.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn events_above(
        &self,
        sources: &[SourceId],
        above: EventId,
    ) -> StorageResult<Vec<Event>> {
        self.failures.check("events_above")?;
        let events = lock(&self.events)?;
        Ok(events
            .iter()
            .filter(|e| e.id > above && sources.contains(&e.source_id))
            .cloned()
            .collect())
    }

    async fn events_by_id(
        &self,
        sources: &[SourceId],
        ids: &[EventId],
    ) -> StorageResult<Vec<Event>> {
        self.failures.check("events_by_id")?;
        let wanted: HashSet<EventId> = ids.iter().copied().collect();
        let events = lock(&self.events)?;
        // Newest first, so callers cannot rely on log order.
        Ok(events
            .iter()
            .rev()
            .filter(|e| wanted.contains(&e.id) && sources.contains(&e.source_id))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryAgentStore
// ---------------------------------------------------------------------------

/// In-memory agent memory store backed by a `HashMap<agent_id, AgentMemory>`.
#[derive(Debug, Default)]
pub struct MemoryAgentStore {
    memories: Mutex<HashMap<String, AgentMemory>>,
    writes: Mutex<u64>,
    failures: FailurePlan,
}

impl MemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to `operation` (`"load_memory"` or `"store_memory"`) fail.
    pub fn fail_next(&self, operation: &str) {
        self.failures.arm(operation);
    }

    /// Number of successful `store_memory` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

#[async_trait]
impl AgentMemoryStore for MemoryAgentStore {
    async fn load_memory(&self, agent_id: &AgentId) -> StorageResult<AgentMemory> {
        self.failures.check("load_memory")?;
        let memories = lock(&self.memories)?;
        Ok(memories.get(&agent_id.0).cloned().unwrap_or_default())
    }

    async fn store_memory(&self, agent_id: &AgentId, memory: &AgentMemory) -> StorageResult<()> {
        self.failures.check("store_memory")?;
        lock(&self.memories)?.insert(agent_id.0.clone(), memory.clone());
        *lock(&self.writes)? += 1;
        Ok(())
    }
}
