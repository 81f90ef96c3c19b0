//! Schema definitions for eventfeed SurrealDB tables
//!
//! Tables:
//! - events: Append-only upstream events
//! - event_sequence: Single-row id allocator for `events`
//! - agent_memory: Per-agent memory blobs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::{AgentMemory, Event, EventId, SourceId};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Event row - one upstream event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic event id (unique)
    pub event_id: u64,
    /// Producer that emitted the event
    pub source_id: String,
    /// Event payload (JSON object)
    pub payload: serde_json::Value,
    /// Creation timestamp
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Create a new event row stamped with the current time
    pub fn new(event_id: u64, source_id: String, payload: serde_json::Value) -> Self {
        EventRecord {
            event_id,
            source_id,
            payload,
            created_at: Utc::now(),
        }
    }

    /// Convert the row into the storage-level `Event`.
    pub fn into_event(self) -> Event {
        Event {
            id: EventId(self.event_id),
            source_id: SourceId(self.source_id),
            created_at: self.created_at,
            payload: self.payload,
        }
    }
}

/// Current value of the event id allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub value: u64,
}

/// Agent memory row - the whole memory blob of one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMemoryRecord {
    /// Agent id (unique)
    pub agent_id: String,
    /// Memory blob
    pub memory: AgentMemory,
    /// Last write timestamp
    #[serde(with = "surreal_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl AgentMemoryRecord {
    pub fn new(agent_id: String, memory: AgentMemory) -> Self {
        AgentMemoryRecord {
            agent_id,
            memory,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_record_into_event() {
        let row = EventRecord::new(7, "weather".to_string(), json!({"title": "Rain"}));
        let event = row.into_event();
        assert_eq!(event.id, EventId(7));
        assert_eq!(event.source_id.as_str(), "weather");
        assert_eq!(event.payload["title"], "Rain");
    }

    #[test]
    fn test_agent_memory_record_serialization() {
        let mut memory = AgentMemory::new();
        memory.insert("last_event_id".to_string(), json!(12));
        let row = AgentMemoryRecord::new("agent-1".to_string(), memory);

        let json = serde_json::to_string(&row).expect("Failed to serialize");
        assert!(json.contains("agent-1"));
        assert!(json.contains("last_event_id"));
    }
}
