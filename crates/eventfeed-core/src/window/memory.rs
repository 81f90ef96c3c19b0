//! Window cache state kept in the agent memory blob.
//!
//! Keys: `event_ids`, `last_event_id`, `events_order`, `events_to_show`.
//! Other keys in the blob belong to someone else and are left untouched.

use eventfeed_state::{AgentMemory, EventId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::error::Result;
use crate::domain::order::EventsOrder;

pub const EVENT_IDS_KEY: &str = "event_ids";
pub const LAST_EVENT_ID_KEY: &str = "last_event_id";
pub const EVENTS_ORDER_KEY: &str = "events_order";
pub const EVENTS_TO_SHOW_KEY: &str = "events_to_show";

/// Cached window identity plus the configuration it was built under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowMemory {
    pub event_ids: Option<Vec<EventId>>,
    /// Watermark: highest id ever incorporated.
    pub last_event_id: Option<EventId>,
    pub events_order: Option<EventsOrder>,
    pub events_to_show: Option<usize>,
}

fn read_key<T: DeserializeOwned>(memory: &AgentMemory, key: &str) -> Option<T> {
    let value = memory.get(key)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed window memory key");
            None
        }
    }
}

fn write_key<T: Serialize>(memory: &mut AgentMemory, key: &str, value: &Option<T>) -> Result<()> {
    match value {
        Some(v) => {
            memory.insert(key.to_string(), serde_json::to_value(v)?);
        }
        None => {
            memory.remove(key);
        }
    }
    Ok(())
}

impl WindowMemory {
    /// Extract the window keys from an agent memory blob.
    pub fn from_memory(memory: &AgentMemory) -> Self {
        Self {
            event_ids: read_key(memory, EVENT_IDS_KEY),
            last_event_id: read_key(memory, LAST_EVENT_ID_KEY),
            events_order: read_key(memory, EVENTS_ORDER_KEY),
            events_to_show: read_key(memory, EVENTS_TO_SHOW_KEY),
        }
    }

    /// Write the window keys into `memory`, removing the ones that are unset.
    pub fn write_into(&self, memory: &mut AgentMemory) -> Result<()> {
        write_key(memory, EVENT_IDS_KEY, &self.event_ids)?;
        write_key(memory, LAST_EVENT_ID_KEY, &self.last_event_id)?;
        write_key(memory, EVENTS_ORDER_KEY, &self.events_order)?;
        write_key(memory, EVENTS_TO_SHOW_KEY, &self.events_to_show)?;
        Ok(())
    }

    /// The cached ids can be reused for `order` / `events_to_show`: they were
    /// built under the same ordering and for a window at least as large.
    pub fn is_usable_for(&self, order: &EventsOrder, events_to_show: usize) -> bool {
        self.event_ids.is_some()
            && self.events_order.as_ref() == Some(order)
            && self.events_to_show.is_some_and(|n| n >= events_to_show)
    }

    /// Why the cache can't be reused, for logging.
    pub fn invalidation_reason(&self, order: &EventsOrder, events_to_show: usize) -> &'static str {
        if self.event_ids.is_none() {
            "no_cached_window"
        } else if self.events_order.as_ref() != Some(order) {
            "order_changed"
        } else if self.events_to_show.map_or(true, |n| n < events_to_show) {
            "window_grew"
        } else {
            "none"
        }
    }
}

/// `Value` view of the memory, handy for diagnostics output.
pub fn describe(memory: &WindowMemory) -> Value {
    serde_json::json!({
        EVENT_IDS_KEY: memory.event_ids,
        LAST_EVENT_ID_KEY: memory.last_event_id,
        EVENTS_ORDER_KEY: memory.events_order,
        EVENTS_TO_SHOW_KEY: memory.events_to_show,
    })
}
