//! Bounded event window maintenance.
//!
//! Keeps the `events_to_show` highest-ranked events of the agent's sources,
//! extending the cached window incrementally from a watermark and rebuilding
//! it from scratch when the ordering or a larger size invalidates the cache.

use std::sync::Arc;

use eventfeed_state::{AgentId, AgentMemoryStore, Event, EventId, EventLog};
use tracing::{debug, instrument};

use super::memory::WindowMemory;
use super::WindowMode;
use crate::domain::config::WindowConfig;
use crate::domain::error::Result;
use crate::domain::order::sort_events;
use crate::metrics::METRICS;
use crate::obs::{emit_window_computed, emit_window_invalidated};

/// Result of one window computation.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    /// Ordered window contents.
    pub events: Vec<Event>,
    /// How the candidates were gathered.
    pub mode: WindowMode,
    /// Watermark after the computation.
    pub last_event_id: Option<EventId>,
}

/// Maintains the event window of one agent.
#[derive(Clone)]
pub struct EventWindow {
    agent_id: AgentId,
    log: Arc<dyn EventLog>,
    memory: Arc<dyn AgentMemoryStore>,
}

impl EventWindow {
    pub fn new(
        agent_id: AgentId,
        log: Arc<dyn EventLog>,
        memory: Arc<dyn AgentMemoryStore>,
    ) -> Self {
        Self {
            agent_id,
            log,
            memory,
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Compute the window and return its events in order.
    pub async fn compute(&self, config: &WindowConfig, force_reload: bool) -> Result<Vec<Event>> {
        Ok(self.compute_snapshot(config, force_reload).await?.events)
    }

    /// Current persisted window state.
    pub async fn memory(&self) -> Result<WindowMemory> {
        let blob = self.memory.load_memory(&self.agent_id).await?;
        Ok(WindowMemory::from_memory(&blob))
    }

    /// Compute the window, reporting how it was built.
    ///
    /// Memory is written only after every fetch succeeded, so a failed
    /// fetch never advances the watermark.
    #[instrument(skip(self, config), fields(agent_id = %self.agent_id, events_to_show = config.events_to_show))]
    pub async fn compute_snapshot(
        &self,
        config: &WindowConfig,
        force_reload: bool,
    ) -> Result<WindowSnapshot> {
        let mut blob = self.memory.load_memory(&self.agent_id).await?;
        let mut state = WindowMemory::from_memory(&blob);
        let mut reload = force_reload;

        let mut events = if state.is_usable_for(&config.events_order, config.events_to_show) {
            let ids = state.event_ids.clone().unwrap_or_default();
            let mut cached = self.log.events_by_id(&config.sources, &ids).await?;
            cached.sort_by_key(|e| e.id);
            cached
        } else {
            emit_window_invalidated(
                &self.agent_id,
                state.invalidation_reason(&config.events_order, config.events_to_show),
            );
            state.last_event_id = None;
            reload = true;
            Vec::new()
        };

        let mut mode = WindowMode::Cached;
        if reload {
            state.events_order = Some(config.events_order.clone());
            state.events_to_show = Some(config.events_to_show);

            let fetched = match state.last_event_id {
                Some(watermark) => {
                    mode = WindowMode::Incremental;
                    METRICS.inc_incremental_fetches();
                    self.log.events_above(&config.sources, watermark).await?
                }
                None => {
                    mode = WindowMode::ColdStart;
                    METRICS.inc_cold_starts();
                    self.cold_start_candidates(config).await?
                }
            };

            debug!(fetched = fetched.len(), ?mode, "window candidates fetched");
            if let Some(max_id) = fetched.iter().map(|e| e.id).max() {
                state.last_event_id = Some(max_id);
                events.extend(fetched);
            }
        }

        let mut events = sort_events(events, &config.events_order);
        if events.len() > config.events_to_show {
            events.drain(..events.len() - config.events_to_show);
        }

        if reload {
            state.event_ids = Some(events.iter().map(|e| e.id).collect());
            state.write_into(&mut blob)?;
            self.memory.store_memory(&self.agent_id, &blob).await?;
        }

        METRICS.inc_windows_computed();
        emit_window_computed(&self.agent_id, mode, events.len(), state.last_event_id);

        Ok(WindowSnapshot {
            events,
            mode,
            last_event_id: state.last_event_id,
        })
    }

    /// Most recent `cold_start_factor × events_to_show` events of every
    /// source, merged ascending by id.
    async fn cold_start_candidates(&self, config: &WindowConfig) -> Result<Vec<Event>> {
        let per_source = config
            .cold_start_factor
            .saturating_mul(config.events_to_show);
        let mut candidates = Vec::new();
        for source in &config.sources {
            let recent = self.log.recent_by_source(source, per_source).await?;
            debug!(source_id = %source, fetched = recent.len(), "cold start source scan");
            candidates.extend(recent);
        }
        candidates.sort_by_key(|e| e.id);
        Ok(candidates)
    }
}
