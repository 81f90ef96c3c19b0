//! Host-facing feed agent.
//!
//! `FeedAgent` ties a validated [`FeedConfig`] to the event log and the
//! agent memory store. Hosts call [`FeedAgent::on_events_received`] when
//! upstream events arrive and [`FeedAgent::render`] for feed requests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use eventfeed_state::{AgentId, AgentMemory, AgentMemoryStore, Event, EventLog};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::config::FeedConfig;
use crate::domain::error::Result;
use crate::metrics::METRICS;
use crate::obs::{emit_events_received, emit_feed_rendered, emit_feed_unauthorized};
use crate::render::{render_feed, FeedFormat, FeedResponse};
use crate::window::{EventWindow, WindowMemory, WindowSnapshot};

/// Memory key holding the time the agent last received a batch.
pub const LAST_RECEIVE_AT_KEY: &str = "last_receive_at";

pub struct FeedAgent {
    config: FeedConfig,
    window: EventWindow,
    memory: Arc<dyn AgentMemoryStore>,
}

impl FeedAgent {
    /// Build an agent, rejecting invalid configuration.
    pub fn new(
        agent_id: AgentId,
        config: FeedConfig,
        log: Arc<dyn EventLog>,
        memory: Arc<dyn AgentMemoryStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            window: EventWindow::new(agent_id, log, Arc::clone(&memory)),
            memory,
        })
    }

    pub fn agent_id(&self) -> &AgentId {
        self.window.agent_id()
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// React to a batch of upstream events: rebuild the window and record
    /// when the agent last heard from its sources.
    pub async fn on_events_received(&self, batch: &[Event]) -> Result<WindowSnapshot> {
        self.on_events_received_at(batch, Utc::now()).await
    }

    /// As [`FeedAgent::on_events_received`], with the receive time supplied
    /// by the host.
    #[instrument(skip(self, batch), fields(agent_id = %self.agent_id(), count = batch.len()))]
    pub async fn on_events_received_at(
        &self,
        batch: &[Event],
        received_at: DateTime<Utc>,
    ) -> Result<WindowSnapshot> {
        emit_events_received(self.agent_id(), batch.len());

        let snapshot = self
            .window
            .compute_snapshot(&self.config.window_config(), true)
            .await?;

        let mut blob = self.memory.load_memory(self.agent_id()).await?;
        let newest = match read_last_receive_at(&blob) {
            Some(previous) if previous > received_at => previous,
            _ => received_at,
        };
        blob.insert(LAST_RECEIVE_AT_KEY.to_string(), Value::String(newest.to_rfc3339()));
        self.memory.store_memory(self.agent_id(), &blob).await?;

        Ok(snapshot)
    }

    /// Answer a feed request.
    ///
    /// A missing or unknown secret yields a 401 response and touches nothing.
    #[instrument(skip(self, secret, format), fields(agent_id = %self.agent_id(), format = %format))]
    pub async fn render(&self, secret: Option<&str>, format: FeedFormat) -> Result<FeedResponse> {
        if !self.config.accepts_secret(secret) {
            METRICS.inc_unauthorized();
            emit_feed_unauthorized(self.agent_id());
            return Ok(FeedResponse::unauthorized());
        }

        let events = self
            .window
            .compute(&self.config.window_config(), false)
            .await?;
        let response = render_feed(format, &self.config, self.agent_id(), &events)?;

        METRICS.inc_feeds_rendered();
        emit_feed_rendered(self.agent_id(), format.as_str(), events.len());
        Ok(response)
    }

    /// Current window, without rendering.
    pub async fn window(&self) -> Result<WindowSnapshot> {
        self.window
            .compute_snapshot(&self.config.window_config(), false)
            .await
    }

    /// Persisted window cache state.
    pub async fn window_memory(&self) -> Result<WindowMemory> {
        self.window.memory().await
    }

    pub async fn last_receive_at(&self) -> Result<Option<DateTime<Utc>>> {
        let blob = self.memory.load_memory(self.agent_id()).await?;
        Ok(read_last_receive_at(&blob))
    }

    /// Whether events arrived within `expected_receive_period_in_days` of `now`.
    pub async fn is_working(&self, now: DateTime<Utc>) -> Result<bool> {
        let period = Duration::days(i64::from(self.config.expected_receive_period_in_days));
        let working = self
            .last_receive_at()
            .await?
            .is_some_and(|at| at > now - period);
        debug!(working, "working check");
        Ok(working)
    }
}

fn read_last_receive_at(blob: &AgentMemory) -> Option<DateTime<Utc>> {
    blob.get(LAST_RECEIVE_AT_KEY)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
