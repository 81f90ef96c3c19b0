//! Structured observability hooks for feed agent lifecycle events.
//!
//! Emission functions for window computation, cache invalidation, received
//! batches and rendered or rejected feed requests. Spans come from
//! `#[instrument]` on the async entry points.
//!
//! Events are emitted at `info!` level (`warn!` for rejected requests).

use eventfeed_state::{AgentId, EventId};
use tracing::info;

use crate::window::WindowMode;

/// Emit event: window computed.
pub fn emit_window_computed(
    agent_id: &AgentId,
    mode: WindowMode,
    size: usize,
    watermark: Option<EventId>,
) {
    info!(
        event = "window.computed",
        agent_id = %agent_id,
        mode = %mode,
        size = size,
        watermark = watermark.map(|id| id.0),
    );
}

/// Emit event: cached window discarded.
pub fn emit_window_invalidated(agent_id: &AgentId, reason: &str) {
    info!(event = "window.invalidated", agent_id = %agent_id, reason = %reason);
}

/// Emit event: a batch of upstream events arrived.
pub fn emit_events_received(agent_id: &AgentId, count: usize) {
    info!(event = "events.received", agent_id = %agent_id, count = count);
}

/// Emit event: feed rendered.
pub fn emit_feed_rendered(agent_id: &AgentId, format: &str, items: usize) {
    info!(event = "feed.rendered", agent_id = %agent_id, format = %format, items = items);
}

/// Emit event: request rejected by the secret check (warning level).
pub fn emit_feed_unauthorized(agent_id: &AgentId) {
    tracing::warn!(event = "feed.unauthorized", agent_id = %agent_id);
}
