//! eventfeed core library
//!
//! Maintains a bounded, ordered window over an agent's upstream events and
//! renders it as an iCalendar, RSS or JSON feed behind a shared secret.

pub mod agent;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod render;
pub mod telemetry;
pub mod window;

pub use agent::{FeedAgent, LAST_RECEIVE_AT_KEY};

pub use domain::{
    ConfigError, EventsOrder, FeedConfig, FeedError, FeedTemplate, ItemTemplate, OrderKey,
    RenderError, Result, SortKind, WindowConfig,
};

pub use render::{render_feed, FeedDocument, FeedFormat, FeedItem, FeedResponse, ItemTime};

pub use window::{EventWindow, WindowMemory, WindowMode, WindowSnapshot};

pub use eventfeed_state::{
    AgentId, AgentMemory, AgentMemoryStore, Event, EventId, EventLog, SourceId, StorageError,
};

pub use metrics::METRICS;
pub use telemetry::init_tracing;

/// eventfeed version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
