//! Domain models for eventfeed.
//!
//! - `FeedConfig` / `WindowConfig`: Validated agent options
//! - `EventsOrder`: Ranking used to select and order the window
//! - Placeholder expressions evaluated against event payloads
//! - Error taxonomy

pub mod config;
pub mod error;
pub mod expression;
pub mod order;

pub use config::{FeedConfig, FeedTemplate, ItemTemplate, WindowConfig};
pub use error::{ConfigError, FeedError, RenderError, Result};
pub use expression::interpolate;
pub use order::{sort_events, EventsOrder, OrderKey, SortKind};
