//! Feed agent configuration.
//!
//! `FeedConfig` is the validated, explicit form of the agent's options. It is
//! loaded from TOML and handed to the agent per invocation; the window
//! maintainer only ever sees the narrower `WindowConfig`.

use std::collections::BTreeMap;
use std::path::Path;

use eventfeed_state::SourceId;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::order::EventsOrder;

pub const DEFAULT_EVENTS_TO_SHOW: usize = 40;
pub const DEFAULT_EXPECTED_RECEIVE_PERIOD_DAYS: u32 = 2;
pub const DEFAULT_COLD_START_FACTOR: usize = 2;
pub const DEFAULT_TTL_MINUTES: u32 = 60;

fn default_events_to_show() -> usize {
    DEFAULT_EVENTS_TO_SHOW
}

fn default_expected_receive_period() -> u32 {
    DEFAULT_EXPECTED_RECEIVE_PERIOD_DAYS
}

fn default_cold_start_factor() -> usize {
    DEFAULT_COLD_START_FACTOR
}

fn default_ttl() -> u32 {
    DEFAULT_TTL_MINUTES
}

/// Per-item field expressions (see `domain::expression`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTemplate {
    pub summary: String,
    pub description: String,
    pub url: String,
    pub location: Option<String>,
    /// Falls back to the event's `created_at` when unset.
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

impl Default for ItemTemplate {
    fn default() -> Self {
        Self {
            summary: "{{title}}".to_string(),
            description: "{{description}}".to_string(),
            url: "{{url}}".to_string(),
            location: None,
            starts_at: None,
            ends_at: None,
        }
    }
}

/// Feed-level metadata plus the per-item template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedTemplate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub item: ItemTemplate,
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Agent instance this configuration belongs to.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Upstream sources whose events are visible to the agent.
    #[serde(default)]
    pub sources: Vec<SourceId>,
    /// Allow-list of request secrets.
    pub secrets: Vec<String>,
    #[serde(default = "default_expected_receive_period")]
    pub expected_receive_period_in_days: u32,
    #[serde(default = "default_events_to_show")]
    pub events_to_show: usize,
    #[serde(default)]
    pub events_order: EventsOrder,
    /// Per-source over-fetch multiplier used on cold start.
    #[serde(default = "default_cold_start_factor")]
    pub cold_start_factor: usize,
    /// RSS `ttl` in minutes.
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub rss_content_type: Option<String>,
    #[serde(default)]
    pub response_headers: BTreeMap<String, String>,
    pub template: FeedTemplate,
}

/// The slice of configuration the window maintainer depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub sources: Vec<SourceId>,
    pub events_to_show: usize,
    pub events_order: EventsOrder,
    pub cold_start_factor: usize,
}

impl WindowConfig {
    pub fn new(sources: Vec<SourceId>, events_to_show: usize) -> Self {
        Self {
            sources,
            events_to_show,
            events_order: EventsOrder::default(),
            cold_start_factor: DEFAULT_COLD_START_FACTOR,
        }
    }

    pub fn with_order(mut self, order: EventsOrder) -> Self {
        self.events_order = order;
        self
    }
}

impl FeedConfig {
    /// Minimal valid configuration: one secret and a feed title.
    pub fn new(secret: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            agent_id: None,
            sources: Vec::new(),
            secrets: vec![secret.into()],
            expected_receive_period_in_days: DEFAULT_EXPECTED_RECEIVE_PERIOD_DAYS,
            events_to_show: DEFAULT_EVENTS_TO_SHOW,
            events_order: EventsOrder::default(),
            cold_start_factor: DEFAULT_COLD_START_FACTOR,
            ttl: DEFAULT_TTL_MINUTES,
            rss_content_type: None,
            response_headers: BTreeMap::new(),
            template: FeedTemplate {
                title: title.into(),
                description: String::new(),
                link: String::new(),
                icon: None,
                item: ItemTemplate::default(),
            },
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: FeedConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check every option the agent relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secrets.is_empty() {
            return Err(ConfigError::NoSecrets);
        }
        if self.secrets.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::EmptySecret);
        }
        if self.expected_receive_period_in_days == 0 {
            return Err(ConfigError::NonPositive {
                field: "expected_receive_period_in_days",
            });
        }
        if self.events_to_show == 0 {
            return Err(ConfigError::NonPositive {
                field: "events_to_show",
            });
        }
        if self.cold_start_factor == 0 {
            return Err(ConfigError::NonPositive {
                field: "cold_start_factor",
            });
        }
        if self.ttl == 0 {
            return Err(ConfigError::NonPositive { field: "ttl" });
        }
        if let Some(index) = self
            .events_order
            .keys()
            .iter()
            .position(|k| k.expression.trim().is_empty())
        {
            return Err(ConfigError::EmptyOrderExpression { index });
        }
        if self.template.title.trim().is_empty() {
            return Err(ConfigError::MissingTitle);
        }
        Ok(())
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            sources: self.sources.clone(),
            events_to_show: self.events_to_show,
            events_order: self.events_order.clone(),
            cold_start_factor: self.cold_start_factor,
        }
    }

    /// Whether `secret` is on the allow-list.
    pub fn accepts_secret(&self, secret: Option<&str>) -> bool {
        match secret {
            Some(secret) if !secret.is_empty() => self.secrets.iter().any(|s| s == secret),
            _ => false,
        }
    }
}
