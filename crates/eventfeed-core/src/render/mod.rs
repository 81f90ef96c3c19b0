//! Feed rendering: window events to iCalendar, RSS or JSON responses.

pub mod ical;
pub mod item;
pub mod json;
pub mod rss;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use eventfeed_state::{AgentId, Event};
use sha2::{Digest, Sha256};

use crate::domain::config::FeedConfig;
use crate::domain::error::{RenderError, Result};

pub use item::{FeedItem, ItemTime};

/// Output format requested by a feed consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedFormat {
    ICalendar,
    Rss,
    Json,
}

impl FeedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFormat::ICalendar => "ics",
            FeedFormat::Rss => "rss",
            FeedFormat::Json => "json",
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ics" | "ical" | "icalendar" => Ok(FeedFormat::ICalendar),
            "rss" | "xml" => Ok(FeedFormat::Rss),
            "json" => Ok(FeedFormat::Json),
            _ => Err(RenderError::UnknownFormat(s.to_string())),
        }
    }
}

/// A host-agnostic HTTP-style response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub status: u16,
    pub content_type: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FeedResponse {
    /// The response for a missing or wrong secret.
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            content_type: "text/plain; charset=utf-8".to_string(),
            headers: BTreeMap::new(),
            body: "Not Authorized".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn etag(&self) -> Option<&str> {
        self.headers.get("ETag").map(String::as_str)
    }
}

/// Everything a serializer needs, independent of the output format.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub agent_id: AgentId,
    pub title: String,
    pub description: String,
    pub link: String,
    pub icon: Option<String>,
    pub ttl: u32,
    /// Items in window order.
    pub items: Vec<FeedItem>,
}

impl FeedDocument {
    /// Build the document for `events`, failing on the first bad item.
    pub fn build(
        config: &FeedConfig,
        agent_id: &AgentId,
        events: &[Event],
    ) -> std::result::Result<Self, RenderError> {
        let items = events
            .iter()
            .map(|event| FeedItem::from_event(event, &config.template.item))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            agent_id: agent_id.clone(),
            title: config.template.title.clone(),
            description: config.template.description.clone(),
            link: config.template.link.clone(),
            icon: config.template.icon.clone(),
            ttl: config.ttl,
            items,
        })
    }

    /// Creation time of the newest item, used as the channel date.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.items.iter().map(|i| i.created_at).max()
    }
}

fn etag(body: &str) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body.as_bytes())))
}

/// Render `events` (window order) in `format`.
///
/// Output depends only on the configuration and the events, so rendering the
/// same window twice yields byte-identical bodies and equal ETags.
pub fn render_feed(
    format: FeedFormat,
    config: &FeedConfig,
    agent_id: &AgentId,
    events: &[Event],
) -> Result<FeedResponse> {
    let doc = FeedDocument::build(config, agent_id, events)?;
    let (content_type, body) = match format {
        FeedFormat::ICalendar => (ical::CONTENT_TYPE.to_string(), ical::render(&doc)),
        FeedFormat::Rss => (
            config
                .rss_content_type
                .clone()
                .unwrap_or_else(|| rss::CONTENT_TYPE.to_string()),
            rss::render(&doc),
        ),
        FeedFormat::Json => (json::CONTENT_TYPE.to_string(), json::render(&doc)?),
    };

    let mut headers = config.response_headers.clone();
    headers.insert("ETag".to_string(), etag(&body));

    Ok(FeedResponse {
        status: 200,
        content_type,
        headers,
        body,
    })
}
