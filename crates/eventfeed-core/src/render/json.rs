//! JSON feed serialization.

use serde::Serialize;

use super::item::FeedItem;
use super::FeedDocument;
use crate::domain::error::RenderError;

pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Serialize)]
struct JsonFeed<'a> {
    title: &'a str,
    description: &'a str,
    link: &'a str,
    #[serde(rename = "pubDate", skip_serializing_if = "Option::is_none")]
    pub_date: Option<String>,
    items: Vec<JsonItem<'a>>,
}

#[derive(Serialize)]
struct JsonItem<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
    guid: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
    start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

impl<'a> From<&'a FeedItem> for JsonItem<'a> {
    fn from(item: &'a FeedItem) -> Self {
        JsonItem {
            title: &item.summary,
            description: &item.description,
            link: item.url.as_deref(),
            guid: item.event_id.to_string(),
            pub_date: item.created_at.to_rfc2822(),
            start: item.starts_at.to_iso(),
            end: item.ends_at.map(|t| t.to_iso()),
            location: item.location.as_deref(),
        }
    }
}

/// Render the document as pretty-printed JSON, newest item first.
pub fn render(doc: &FeedDocument) -> Result<String, RenderError> {
    let feed = JsonFeed {
        title: &doc.title,
        description: &doc.description,
        link: &doc.link,
        pub_date: doc.published_at().map(|t| t.to_rfc2822()),
        items: doc.items.iter().rev().map(JsonItem::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&feed)?)
}
