//! Typed feed items extracted from event payloads.

use chrono::{DateTime, NaiveDate, Utc};
use eventfeed_state::{Event, EventId};

use crate::domain::config::ItemTemplate;
use crate::domain::error::RenderError;
use crate::domain::expression::interpolate;
use crate::domain::order::parse_time;

/// A calendar point in time: all-day or exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTime {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl ItemTime {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(ItemTime::Date(date));
        }
        parse_time(raw).map(ItemTime::DateTime)
    }

    /// RFC 3339 for datetimes, `YYYY-MM-DD` for dates.
    pub fn to_iso(&self) -> String {
        match self {
            ItemTime::DateTime(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ItemTime::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// One rendered entry of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub event_id: EventId,
    pub summary: String,
    pub description: String,
    pub url: Option<String>,
    pub location: Option<String>,
    pub starts_at: ItemTime,
    pub ends_at: Option<ItemTime>,
    pub created_at: DateTime<Utc>,
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn time_field(
    event: &Event,
    field: &'static str,
    expression: &str,
) -> Result<Option<ItemTime>, RenderError> {
    let Some(raw) = non_empty(interpolate(expression, event, None)) else {
        return Ok(None);
    };
    ItemTime::parse(&raw)
        .map(Some)
        .ok_or(RenderError::InvalidTimestamp {
            event_id: event.id,
            field,
            value: raw,
        })
}

/// Both ends must share a value type. An all-day end is exclusive, so it
/// has to fall on a later day than the start.
fn check_span(event_id: EventId, start: &ItemTime, end: &ItemTime) -> Result<(), RenderError> {
    match (start, end) {
        (ItemTime::Date(s), ItemTime::Date(e)) if e <= s => {
            Err(RenderError::EndsBeforeStart { event_id })
        }
        (ItemTime::DateTime(s), ItemTime::DateTime(e)) if e < s => {
            Err(RenderError::EndsBeforeStart { event_id })
        }
        (ItemTime::Date(_), ItemTime::DateTime(_)) | (ItemTime::DateTime(_), ItemTime::Date(_)) => {
            Err(RenderError::MixedTimeKinds { event_id })
        }
        _ => Ok(()),
    }
}

impl FeedItem {
    /// Map an event through the item template.
    ///
    /// Fails when a configured timestamp is missing or unparsable, when the
    /// ends are inconsistent, or when the url carries control characters.
    pub fn from_event(event: &Event, template: &ItemTemplate) -> Result<Self, RenderError> {
        let starts_at = match &template.starts_at {
            Some(expression) => time_field(event, "starts_at", expression)?.ok_or(
                RenderError::MissingField {
                    event_id: event.id,
                    field: "starts_at",
                },
            )?,
            None => ItemTime::DateTime(event.created_at),
        };

        let ends_at = match &template.ends_at {
            Some(expression) => time_field(event, "ends_at", expression)?,
            None => None,
        };
        if let Some(end) = ends_at {
            check_span(event.id, &starts_at, &end)?;
        }

        let url = non_empty(interpolate(&template.url, event, None));
        if let Some(value) = url.as_deref().filter(|u| u.chars().any(char::is_control)) {
            return Err(RenderError::InvalidUrl {
                event_id: event.id,
                value: value.to_string(),
            });
        }

        Ok(FeedItem {
            event_id: event.id,
            summary: interpolate(&template.summary, event, None),
            description: interpolate(&template.description, event, None),
            url,
            location: template
                .location
                .as_deref()
                .and_then(|expr| non_empty(interpolate(expr, event, None))),
            starts_at,
            ends_at,
            created_at: event.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eventfeed_state::SourceId;
    use serde_json::json;

    fn event(payload: serde_json::Value) -> Event {
        Event {
            id: EventId(3),
            source_id: SourceId::new("s"),
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
            payload,
        }
    }

    fn calendar_template() -> ItemTemplate {
        ItemTemplate {
            starts_at: Some("{{start}}".into()),
            ends_at: Some("{{end}}".into()),
            location: Some("{{where}}".into()),
            ..ItemTemplate::default()
        }
    }

    #[test]
    fn test_defaults_use_created_at() {
        let item = FeedItem::from_event(&event(json!({"title": "Hi"})), &ItemTemplate::default())
            .unwrap();
        assert_eq!(item.summary, "Hi");
        assert_eq!(item.url, None);
        assert_eq!(item.starts_at, ItemTime::DateTime(event(json!({})).created_at));
    }

    #[test]
    fn test_all_day_and_exact_times() {
        let item = FeedItem::from_event(
            &event(json!({"title": "Fair", "start": "2026-06-01", "end": "2026-06-03", "where": "Park"})),
            &calendar_template(),
        )
        .unwrap();
        assert_eq!(
            item.starts_at,
            ItemTime::Date(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap())
        );
        assert!(matches!(item.ends_at, Some(ItemTime::Date(_))));
        assert_eq!(item.location.as_deref(), Some("Park"));

        let item = FeedItem::from_event(
            &event(json!({"start": "2026-06-01T09:00:00Z", "end": "2026-06-01T09:00:00Z"})),
            &calendar_template(),
        )
        .unwrap();
        assert_eq!(item.ends_at, Some(item.starts_at));
    }

    #[test]
    fn test_all_day_end_must_be_a_later_day() {
        let err = FeedItem::from_event(
            &event(json!({"start": "2026-06-01", "end": "2026-06-01"})),
            &calendar_template(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::EndsBeforeStart { .. }));
    }

    #[test]
    fn test_mixed_date_and_datetime_is_error() {
        for (start, end) in [
            ("2026-06-01", "2026-06-01T10:00:00Z"),
            ("2026-06-01T10:00:00Z", "2026-06-02"),
        ] {
            let err = FeedItem::from_event(
                &event(json!({"start": start, "end": end})),
                &calendar_template(),
            )
            .unwrap_err();
            assert!(matches!(err, RenderError::MixedTimeKinds { .. }));
        }
    }

    #[test]
    fn test_url_with_line_break_is_error() {
        let template = ItemTemplate {
            url: "{{link}}".into(),
            ..ItemTemplate::default()
        };
        let err = FeedItem::from_event(
            &event(json!({
                "link": "https://x.example/a\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nSUMMARY:forged"
            })),
            &template,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::InvalidUrl { event_id: EventId(3), .. }));

        let item = FeedItem::from_event(
            &event(json!({"link": "https://x.example/a?b=1&c=2"})),
            &template,
        )
        .unwrap();
        assert_eq!(item.url.as_deref(), Some("https://x.example/a?b=1&c=2"));
    }

    #[test]
    fn test_unparsable_start_is_error() {
        let err = FeedItem::from_event(
            &event(json!({"start": "next tuesday"})),
            &calendar_template(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidTimestamp {
                field: "starts_at",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_start_is_error() {
        let err = FeedItem::from_event(&event(json!({"title": "x"})), &calendar_template())
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingField { field: "starts_at", .. }));
    }

    #[test]
    fn test_end_before_start_is_error() {
        let err = FeedItem::from_event(
            &event(json!({"start": "2026-06-02T10:00:00Z", "end": "2026-06-01T10:00:00Z"})),
            &calendar_template(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::EndsBeforeStart { .. }));
    }

    #[test]
    fn test_missing_end_is_optional() {
        let item = FeedItem::from_event(
            &event(json!({"start": "2026-06-02T10:00:00Z"})),
            &calendar_template(),
        )
        .unwrap();
        assert_eq!(item.ends_at, None);
        assert_eq!(item.location, None);
    }
}
