//! Ordering configuration for the event window.
//!
//! An ordering is a list of `[expression, kind, descending?]` triples. Each
//! event is keyed by evaluating every expression, parsing the result
//! according to its kind, and comparing the keys lexicographically, each
//! component in its own direction. The candidate position breaks remaining
//! ties, so the sort is stable.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use eventfeed_state::Event;
use serde::{Deserialize, Serialize};

use super::expression::{interpolate, INDEX_VAR};

/// How an evaluated expression is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKind {
    String,
    Number,
    Time,
}

/// One sort key: `[expression, kind, descending]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OrderKeyRepr", into = "OrderKeyRepr")]
pub struct OrderKey {
    pub expression: String,
    pub kind: SortKind,
    pub descending: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OrderKeyRepr {
    Full(String, SortKind, bool),
    Short(String, SortKind),
}

impl From<OrderKeyRepr> for OrderKey {
    fn from(repr: OrderKeyRepr) -> Self {
        match repr {
            OrderKeyRepr::Full(expression, kind, descending) => OrderKey {
                expression,
                kind,
                descending,
            },
            OrderKeyRepr::Short(expression, kind) => OrderKey {
                expression,
                kind,
                descending: false,
            },
        }
    }
}

impl From<OrderKey> for OrderKeyRepr {
    fn from(key: OrderKey) -> Self {
        OrderKeyRepr::Full(key.expression, key.kind, key.descending)
    }
}

impl OrderKey {
    pub fn new(expression: impl Into<String>, kind: SortKind, descending: bool) -> Self {
        Self {
            expression: expression.into(),
            kind,
            descending,
        }
    }
}

/// Full ordering configuration. Defaults to candidate position, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventsOrder(pub Vec<OrderKey>);

impl Default for EventsOrder {
    fn default() -> Self {
        EventsOrder(vec![OrderKey::new(
            format!("{{{{{INDEX_VAR}}}}}"),
            SortKind::Number,
            false,
        )])
    }
}

impl EventsOrder {
    pub fn keys(&self) -> &[OrderKey] {
        &self.0
    }
}

/// A parsed key component. `Missing` sorts before every parsed value.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Missing,
    Text(String),
    Number(f64),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
            (SortValue::Missing, _) => Ordering::Less,
            (_, SortValue::Missing) => Ordering::Greater,
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            // Keys of one column share a kind.
            _ => Ordering::Equal,
        }
    }
}

/// Parse a timestamp in one of the accepted layouts (RFC 3339,
/// `YYYY-MM-DD HH:MM:SS` as UTC, or a bare date at midnight UTC).
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_value(raw: String, kind: SortKind) -> SortValue {
    match kind {
        SortKind::String => SortValue::Text(raw),
        SortKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| !n.is_nan())
            .map(SortValue::Number)
            .unwrap_or(SortValue::Missing),
        SortKind::Time => parse_time(&raw)
            .map(SortValue::Time)
            .unwrap_or(SortValue::Missing),
    }
}

/// Stable sort of `events` under `order`.
///
/// `_index_` evaluates to the 1-based position in the input slice.
pub fn sort_events(events: Vec<Event>, order: &EventsOrder) -> Vec<Event> {
    if order.keys().is_empty() {
        return events;
    }

    let mut keyed: Vec<(Vec<SortValue>, usize, Event)> = events
        .into_iter()
        .enumerate()
        .map(|(i, event)| {
            let keys = order
                .keys()
                .iter()
                .map(|key| parse_value(interpolate(&key.expression, &event, Some(i + 1)), key.kind))
                .collect();
            (keys, i, event)
        })
        .collect();

    keyed.sort_by(|(a_keys, a_pos, _), (b_keys, b_pos, _)| {
        order
            .keys()
            .iter()
            .zip(a_keys.iter().zip(b_keys.iter()))
            .map(|(key, (a, b))| {
                let ord = a.compare(b);
                if key.descending {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| a_pos.cmp(b_pos))
    });

    keyed.into_iter().map(|(_, _, event)| event).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eventfeed_state::{EventId, SourceId};
    use serde_json::json;

    fn event(id: u64, payload: serde_json::Value) -> Event {
        Event {
            id: EventId(id),
            source_id: SourceId::new("s"),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            payload,
        }
    }

    fn ids(events: &[Event]) -> Vec<u64> {
        events.iter().map(|e| e.id.0).collect()
    }

    #[test]
    fn test_default_order_keeps_input_order() {
        let events = vec![event(3, json!({})), event(1, json!({})), event(2, json!({}))];
        let sorted = sort_events(events, &EventsOrder::default());
        assert_eq!(ids(&sorted), vec![3, 1, 2]);
    }

    #[test]
    fn test_default_order_serializes_as_triple() {
        let json = serde_json::to_value(EventsOrder::default()).unwrap();
        assert_eq!(json, json!([["{{_index_}}", "number", false]]));
    }

    #[test]
    fn test_short_triple_defaults_ascending() {
        let order: EventsOrder = serde_json::from_value(json!([["{{title}}", "string"]])).unwrap();
        assert!(!order.keys()[0].descending);
        assert_eq!(order.keys()[0].kind, SortKind::String);
    }

    #[test]
    fn test_numeric_descending() {
        let events = vec![
            event(1, json!({"score": "2"})),
            event(2, json!({"score": 10})),
            event(3, json!({"score": 1.5})),
        ];
        let order = EventsOrder(vec![OrderKey::new("{{score}}", SortKind::Number, true)]);
        assert_eq!(ids(&sort_events(events, &order)), vec![2, 1, 3]);
    }

    #[test]
    fn test_numeric_is_not_lexicographic() {
        let events = vec![event(1, json!({"n": "10"})), event(2, json!({"n": "9"}))];
        let order = EventsOrder(vec![OrderKey::new("{{n}}", SortKind::Number, false)]);
        assert_eq!(ids(&sort_events(events, &order)), vec![2, 1]);
    }

    #[test]
    fn test_time_kind_and_unparsable_first() {
        let events = vec![
            event(1, json!({"at": "2026-05-01T10:00:00Z"})),
            event(2, json!({"at": "not a date"})),
            event(3, json!({"at": "2026-04-01"})),
        ];
        let order = EventsOrder(vec![OrderKey::new("{{at}}", SortKind::Time, false)]);
        assert_eq!(ids(&sort_events(events, &order)), vec![2, 3, 1]);
    }

    #[test]
    fn test_ties_preserve_input_order_and_secondary_key() {
        let events = vec![
            event(1, json!({"g": "b", "n": 1})),
            event(2, json!({"g": "a", "n": 1})),
            event(3, json!({"g": "b", "n": 2})),
            event(4, json!({"g": "a", "n": 1})),
        ];
        let order = EventsOrder(vec![
            OrderKey::new("{{g}}", SortKind::String, false),
            OrderKey::new("{{n}}", SortKind::Number, true),
        ]);
        assert_eq!(ids(&sort_events(events, &order)), vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_descending_index_reverses() {
        let events = vec![event(1, json!({})), event(2, json!({})), event(3, json!({}))];
        let order = EventsOrder(vec![OrderKey::new("{{_index_}}", SortKind::Number, true)]);
        assert_eq!(ids(&sort_events(events, &order)), vec![3, 2, 1]);
    }

    #[test]
    fn test_parse_time_layouts() {
        assert!(parse_time("2026-10-19T08:30:00+02:00").is_some());
        assert!(parse_time("2026-10-19 08:30:00").is_some());
        assert!(parse_time("2026-10-19").is_some());
        assert!(parse_time("19/10/2026").is_none());
    }
}
