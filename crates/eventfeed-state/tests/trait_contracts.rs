//! Trait contract tests for EventLog and AgentMemoryStore.
//!
//! These tests verify the behavioral contracts of the storage traits
//! against the in-memory fakes and the SurrealDB backend (`mem://`).
//! Any conforming implementation must pass these.

use eventfeed_state::fakes::{MemoryAgentStore, MemoryEventLog};
use eventfeed_state::storage_traits::*;
use eventfeed_state::{StorageError, SurrealFeedStore};
use serde_json::json;

fn src(id: &str) -> SourceId {
    SourceId::new(id)
}

async fn seed(log: &dyn EventLog) -> Vec<Event> {
    let mut out = Vec::new();
    for (source, title) in [
        ("a", "a1"),
        ("a", "a2"),
        ("b", "b1"),
        ("a", "a3"),
        ("c", "c1"),
        ("b", "b2"),
    ] {
        out.push(log.append(&src(source), json!({ "title": title })).await.unwrap());
    }
    out
}

// ===========================================================================
// EventLog contracts (shared)
// ===========================================================================

async fn contract_append_assigns_increasing_ids(log: &dyn EventLog) {
    let events = seed(log).await;
    for pair in events.windows(2) {
        assert!(pair[0].id < pair[1].id);
    }
    assert_eq!(events[0].payload["title"], "a1");
}

async fn contract_append_rejects_non_object_payload(log: &dyn EventLog) {
    let err = log.append(&src("a"), json!("plain string")).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidPayload { .. }));
}

async fn contract_events_by_source_ascending(log: &dyn EventLog) {
    seed(log).await;
    let events = log.events_by_source(&src("a")).await.unwrap();
    let titles: Vec<_> = events.iter().map(|e| e.payload["title"].clone()).collect();
    assert_eq!(titles, vec![json!("a1"), json!("a2"), json!("a3")]);
    assert!(events.iter().all(|e| e.source_id == src("a")));
}

async fn contract_recent_by_source_keeps_tail(log: &dyn EventLog) {
    seed(log).await;
    let events = log.recent_by_source(&src("a"), 2).await.unwrap();
    let titles: Vec<_> = events.iter().map(|e| e.payload["title"].clone()).collect();
    assert_eq!(titles, vec![json!("a2"), json!("a3")]);

    let all = log.recent_by_source(&src("a"), 10).await.unwrap();
    assert_eq!(all.len(), 3);
}

async fn contract_events_above_filters_sources(log: &dyn EventLog) {
    let seeded = seed(log).await;
    let above = seeded[1].id;
    let events = log
        .events_above(&[src("a"), src("b")], above)
        .await
        .unwrap();
    let titles: Vec<_> = events.iter().map(|e| e.payload["title"].clone()).collect();
    assert_eq!(titles, vec![json!("b1"), json!("a3"), json!("b2")]);
}

async fn contract_events_by_id_restricted(log: &dyn EventLog) {
    let seeded = seed(log).await;
    let ids: Vec<EventId> = seeded.iter().map(|e| e.id).collect();
    let mut events = log.events_by_id(&[src("b"), src("c")], &ids).await.unwrap();
    events.sort_by_key(|e| e.id);
    let titles: Vec<_> = events.iter().map(|e| e.payload["title"].clone()).collect();
    assert_eq!(titles, vec![json!("b1"), json!("c1"), json!("b2")]);

    let none = log.events_by_id(&[src("a")], &[]).await.unwrap();
    assert!(none.is_empty());
}

// ===========================================================================
// AgentMemoryStore contracts (shared)
// ===========================================================================

async fn contract_memory_empty_for_unknown_agent(store: &dyn AgentMemoryStore) {
    let memory = store.load_memory(&AgentId::from("nobody")).await.unwrap();
    assert!(memory.is_empty());
}

async fn contract_memory_round_trip_and_replace(store: &dyn AgentMemoryStore) {
    let agent = AgentId::from("feed-1");
    let mut memory = AgentMemory::new();
    memory.insert("event_ids".into(), json!([4, 5, 6]));
    memory.insert("last_event_id".into(), json!(6));
    store.store_memory(&agent, &memory).await.unwrap();

    let loaded = store.load_memory(&agent).await.unwrap();
    assert_eq!(loaded.get("event_ids"), Some(&json!([4, 5, 6])));
    assert_eq!(loaded.get("last_event_id"), Some(&json!(6)));

    let mut replaced = AgentMemory::new();
    replaced.insert("events_to_show".into(), json!(3));
    store.store_memory(&agent, &replaced).await.unwrap();
    let loaded = store.load_memory(&agent).await.unwrap();
    assert_eq!(loaded, replaced);
}

async fn contract_memory_scoped_per_agent(store: &dyn AgentMemoryStore) {
    let mut memory = AgentMemory::new();
    memory.insert("last_event_id".into(), json!(1));
    store
        .store_memory(&AgentId::from("one"), &memory)
        .await
        .unwrap();

    let other = store.load_memory(&AgentId::from("two")).await.unwrap();
    assert!(other.is_empty());
}

// ===========================================================================
// Fakes
// ===========================================================================

#[tokio::test]
async fn fake_append_assigns_increasing_ids() {
    contract_append_assigns_increasing_ids(&MemoryEventLog::new()).await;
}

#[tokio::test]
async fn fake_append_rejects_non_object_payload() {
    contract_append_rejects_non_object_payload(&MemoryEventLog::new()).await;
}

#[tokio::test]
async fn fake_events_by_source_ascending() {
    contract_events_by_source_ascending(&MemoryEventLog::new()).await;
}

#[tokio::test]
async fn fake_recent_by_source_keeps_tail() {
    contract_recent_by_source_keeps_tail(&MemoryEventLog::new()).await;
}

#[tokio::test]
async fn fake_events_above_filters_sources() {
    contract_events_above_filters_sources(&MemoryEventLog::new()).await;
}

#[tokio::test]
async fn fake_events_by_id_restricted() {
    contract_events_by_id_restricted(&MemoryEventLog::new()).await;
}

#[tokio::test]
async fn fake_memory_empty_for_unknown_agent() {
    contract_memory_empty_for_unknown_agent(&MemoryAgentStore::new()).await;
}

#[tokio::test]
async fn fake_memory_round_trip_and_replace() {
    let store = MemoryAgentStore::new();
    contract_memory_round_trip_and_replace(&store).await;
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn fake_memory_scoped_per_agent() {
    contract_memory_scoped_per_agent(&MemoryAgentStore::new()).await;
}

#[tokio::test]
async fn fake_injected_failure_fires_once() {
    let log = MemoryEventLog::new();
    log.fail_next("events_above");

    let err = log.events_above(&[src("a")], EventId(0)).await.unwrap_err();
    assert!(matches!(err, StorageError::Injected { .. }));
    assert!(log.events_above(&[src("a")], EventId(0)).await.is_ok());
}

#[tokio::test]
async fn fake_insert_rejects_non_increasing_id() {
    let log = MemoryEventLog::new();
    log.insert(5, "a", chrono::Utc::now(), json!({})).unwrap();
    assert!(log.insert(5, "a", chrono::Utc::now(), json!({})).is_err());
    assert_eq!(log.len(), 1);
}

// ===========================================================================
// SurrealDB (in-memory)
// ===========================================================================

#[tokio::test]
async fn surreal_append_assigns_increasing_ids() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_append_assigns_increasing_ids(&store).await;
}

#[tokio::test]
async fn surreal_append_rejects_non_object_payload() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_append_rejects_non_object_payload(&store).await;
}

#[tokio::test]
async fn surreal_events_by_source_ascending() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_events_by_source_ascending(&store).await;
}

#[tokio::test]
async fn surreal_recent_by_source_keeps_tail() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_recent_by_source_keeps_tail(&store).await;
}

#[tokio::test]
async fn surreal_events_above_filters_sources() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_events_above_filters_sources(&store).await;
}

#[tokio::test]
async fn surreal_events_by_id_restricted() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_events_by_id_restricted(&store).await;
}

#[tokio::test]
async fn surreal_memory_empty_for_unknown_agent() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_memory_empty_for_unknown_agent(&store).await;
}

#[tokio::test]
async fn surreal_memory_round_trip_and_replace() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_memory_round_trip_and_replace(&store).await;
}

#[tokio::test]
async fn surreal_memory_scoped_per_agent() {
    let store = SurrealFeedStore::in_memory().await.unwrap();
    contract_memory_scoped_per_agent(&store).await;
}
