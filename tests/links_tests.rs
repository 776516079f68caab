//! Integration tests for link traversal.
//!
//! These tests assert on both the collected entities and the requests the
//! traversal issues.

mod common;

use common::{client, meta, FakeTransport, BASE};
use moysklad_api::rest::Entity;
use serde_json::{json, Value};
use std::sync::Arc;

fn link(entity_type: &str, id: &str) -> Value {
    json!({"meta": meta(entity_type, id)})
}

fn ids(entities: &[Entity]) -> Vec<&str> {
    entities.iter().map(|e| e.id().unwrap()).collect()
}

/// Answers an entity fetch from a fixed graph keyed by id.
fn graph(url: &str) -> Value {
    let path = url.split('?').next().unwrap();
    let id = path.rsplit('/').next().unwrap();
    match id {
        "d-1" => json!({
            "meta": meta("demand", "d-1"),
            "agent": link("counterparty", "c-3")
        }),
        "d-2" => json!({
            "meta": meta("demand", "d-2"),
            "agent": link("counterparty", "c-4"),
            "customerOrder": link("customerorder", "o-1")
        }),
        other => json!({"meta": meta("counterparty", other)}),
    }
}

// ============================================================================
// Local Scan
// ============================================================================

#[tokio::test]
async fn test_limit_truncates_without_requests() {
    let client = client(FakeTransport::offline());
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "agents": [link("counterparty", "c-1"), link("counterparty", "c-2")],
        "contacts": [link("counterparty", "c-3")]
    }))
    .unwrap();

    let found = order
        .get_linked_entities(&client, "counterparty", None, 1, None)
        .await
        .unwrap();

    assert_eq!(ids(&found), vec!["c-1"]);
    assert_eq!(client.transport().request_count(), 0);
}

#[tokio::test]
async fn test_collects_matching_fields_in_order() {
    let client = client(FakeTransport::offline());
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "agent": link("counterparty", "c-1"),
        "store": link("store", "s-1"),
        "attributes": [link("counterparty", "c-9")],
        "positions": [link("counterparty", "c-8")],
        "contacts": [link("counterparty", "c-2"), link("counterparty", "c-3")],
        "name": "00001"
    }))
    .unwrap();

    let found = order
        .get_linked_entities(&client, "counterparty", None, 10, None)
        .await
        .unwrap();

    assert_eq!(ids(&found), vec!["c-1", "c-2", "c-3"]);
}

#[tokio::test]
async fn test_zero_limit_returns_empty() {
    let client = client(FakeTransport::offline());
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "agent": link("counterparty", "c-1")
    }))
    .unwrap();

    let found = order
        .get_linked_entities(&client, "counterparty", Some(3), 0, None)
        .await
        .unwrap();
    assert!(found.is_empty());
}

// ============================================================================
// Recursion
// ============================================================================

#[tokio::test]
async fn test_recursion_fetches_linked_entities_with_expand() {
    let client = client(FakeTransport::new(|r| Ok(graph(&r.url))));
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "demands": [link("demand", "d-1"), link("demand", "d-2")]
    }))
    .unwrap();

    let found = order
        .get_linked_entities(&client, "counterparty", Some(1), 10, Some("agent"))
        .await
        .unwrap();

    assert_eq!(ids(&found), vec!["c-3", "c-4"]);
    let urls: Vec<String> = client.transport().requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{BASE}/entity/demand/d-1?expand=agent"),
            format!("{BASE}/entity/demand/d-2?expand=agent"),
        ]
    );
}

#[tokio::test]
async fn test_recursion_never_refetches_visited_hrefs() {
    let client = client(FakeTransport::new(|r| Ok(graph(&r.url))));
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "demands": [link("demand", "d-2")]
    }))
    .unwrap();

    // d-2 links back to o-1, which is the root and must not be fetched.
    let found = order
        .get_linked_entities(&client, "counterparty", Some(5), 10, None)
        .await
        .unwrap();

    assert_eq!(ids(&found), vec!["c-4"]);
    let urls: Vec<String> = client.transport().requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{BASE}/entity/demand/d-2"),
            format!("{BASE}/entity/counterparty/c-4"),
        ]
    );
}

#[tokio::test]
async fn test_recursion_stops_once_limit_is_reached() {
    let client = client(FakeTransport::new(|r| Ok(graph(&r.url))));
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "demands": [link("demand", "d-1"), link("demand", "d-2")]
    }))
    .unwrap();

    let found = order
        .get_linked_entities(&client, "counterparty", Some(1), 1, None)
        .await
        .unwrap();

    assert_eq!(ids(&found), vec!["c-3"]);
    assert_eq!(client.transport().request_count(), 2);
}

#[tokio::test]
async fn test_scan_resumes_after_descending() {
    let client = client(FakeTransport::new(|r| Ok(graph(&r.url))));
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "demands": [link("demand", "d-1")],
        "agent": link("counterparty", "c-1")
    }))
    .unwrap();

    let found = order
        .get_linked_entities(&client, "counterparty", Some(1), 10, None)
        .await
        .unwrap();

    assert_eq!(ids(&found), vec!["c-3", "c-1"]);
}

// ============================================================================
// Spawning
// ============================================================================

#[tokio::test]
async fn test_traversal_runs_on_spawned_task() {
    let client = Arc::new(client(FakeTransport::new(|r| Ok(graph(&r.url)))));
    let order = Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "demands": [link("demand", "d-1")]
    }))
    .unwrap();

    let task_client = Arc::clone(&client);
    let found = tokio::spawn(async move {
        order
            .get_linked_entities(&*task_client, "counterparty", Some(1), 10, None)
            .await
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(ids(&found), vec!["c-3"]);
    assert_eq!(client.transport().request_count(), 1);
}
