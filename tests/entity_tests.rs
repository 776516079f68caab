//! Integration tests for the entity model.
//!
//! These tests cover persistence, deletion, state helpers, custom
//! attributes and audit history through an in-memory transport.

mod common;

use common::{bad_response, client, entity_json, meta, query_param, FakeTransport, BASE};
use moysklad_api::clients::HttpMethod;
use moysklad_api::rest::{Entity, FieldValue, Record, ResourceError};
use serde_json::{json, Value};

fn order() -> Entity {
    Entity::from_json(json!({
        "meta": meta("customerorder", "o-1"),
        "id": "o-1",
        "name": "00001",
        "description": "initial"
    }))
    .unwrap()
}

fn metadata_response() -> Value {
    json!({
        "meta": {
            "href": format!("{BASE}/entity/customerorder/metadata"),
            "type": "embeddedentitymetadata"
        },
        "states": [
            {"meta": meta("state", "s-new"), "name": "New", "color": 15_106_326},
            {"meta": meta("state", "s-shipped"), "name": "Shipped", "color": 40_931}
        ]
    })
}

fn attribute_definitions() -> Value {
    json!({
        "meta": {"size": 2},
        "rows": [
            {
                "meta": {
                    "href": format!("{BASE}/entity/product/metadata/attributes/a-color"),
                    "type": "attributemetadata"
                },
                "id": "a-color",
                "name": "color",
                "type": "string",
                "required": false
            },
            {
                "meta": {
                    "href": format!("{BASE}/entity/product/metadata/attributes/a-size"),
                    "type": "attributemetadata"
                },
                "id": "a-size",
                "name": "size",
                "type": "long",
                "required": false
            }
        ]
    })
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_save_without_changes_is_a_no_op() {
    let client = client(FakeTransport::offline());
    let mut entity = order();

    assert!(!entity.save(&client).await.unwrap());
    assert_eq!(client.transport().request_count(), 0);
}

#[tokio::test]
async fn test_save_sends_only_changed_fields_with_meta() {
    let client = client(FakeTransport::new(|r| {
        let mut response = entity_json("customerorder", "o-1");
        response["description"] = r.body.as_ref().unwrap()["description"].clone();
        response["updated"] = json!("2024-05-01 10:00:00.000");
        Ok(response)
    }));
    let mut entity = order();

    entity.set("description", "first").unwrap();
    entity.set("description", "second").unwrap();
    assert!(entity.save(&client).await.unwrap());

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Put);
    assert_eq!(requests[0].url, format!("{BASE}/entity/customerorder/o-1"));
    assert_eq!(
        requests[0].body,
        Some(json!({"description": "second", "meta": meta("customerorder", "o-1")}))
    );

    assert!(!entity.is_dirty());
    assert_eq!(entity.get("description").unwrap().as_str(), Some("second"));
    assert_eq!(
        entity.get("updated").unwrap().as_str(),
        Some("2024-05-01 10:00:00.000")
    );
}

#[tokio::test]
async fn test_save_creates_placeholder_with_post() {
    let client = client(FakeTransport::new(|_| Ok(entity_json("product", "p-new"))));
    let mut product = client.create_entity("product");

    product.set("name", "Widget").unwrap();
    product
        .set("supplier", client.create_link("counterparty", "c-1", false))
        .unwrap();
    assert!(product.save(&client).await.unwrap());

    let requests = client.transport().requests();
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, format!("{BASE}/entity/product"));
    assert_eq!(
        requests[0].body,
        Some(json!({
            "name": "Widget",
            "supplier": {"meta": meta("counterparty", "c-1")}
        }))
    );

    assert!(product.is_hydrated());
    assert_eq!(product.id().unwrap(), "p-new");
    assert!(!product.is_dirty());
}

#[tokio::test]
async fn test_required_fields_are_always_sent() {
    let client = client(FakeTransport::new(|_| Ok(entity_json("customerorder", "o-1"))));
    let mut entity = order();
    entity.require("name");

    assert!(entity.save(&client).await.unwrap());
    assert_eq!(
        client.transport().requests()[0].body,
        Some(json!({"name": "00001", "meta": meta("customerorder", "o-1")}))
    );
}

#[tokio::test]
async fn test_missing_required_field_fails_before_any_request() {
    let client = client(FakeTransport::offline());
    let mut product = client.create_entity("product");
    product.require("name");
    product.set("code", "W-1").unwrap();

    let err = product.save(&client).await.unwrap_err();
    assert!(matches!(err, ResourceError::Validation { .. }));
}

#[tokio::test]
async fn test_rejected_save_keeps_changes() {
    let client = client(FakeTransport::new(|_| {
        Err(bad_response(
            412,
            &["Field 'name' is required", "Unknown field 'colour'"],
        ))
    }));
    let mut entity = order();
    entity.set("colour", "red").unwrap();

    let err = entity.save(&client).await.unwrap_err();
    assert!(err.is_bad_response());
    assert_eq!(
        err.to_string(),
        "Field 'name' is required; Unknown field 'colour'"
    );
    assert!(entity.dirty_fields().contains("colour"));
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_remove_deletes_href() {
    let client = client(FakeTransport::new(|_| Ok(Value::Null)));

    order().remove(&client).await.unwrap();

    let requests = client.transport().requests();
    assert_eq!(requests[0].method, HttpMethod::Delete);
    assert_eq!(requests[0].url, format!("{BASE}/entity/customerorder/o-1"));
}

#[tokio::test]
async fn test_remove_placeholder_is_not_supported() {
    let client = client(FakeTransport::offline());

    let err = Entity::new("product").remove(&client).await.unwrap_err();
    assert!(matches!(err, ResourceError::NotSupported { .. }));
}

// ============================================================================
// States
// ============================================================================

#[tokio::test]
async fn test_set_state_assigns_state_and_memoizes_metadata() {
    let client = client(FakeTransport::new(|r| {
        assert_eq!(r.url, format!("{BASE}/entity/customerorder/metadata"));
        Ok(metadata_response())
    }));
    let mut entity = order();

    let states = entity.get_states(&client, &[]).await.unwrap();
    assert_eq!(states.len(), 2);

    entity.set_state(&client, "Shipped", "name").await.unwrap();

    let state = entity.get("state").unwrap();
    assert_eq!(state.as_entity().unwrap().id().unwrap(), "s-shipped");
    assert!(entity.dirty_fields().contains("state"));
    assert_eq!(client.transport().request_count(), 1);
}

#[tokio::test]
async fn test_unknown_state_is_not_found() {
    let client = client(FakeTransport::new(|_| Ok(metadata_response())));

    let err = order()
        .get_state(&client, "Archived", "name")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::NotFound { kind: "state", .. }));
}

#[tokio::test]
async fn test_type_without_states_is_not_found() {
    let client = client(FakeTransport::new(|_| {
        Ok(json!({"meta": {"href": format!("{BASE}/entity/product/metadata"), "type": "embeddedentitymetadata"}}))
    }));

    let err = Entity::new("product")
        .get_states(&client, &[])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Custom Attributes
// ============================================================================

#[tokio::test]
async fn test_set_additional_field_appends_definition_once() {
    let client = client(FakeTransport::new(|r| {
        assert!(r.url.starts_with(&format!("{BASE}/entity/product/metadata/attributes?")));
        Ok(attribute_definitions())
    }));
    let mut product = Entity::from_json(entity_json("product", "p-1")).unwrap();

    product
        .set_additional_field(&client, "color", "red")
        .await
        .unwrap();
    product
        .set_additional_field(&client, "color", "red")
        .await
        .unwrap();

    let attributes = product.additional_fields();
    assert_eq!(attributes.len(), 1);
    assert_eq!(
        attributes[0].field("value").and_then(FieldValue::as_str),
        Some("red")
    );
    assert_eq!(
        attributes[0].field("id").and_then(FieldValue::as_str),
        Some("a-color")
    );
    assert_eq!(
        product.dirty_fields().iter().collect::<Vec<_>>(),
        vec!["attributes"]
    );
    assert_eq!(client.transport().request_count(), 1);
}

#[tokio::test]
async fn test_additional_field_reads_existing_then_definitions() {
    let client = client(FakeTransport::new(|_| Ok(attribute_definitions())));
    let product = Entity::from_json(json!({
        "meta": meta("product", "p-1"),
        "attributes": [{
            "meta": {
                "href": format!("{BASE}/entity/product/metadata/attributes/a-color"),
                "type": "attributemetadata"
            },
            "name": "color",
            "value": "blue"
        }]
    }))
    .unwrap();

    let color = product.additional_field(&client, "color").await.unwrap();
    assert_eq!(color.field("value").and_then(FieldValue::as_str), Some("blue"));
    assert_eq!(client.transport().request_count(), 0);

    let size = product.additional_field(&client, "size").await.unwrap();
    assert!(size.field("value").unwrap().is_null());

    let err = product
        .additional_field(&client, "weight")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::NotFound { kind: "additional field", .. }));
}

#[tokio::test]
async fn test_set_additional_field_overwrites_in_place() {
    let client = client(FakeTransport::offline());
    let mut product = Entity::from_json(json!({
        "meta": meta("product", "p-1"),
        "attributes": [{
            "meta": {
                "href": format!("{BASE}/entity/product/metadata/attributes/a-size"),
                "type": "attributemetadata"
            },
            "name": "size",
            "value": 40
        }]
    }))
    .unwrap();

    product
        .set_additional_field(&client, "size", 42)
        .await
        .unwrap();

    assert_eq!(product.additional_fields().len(), 1);
    assert_eq!(product.filter_value("size"), Some(json!(42)));
}

// ============================================================================
// Audit History
// ============================================================================

#[tokio::test]
async fn test_events_use_events_page_cap() {
    let client = client(FakeTransport::new(|r| {
        let limit = query_param(&r.url, "limit");
        let offset = query_param(&r.url, "offset");
        let rows: Vec<Value> = (offset..250.min(offset + limit))
            .map(|i| json!({"eventType": "update", "moment": i}))
            .collect();
        Ok(json!({"meta": {"size": 250}, "rows": rows}))
    }));

    let events = order().get_events(&client, None, None).await.unwrap();

    assert_eq!(events.len(), 250);
    let urls: Vec<String> = client.transport().requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{BASE}/entity/customerorder/o-1/audit?limit=100&offset=0"),
            format!("{BASE}/entity/customerorder/o-1/audit?limit=100&offset=100"),
            format!("{BASE}/entity/customerorder/o-1/audit?limit=50&offset=200"),
        ]
    );
}

#[tokio::test]
async fn test_events_of_placeholder_are_not_supported() {
    let client = client(FakeTransport::offline());

    let err = Entity::new("product")
        .get_events(&client, Some(10), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::NotSupported { .. }));
}

#[tokio::test]
async fn test_audit_event_lookup() {
    let audit = format!("{BASE}/audit/a-1");
    let client = client(FakeTransport::new(|_| {
        Ok(json!({
            "rows": [
                {"eventType": "create", "entityType": "customerorder", "uid": "admin@test"},
                {"eventType": "update", "entityType": "customerorder", "uid": "admin@test"},
                {"eventType": "update", "entityType": "customerorder", "uid": "clerk@test"}
            ]
        }))
    }));

    let event = client
        .get_audit_event(&audit, "CustomerOrder", "CREATE", None)
        .await
        .unwrap();
    assert_eq!(event.field("eventType").and_then(FieldValue::as_str), Some("create"));
    assert_eq!(client.transport().requests()[0].url, format!("{audit}/events"));

    let event = client
        .get_audit_event(&audit, "customerorder", "update", Some("clerk@test"))
        .await
        .unwrap();
    assert_eq!(event.field("uid").and_then(FieldValue::as_str), Some("clerk@test"));

    let err = client
        .get_audit_event(&audit, "customerorder", "update", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Validation { .. }));

    let err = client
        .get_audit_event(&audit, "customerorder", "delete", None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_metadata_is_fetched_once_per_type() {
    let client = client(FakeTransport::new(|r| {
        let entity_type = r.url.trim_end_matches("/metadata").rsplit('/').next().unwrap().to_string();
        Ok(json!({
            "meta": {"href": r.url, "type": "embeddedentitymetadata"},
            "createShared": entity_type == "product"
        }))
    }));

    let product = client.get_metadata("product").await.unwrap();
    client.get_metadata("product").await.unwrap();
    let order = client.get_metadata("customerorder").await.unwrap();

    assert_eq!(product.get("createShared").unwrap().as_bool(), Some(true));
    assert_eq!(order.get("createShared").unwrap().as_bool(), Some(false));
    assert_eq!(client.transport().request_count(), 2);
}
