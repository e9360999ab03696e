// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for function registration and invocation.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use quickcart_sync::db::Store;
use quickcart_sync::models::{UserProfile, UserRecord};
use quickcart_sync::routes::functions::RUN_OUTCOME_HEADER;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, post_json};

fn jane_doe() -> serde_json::Value {
    json!({
        "event": {
            "name": "clerk/user.created",
            "data": {
                "id": "u1",
                "first_name": "Jane",
                "last_name": "Doe",
                "email_addresses": [{ "email_address": "j@x.com" }],
                "image_url": "http://img"
            }
        }
    })
}

fn outcome(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(RUN_OUTCOME_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn test_registration_document() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/functions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["appId"], "quickcart-next");

    let ids: Vec<&str> = json["functions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        [
            "sync-user-from-clerk",
            "update-user-from-clerk",
            "delete-user-with-clerk",
            "create-user-order"
        ]
    );
    assert_eq!(
        json["functions"][3]["batchEvents"],
        json!({ "maxSize": 25, "timeout": "5s" })
    );
}

#[tokio::test]
async fn test_create_user_scenario() {
    let (app, _, db) = create_test_app();

    let response = app
        .oneshot(post_json("/api/functions/sync-user-from-clerk", &jane_doe()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(outcome(&response), "applied");

    let stored = db.get_user("u1").await.unwrap().expect("user stored");
    assert_eq!(
        serde_json::to_value(&stored).unwrap(),
        json!({
            "_id": "u1",
            "email": "j@x.com",
            "name": "Jane Doe",
            "imageUrl": "http://img",
            "cartItems": {}
        })
    );
}

#[tokio::test]
async fn test_create_duplicate_user_fails_run() {
    let (app, _, db) = create_test_app();

    let first = app
        .clone()
        .oneshot(post_json("/api/functions/sync-user-from-clerk", &jane_doe()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/api/functions/sync-user-from-clerk", &jane_doe()))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["error"], "duplicate_key");
    assert_eq!(db.user_count(), 1);
}

#[tokio::test]
async fn test_update_missing_user_is_noop() {
    let (app, _, db) = create_test_app();

    let event = json!({
        "event": {
            "name": "clerk/user.updated",
            "data": { "id": "u1", "first_name": "Jane", "last_name": "Doe" }
        }
    });
    let response = app
        .oneshot(post_json("/api/functions/update-user-from-clerk", &event))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(outcome(&response), "not_found");
    assert_eq!(db.user_count(), 0);
}

#[tokio::test]
async fn test_update_existing_user_keeps_cart() {
    let (app, _, db) = create_test_app();
    let mut user = UserRecord::new(
        "u1",
        UserProfile {
            email: Some("old@x.com".to_string()),
            name: "Old".to_string(),
            image_url: None,
        },
    );
    user.cart_items.insert("sku-1".to_string(), 4);
    db.put_user(user);

    let event = json!({
        "event": {
            "name": "clerk/user.updated",
            "data": {
                "id": "u1",
                "last_name": "Doe",
                "email_addresses": [{ "email_address": "new@x.com" }],
                "image_url": "http://new"
            }
        }
    });
    let response = app
        .oneshot(post_json("/api/functions/update-user-from-clerk", &event))
        .await
        .unwrap();

    assert_eq!(outcome(&response), "applied");
    let stored = db.get_user("u1").await.unwrap().unwrap();
    assert_eq!(stored.name, "Doe");
    assert_eq!(stored.email.as_deref(), Some("new@x.com"));
    assert_eq!(stored.image_url.as_deref(), Some("http://new"));
    assert_eq!(stored.cart_items.get("sku-1"), Some(&4));
}

#[tokio::test]
async fn test_delete_missing_user_is_noop() {
    let (app, _, db) = create_test_app();

    let event = json!({ "event": { "name": "clerk/user.deleted", "data": { "id": "ghost" } } });
    let response = app
        .oneshot(post_json("/api/functions/delete-user-with-clerk", &event))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(outcome(&response), "not_found");
    assert_eq!(db.user_count(), 0);
}

#[tokio::test]
async fn test_missing_data_is_acknowledged_without_mutation() {
    let (app, _, db) = create_test_app();
    db.put_user(UserRecord::new(
        "u1",
        UserProfile {
            email: None,
            name: "Keep".to_string(),
            image_url: None,
        },
    ));

    for (function, name) in [
        ("sync-user-from-clerk", "clerk/user.created"),
        ("update-user-from-clerk", "clerk/user.updated"),
        ("delete-user-with-clerk", "clerk/user.deleted"),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/functions/{}", function),
                &json!({ "event": { "name": name } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{}", function);
        assert_eq!(outcome(&response), "skipped", "{}", function);
    }

    // A body that is not an invocation at all is acknowledged the same way
    let response = app
        .oneshot(post_json(
            "/api/functions/delete-user-with-clerk",
            &json!(["not", "an", "invocation"]),
        ))
        .await
        .unwrap();
    assert_eq!(outcome(&response), "skipped");

    assert_eq!(db.user_count(), 1);
    assert_eq!(db.get_user("u1").await.unwrap().unwrap().name, "Keep");
}

#[tokio::test]
async fn test_order_batch_of_three() {
    let (app, _, db) = create_test_app();

    let events: Vec<serde_json::Value> = (1..=3)
        .map(|i| {
            json!({
                "name": "order/created",
                "data": {
                    "userId": "u1",
                    "items": [{ "product": format!("p{}", i), "quantity": i }],
                    "amount": 10.0 * i as f64,
                    "address": { "line1": "1 Main St" },
                    "date": 1700000000000_i64 + i
                }
            })
        })
        .collect();

    let response = app
        .oneshot(post_json(
            "/api/functions/create-user-order",
            &json!({ "events": events }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "processed": 3 })
    );
    assert_eq!(db.bulk_insert_calls(), 1);

    let orders = db.get_orders_for_user("u1").await.unwrap();
    assert_eq!(orders.len(), 3);
    assert!(orders.iter().any(|o| o.amount() == Some(20.0)));
}

#[tokio::test]
async fn test_order_batch_storage_failure() {
    let (app, _, db) = create_test_app();
    db.set_unavailable(true);

    let response = app
        .oneshot(post_json(
            "/api/functions/create-user-order",
            &json!({ "events": [
                { "name": "order/created", "data": { "userId": "u1", "amount": 1 } },
                { "name": "order/created", "data": { "userId": "u2", "amount": 2 } }
            ] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "database_error");
    assert_eq!(db.order_count(), 0);
}

#[tokio::test]
async fn test_unknown_function() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(post_json("/api/functions/send-newsletter", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}
