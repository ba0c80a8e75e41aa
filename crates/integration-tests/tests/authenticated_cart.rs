//! Integration tests for the authenticated cart path.
//!
//! Each test stands up an in-process stub of the backend's `/update_item/`
//! view and drives a `CartStateManager` against it over real HTTP.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing::post};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use manipi_cart::{
    CartAction, CartAggregate, CartConfig, CartError, CartStateManager, MemoryCookies,
    MutationOutcome, SessionContext,
};
use manipi_integration_tests::{RecordingSink, spawn_backend};

fn token() -> SecretString {
    SecretString::from("wq7J2mX9pL4vN8rT3kZ6bY1cD5fH0gS")
}

fn manager_for(addr: std::net::SocketAddr, sink: Arc<RecordingSink>) -> CartStateManager {
    let config = CartConfig::new(Url::parse(&format!("http://{addr}/")).unwrap());
    CartStateManager::new(
        &SessionContext::authenticated(Some(token())),
        &config,
        Arc::new(MemoryCookies::new()),
        sink,
    )
    .unwrap()
}

#[tokio::test]
async fn server_summary_replaces_displayed_aggregate_verbatim() {
    let app = Router::new().route(
        "/update_item/",
        post(|| async {
            Json(json!({
                "message": "Item updated successfully",
                "quantity": 3,
                "cartItems": 5,
                "cartTotal": 150000.0,
            }))
        }),
    );
    let addr = spawn_backend(app).await;

    let sink = Arc::new(RecordingSink::default());
    let manager = manager_for(addr, sink.clone());
    assert_eq!(manager.aggregate(), None);

    let outcome = manager.mutate(CartAction::add("42")).await.unwrap();

    let expected = CartAggregate {
        item_count: 5,
        total: Some(Decimal::from(150_000)),
    };
    assert_eq!(outcome, MutationOutcome::Applied(expected.clone()));
    assert_eq!(manager.aggregate(), Some(expected.clone()));
    assert_eq!(sink.aggregates(), vec![expected]);
    assert_eq!(sink.failure_count(), 0);
}

#[tokio::test]
async fn failed_request_leaves_aggregate_unchanged_and_notifies_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = calls.clone();
    let app = Router::new().route(
        "/update_item/",
        post(move || {
            let calls = handler_calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Json(json!({"cartItems": 1, "cartTotal": 50.0})).into_response()
                } else {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": "Product not found"})),
                    )
                        .into_response()
                }
            }
        }),
    );
    let addr = spawn_backend(app).await;

    let sink = Arc::new(RecordingSink::default());
    let manager = manager_for(addr, sink.clone());

    manager.mutate(CartAction::add("42")).await.unwrap();
    let before = manager.aggregate();

    let err = manager.mutate(CartAction::add("404")).await.unwrap_err();
    match err {
        CartError::Backend { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Product not found");
        }
        other => panic!("unexpected error: {other}"),
    }

    // Aggregate identical to its value before the failed call, and the
    // error indicator fired exactly once.
    assert_eq!(manager.aggregate(), before);
    assert_eq!(sink.failure_count(), 1);
    assert_eq!(sink.aggregates().len(), 1);
}

#[tokio::test]
async fn error_field_in_success_body_is_a_failure() {
    let app = Router::new().route(
        "/update_item/",
        post(|| async { Json(json!({"error": "User not authenticated"})) }),
    );
    let addr = spawn_backend(app).await;

    let sink = Arc::new(RecordingSink::default());
    let manager = manager_for(addr, sink.clone());

    let err = manager.mutate(CartAction::add("42")).await.unwrap_err();
    assert!(matches!(err, CartError::Backend { status: 200, .. }));
    assert_eq!(manager.aggregate(), None);
    assert_eq!(sink.failure_count(), 1);
}

#[tokio::test]
async fn stale_response_never_overwrites_newer_aggregate() {
    let app = Router::new().route(
        "/update_item/",
        post(|Json(body): Json<Value>| async move {
            if body["productId"] == "slow" {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({"cartItems": 1, "cartTotal": 10.0}))
            } else {
                Json(json!({"cartItems": 2, "cartTotal": 20.0}))
            }
        }),
    );
    let addr = spawn_backend(app).await;

    let sink = Arc::new(RecordingSink::default());
    let manager = Arc::new(manager_for(addr, sink.clone()));

    // First click: a slow request that will complete after the second.
    let slow = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.mutate(CartAction::add("slow")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Second click completes first and becomes the displayed aggregate.
    let fast = manager.mutate(CartAction::add("fast")).await.unwrap();
    let expected = CartAggregate {
        item_count: 2,
        total: Some(Decimal::from(20)),
    };
    assert_eq!(fast, MutationOutcome::Applied(expected.clone()));

    // The slow response arrives afterwards and is discarded.
    let slow_outcome = slow.await.unwrap().unwrap();
    assert_eq!(slow_outcome, MutationOutcome::Superseded);

    assert_eq!(manager.aggregate(), Some(expected.clone()));
    assert_eq!(sink.aggregates(), vec![expected]);
}

#[tokio::test]
async fn request_carries_csrf_header_and_wire_payload() {
    type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let handler_seen = seen.clone();
    let app = Router::new().route(
        "/update_item/",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let seen = handler_seen.clone();
            async move {
                let csrf = headers
                    .get("X-CSRFToken")
                    .and_then(|value| value.to_str().ok())
                    .map(ToOwned::to_owned);
                seen.lock().unwrap().push((csrf, body));
                Json(json!({"cartItems": 1}))
            }
        }),
    );
    let addr = spawn_backend(app).await;

    let sink = Arc::new(RecordingSink::default());
    let manager = manager_for(addr, sink);

    manager
        .mutate(CartAction::add_variant("42", "7"))
        .await
        .unwrap();

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (csrf, body) = requests.first().unwrap();
    assert_eq!(
        csrf.as_deref(),
        Some("wq7J2mX9pL4vN8rT3kZ6bY1cD5fH0gS")
    );
    assert_eq!(
        body,
        &json!({"productId": "42", "action": "add", "variantId": "7"})
    );
}

#[tokio::test]
async fn contract_violation_sends_no_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = calls.clone();
    let app = Router::new().route(
        "/update_item/",
        post(move || {
            let calls = handler_calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Json(json!({"cartItems": 1}))
            }
        }),
    );
    let addr = spawn_backend(app).await;

    let sink = Arc::new(RecordingSink::default());
    let manager = manager_for(addr, sink.clone());

    let err = manager.mutate(CartAction::add("")).await.unwrap_err();
    assert!(matches!(err, CartError::ContractViolation(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(sink.failure_count(), 0);
    assert_eq!(sink.aggregates().len(), 0);
}
