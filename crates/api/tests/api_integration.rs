//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let store = InMemoryStore::new();
    let state = api::create_default_state(store);
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user and logs them in, returning the access token.
async fn register_and_login(app: &Router, username: &str, email: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_bike(app: &Router, token: &str, price_cents: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/products",
        Some(token),
        Some(json!({
            "title": "Bike",
            "description": "A sturdy city bike",
            "price": price_cents,
            "category": "sports",
            "condition": "good",
            "location": "Portland, OR",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_endpoint_responds() {
    let app = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_registration_and_me() {
    let app = setup();
    let token = register_and_login(&app, "alice", "a@x.com").await;

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["is_verified"], false);
    assert!(body.get("password_hash").is_none());

    let (status, _) = send(&app, "GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = setup();
    register_and_login(&app, "alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "different@x.com",
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User with this email or username already exists");
}

#[tokio::test]
async fn test_registration_validation() {
    let app = setup();

    for payload in [
        json!({ "username": "ab", "email": "a@x.com", "password": "secret123" }),
        json!({ "username": "alice", "email": "not-an-email", "password": "secret123" }),
        json!({ "username": "alice", "email": "a@x.com", "password": "short" }),
    ] {
        let (status, _) = send(&app, "POST", "/api/v1/auth/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_login_failures_share_one_shape() {
    let app = setup();
    register_and_login(&app, "alice", "a@x.com").await;

    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "not-the-password" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ghost@x.com", "password": "secret123" })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, unknown_status);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_order_flow_with_enriched_views() {
    let app = setup();
    let alice_token = register_and_login(&app, "alice", "a@x.com").await;
    let bob_token = register_and_login(&app, "bob", "b@x.com").await;

    let bike_id = create_bike(&app, &alice_token, 10_000).await;

    // Bob orders two.
    let (status, order) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(&bob_token),
        Some(json!({
            "product_id": bike_id,
            "quantity": 2,
            "shipping_address": "12 Main St",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total_price"], 20_000);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["buyer_info"]["username"], "bob");
    assert_eq!(order["seller_info"]["username"], "alice");
    assert_eq!(order["product_info"]["title"], "Bike");

    // Alice cannot buy her own bike.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(&alice_token),
        Some(json!({
            "product_id": bike_id,
            "quantity": 1,
            "shipping_address": "1 Elm St",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot buy your own product");

    // Bob sees the order among his purchases, alice among her sales.
    let order_id = order["id"].as_str().unwrap();
    let (_, purchases) = send(&app, "GET", "/api/v1/orders", Some(&bob_token), None).await;
    assert_eq!(purchases.as_array().unwrap().len(), 1);
    assert_eq!(purchases[0]["id"], order_id);

    let (_, sales) = send(&app, "GET", "/api/v1/orders/sales", Some(&alice_token), None).await;
    assert_eq!(sales.as_array().unwrap().len(), 1);

    let (_, bobs_sales) = send(&app, "GET", "/api/v1/orders/sales", Some(&bob_token), None).await;
    assert!(bobs_sales.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_inactive_product_cannot_be_ordered() {
    let app = setup();
    let alice_token = register_and_login(&app, "alice", "a@x.com").await;
    let bob_token = register_and_login(&app, "bob", "b@x.com").await;
    let bike_id = create_bike(&app, &alice_token, 10_000).await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/products/{bike_id}"),
        Some(&alice_token),
        Some(json!({ "status": "inactive" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(&bob_token),
        Some(json!({
            "product_id": bike_id,
            "quantity": 1,
            "shipping_address": "12 Main St",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Product is not available for purchase");
}

#[tokio::test]
async fn test_product_read_counts_views_after_the_response() {
    let app = setup();
    let alice_token = register_and_login(&app, "alice", "a@x.com").await;
    let bike_id = create_bike(&app, &alice_token, 10_000).await;
    let uri = format!("/api/v1/products/{bike_id}");

    let (_, first) = send(&app, "GET", &uri, None, None).await;
    let (_, second) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(first["views"], 0);
    assert_eq!(second["views"], 1);
    assert_eq!(first["seller_info"]["username"], "alice");
}

#[tokio::test]
async fn test_owner_mismatch_reads_as_not_found() {
    let app = setup();
    let alice_token = register_and_login(&app, "alice", "a@x.com").await;
    let mallory_token = register_and_login(&app, "mallory", "m@x.com").await;
    let bike_id = create_bike(&app, &alice_token, 10_000).await;

    let patch = json!({ "title": "Hijacked" });
    let (non_owner_status, non_owner_body) = send(
        &app,
        "PUT",
        &format!("/api/v1/products/{bike_id}"),
        Some(&mallory_token),
        Some(patch.clone()),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        "PUT",
        &format!("/api/v1/products/{}", uuid::Uuid::new_v4()),
        Some(&alice_token),
        Some(patch),
    )
    .await;

    // Wrong owner and unknown id are the same failure on the wire.
    assert_eq!(non_owner_status, StatusCode::NOT_FOUND);
    assert_eq!(non_owner_status, unknown_status);
    assert_eq!(non_owner_body, unknown_body);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/products/{bike_id}"),
        Some(&mallory_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_visibility_and_seller_updates() {
    let app = setup();
    let alice_token = register_and_login(&app, "alice", "a@x.com").await;
    let bob_token = register_and_login(&app, "bob", "b@x.com").await;
    let carol_token = register_and_login(&app, "carol", "c@x.com").await;
    let bike_id = create_bike(&app, &alice_token, 10_000).await;

    let (_, order) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(&bob_token),
        Some(json!({
            "product_id": bike_id,
            "quantity": 1,
            "shipping_address": "12 Main St",
        })),
    )
    .await;
    let order_uri = format!("/api/v1/orders/{}", order["id"].as_str().unwrap());

    // An uninvolved user cannot view the order.
    let (status, _) = send(&app, "GET", &order_uri, Some(&carol_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Both parties can.
    let (status, _) = send(&app, "GET", &order_uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &order_uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // The buyer cannot update the order.
    let patch = json!({ "status": "confirmed", "seller_notes": "ships friday" });
    let (status, _) = send(&app, "PUT", &order_uri, Some(&bob_token), Some(patch.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The seller can.
    let (status, updated) = send(&app, "PUT", &order_uri, Some(&alice_token), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "confirmed");
    assert_eq!(updated["seller_notes"], "ships friday");
}

#[tokio::test]
async fn test_product_filters_and_pagination_bounds() {
    let app = setup();
    let alice_token = register_and_login(&app, "alice", "a@x.com").await;
    create_bike(&app, &alice_token, 10_000).await;

    let (status, found) = send(
        &app,
        "GET",
        "/api/v1/products?category=sports&search=bike&min_price=5000&max_price=15000&location=portland",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, found) = send(&app, "GET", "/api/v1/products?category=books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(found.as_array().unwrap().is_empty());

    for uri in [
        "/api/v1/products?limit=0",
        "/api/v1/products?limit=101",
        "/api/v1/products?skip=-1",
    ] {
        let (status, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} should be rejected");
    }
}

#[tokio::test]
async fn test_profile_update_with_explicit_null() {
    let app = setup();
    let token = register_and_login(&app, "alice", "a@x.com").await;

    let (status, updated) = send(
        &app,
        "PUT",
        "/api/v1/users/profile",
        Some(&token),
        Some(json!({ "full_name": "Alice Anderson", "phone": "555-0100" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["full_name"], "Alice Anderson");

    let (status, cleared) = send(
        &app,
        "PUT",
        "/api/v1/users/profile",
        Some(&token),
        Some(json!({ "phone": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["phone"], Value::Null);
    assert_eq!(cleared["full_name"], "Alice Anderson");

    // Public profile lookup by id.
    let (_, me) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    let user_uri = format!("/api/v1/users/{}", me["id"].as_str().unwrap());
    let (status, public) = send(&app, "GET", &user_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["username"], "alice");
}

#[tokio::test]
async fn test_my_products_requires_auth_and_lists_all_statuses() {
    let app = setup();
    let token = register_and_login(&app, "alice", "a@x.com").await;
    let bike_id = create_bike(&app, &token, 10_000).await;

    send(
        &app,
        "PUT",
        &format!("/api/v1/products/{bike_id}"),
        Some(&token),
        Some(json!({ "status": "draft" })),
    )
    .await;

    let (status, _) = send(&app, "GET", "/api/v1/products/my-products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, own) = send(&app, "GET", "/api/v1/products/my-products", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own.as_array().unwrap().len(), 1);
    assert_eq!(own[0]["status"], "draft");

    // Drafts are hidden from the public listing.
    let (_, public) = send(&app, "GET", "/api/v1/products", None, None).await;
    assert!(public.as_array().unwrap().is_empty());
}
