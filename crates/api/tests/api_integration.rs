//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{DiscountType, Money, UserId};
use domain::LoyaltyConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{CatalogStore, InMemoryStore, Promotion, PromotionStore, Variant};
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

struct TestApp {
    app: axum::Router,
    store: InMemoryStore,
    variant: Variant,
}

/// App over a store seeded with one variant (price 240,000, stock 3)
/// and the SAVE25 promotion.
async fn setup() -> TestApp {
    let store = InMemoryStore::new();
    let variant = Variant::new("Oud Royal", "100ml EDP", Money::new(240_000), 3);
    store.upsert_variant(variant.clone()).await.unwrap();
    store
        .upsert_promotion(Promotion::new("SAVE25", DiscountType::Percentage, 25))
        .await
        .unwrap();

    let state = api::create_state(store.clone(), LoyaltyConfig::default(), "memory");
    let app = api::create_app(state, get_metrics_handle());
    TestApp {
        app,
        store,
        variant,
    }
}

fn customer(user_id: UserId) -> Option<(UserId, &'static str)> {
    Some((user_id, "customer"))
}

fn admin(user_id: UserId) -> Option<(UserId, &'static str)> {
    Some((user_id, "admin"))
}

fn request(
    method: &str,
    uri: &str,
    user: Option<(UserId, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = user {
        builder = builder
            .header("x-user-id", user_id.to_string())
            .header("x-user-role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn add_to_cart(t: &TestApp, user: UserId, quantity: i64) -> (StatusCode, Value) {
    send(
        &t.app,
        request(
            "POST",
            "/cart/items",
            customer(user),
            Some(json!({ "variantId": t.variant.id.to_string(), "quantity": quantity })),
        ),
    )
    .await
}

async fn place_order(t: &TestApp, user: UserId, promotion: Option<&str>) -> (StatusCode, Value) {
    send(
        &t.app,
        request(
            "POST",
            "/orders",
            customer(user),
            Some(json!({
                "shippingAddress": "12 Rue de la Paix, Paris",
                "phone": "0612345678",
                "promotionCode": promotion,
            })),
        ),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;

    let (status, json) = send(&t.app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"], "memory");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let t = setup().await;

    let (status, json) = send(&t.app, request("GET", "/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let bad = Request::builder()
        .uri("/cart")
        .header("x-user-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&t.app, bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_flow() {
    let t = setup().await;
    let user = UserId::new();

    let (status, cart) = send(&t.app, request("GET", "/cart", customer(user), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    assert_eq!(cart["subtotal"], 0);

    add_to_cart(&t, user, 1).await;
    let (status, cart) = add_to_cart(&t, user, 1).await;
    assert_eq!(status, StatusCode::OK);
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1, "same variant merges into one line");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["productName"], "Oud Royal");
    assert_eq!(cart["subtotal"], 480_000);

    let line_id = items[0]["lineId"].as_str().unwrap().to_string();
    let (status, cart) = send(
        &t.app,
        request(
            "PATCH",
            &format!("/cart/items/{line_id}"),
            customer(user),
            Some(json!({ "quantity": 3 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], 3);

    let (status, json) = send(
        &t.app,
        request(
            "PATCH",
            &format!("/cart/items/{line_id}"),
            customer(user),
            Some(json!({ "quantity": 0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_QUANTITY");

    let (status, cart) = send(
        &t.app,
        request(
            "DELETE",
            &format!("/cart/items/{line_id}"),
            customer(user),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    // Removing it again is a no-op.
    let (status, _) = send(
        &t.app,
        request(
            "DELETE",
            &format!("/cart/items/{line_id}"),
            customer(user),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_other_users_cart_line_is_not_found() {
    let t = setup().await;
    let owner = UserId::new();
    let intruder = UserId::new();

    let (_, cart) = add_to_cart(&t, owner, 1).await;
    let line_id = cart["items"][0]["lineId"].as_str().unwrap().to_string();

    let (status, json) = send(
        &t.app,
        request(
            "PATCH",
            &format!("/cart/items/{line_id}"),
            customer(intruder),
            Some(json!({ "quantity": 2 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (_, cart) = send(&t.app, request("GET", "/cart", customer(owner), None)).await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_create_order_with_promotion() {
    let t = setup().await;
    let user = UserId::new();
    add_to_cart(&t, user, 1).await;

    let (status, order) = place_order(&t, user, Some("SAVE25")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["totalAmount"], 240_000);
    assert_eq!(order["discountAmount"], 60_000);
    assert_eq!(order["finalAmount"], 180_000);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["paymentStatus"], "PENDING");
    assert_eq!(order["items"][0]["variantName"], "100ml EDP");

    let variant = t.store.get_variant(t.variant.id).await.unwrap().unwrap();
    assert_eq!(variant.stock, 2);

    let (_, cart) = send(&t.app, request("GET", "/cart", customer(user), None)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let (status, orders) = send(&t.app, request("GET", "/orders", customer(user), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let id = order["id"].as_str().unwrap();
    let (status, fetched) = send(
        &t.app,
        request("GET", &format!("/orders/{id}"), customer(user), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);
}

#[tokio::test]
async fn test_insufficient_stock_is_conflict() {
    let t = setup().await;
    let user = UserId::new();
    add_to_cart(&t, user, 5).await;

    let (status, json) = place_order(&t, user, None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INSUFFICIENT_STOCK");
    assert!(json["error"].as_str().unwrap().contains("Oud Royal"));

    let variant = t.store.get_variant(t.variant.id).await.unwrap().unwrap();
    assert_eq!(variant.stock, 3);
    let (_, cart) = send(&t.app, request("GET", "/cart", customer(user), None)).await;
    assert_eq!(cart["items"][0]["quantity"], 5);
}

#[tokio::test]
async fn test_empty_cart_and_unknown_promotion() {
    let t = setup().await;
    let user = UserId::new();

    let (status, json) = place_order(&t, user, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EMPTY_CART");

    add_to_cart(&t, user, 1).await;
    let (status, json) = place_order(&t, user, Some("NOPE")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "PROMOTION_NOT_FOUND");
}

#[tokio::test]
async fn test_other_users_order_is_not_found() {
    let t = setup().await;
    let owner = UserId::new();
    add_to_cart(&t, owner, 1).await;
    let (_, order) = place_order(&t, owner, None).await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = send(
        &t.app,
        request("GET", &format!("/orders/{id}"), customer(UserId::new()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &t.app,
        request("GET", "/orders/not-a-uuid", customer(owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_cannot_use_admin_routes() {
    let t = setup().await;
    let user = UserId::new();

    let (status, json) = send(
        &t.app,
        request("GET", "/admin/orders", customer(user), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_updates_status_and_cancels_with_restock() {
    let t = setup().await;
    let customer = UserId::new();
    let admin_id = UserId::new();
    add_to_cart(&t, customer, 2).await;
    let (_, order) = place_order(&t, customer, None).await;
    let id = order["id"].as_str().unwrap().to_string();

    let (status, page) = send(
        &t.app,
        request("GET", "/admin/orders?skip=0&take=10", admin(admin_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["take"], 10);

    let status_uri = format!("/admin/orders/{id}/status");

    // Fulfilment requires payment first.
    let (status, json) = send(
        &t.app,
        request("PATCH", &status_uri, admin(admin_id), Some(json!({ "status": "FULFILLED" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_TRANSITION");

    let (status, updated) = send(
        &t.app,
        request(
            "PATCH",
            &status_uri,
            admin(admin_id),
            Some(json!({ "status": "PAID", "paymentStatus": "PAID" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "PAID");
    assert_eq!(updated["paymentStatus"], "PAID");

    let (status, cancelled) = send(
        &t.app,
        request("PATCH", &status_uri, admin(admin_id), Some(json!({ "status": "CANCELLED" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let variant = t.store.get_variant(t.variant.id).await.unwrap().unwrap();
    assert_eq!(variant.stock, 3, "cancellation returns the reserved stock");

    let (status, _) = send(
        &t.app,
        request("PATCH", &status_uri, admin(admin_id), Some(json!({ "status": "SHIPPED" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_loyalty_status_and_redeem() {
    let t = setup().await;
    let user = UserId::new();
    add_to_cart(&t, user, 1).await;
    place_order(&t, user, None).await;

    let (status, loyalty) = send(&t.app, request("GET", "/loyalty", customer(user), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loyalty["balance"], 24);
    assert_eq!(loyalty["transactions"][0]["reason"], "ORDER_EARN");

    let (status, json) = send(
        &t.app,
        request("POST", "/loyalty/redeem", customer(user), Some(json!({ "points": 100 }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "INSUFFICIENT_POINTS");
    assert!(json["error"].as_str().unwrap().contains("76 short"));

    let (status, redeemed) = send(
        &t.app,
        request("POST", "/loyalty/redeem", customer(user), Some(json!({ "points": 10 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(redeemed["pointsRedeemed"], 10);
    assert_eq!(redeemed["discountAmount"], 5_000);

    let (_, loyalty) = send(&t.app, request("GET", "/loyalty", customer(user), None)).await;
    assert_eq!(loyalty["balance"], 14);
}

#[tokio::test]
async fn test_admin_accrual_retry_is_idempotent() {
    let t = setup().await;
    let customer = UserId::new();
    let admin_id = UserId::new();
    add_to_cart(&t, customer, 1).await;
    let (_, order) = place_order(&t, customer, None).await;
    let id = order["id"].as_str().unwrap();

    let (status, json) = send(
        &t.app,
        request("POST", &format!("/admin/orders/{id}/loyalty"), admin(admin_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["credited"], false, "inline accrual already credited the order");
    assert_eq!(json["points"], 0);
}

#[tokio::test]
async fn test_promotion_validate() {
    let t = setup().await;
    let user = UserId::new();

    let (status, json) = send(
        &t.app,
        request(
            "POST",
            "/promotions/validate",
            customer(user),
            Some(json!({ "code": "SAVE25", "amount": 240_000 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["discountAmount"], 60_000);
    assert_eq!(json["discountType"], "PERCENTAGE");
    assert_eq!(json["discountValue"], 25);
    assert!(json["promotionId"].as_str().is_some());

    let (status, json) = send(
        &t.app,
        request(
            "POST",
            "/promotions/validate",
            customer(user),
            Some(json!({ "code": "MISSING", "amount": 1_000 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "PROMOTION_NOT_FOUND");
}

#[tokio::test]
async fn test_promotion_validate_large_amount() {
    let t = setup().await;
    let amount = i64::MAX / 4;

    let (status, json) = send(
        &t.app,
        request(
            "POST",
            "/promotions/validate",
            customer(UserId::new()),
            Some(json!({ "code": "SAVE25", "amount": amount })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["discountAmount"], amount / 4);
}
