mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn order_creation_requires_a_customer_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/orders",
            None,
            Some(json!({ "items": [{ "quantity": 1, "price": 10.0 }] })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn customer_order_flow_via_http() {
    let app = TestApp::new().await;
    let product = app.seed_product("sku-http", dec!(49.50), 10).await;
    let (_, token) = app.seed_customer("Alice", "alice@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/orders",
            Some(&token),
            Some(json!({
                "items": [{
                    "productId": product.id.to_string(),
                    "quantity": 2,
                    "price": 1.0,
                }],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Order created successfully"));
    let total: rust_decimal::Decimal = body["data"]["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(99.00));
    assert_eq!(body["data"]["status"], json!("PENDING"));
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Owner sees the order.
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/orders/{}", order_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(order_id));

    // A different customer gets not-found, not someone else's order.
    let (_, other_token) = app.seed_customer("Bob", "bob@example.com").await;
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/orders/{}", order_id),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Order not found"));

    // Owner's list contains exactly the one order.
    let (status, body) = app
        .request(Method::GET, "/orders", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn guest_order_via_http_requires_guest_fields() {
    let app = TestApp::new().await;
    let product = app.seed_product("sku-guest", dec!(10.00), 5).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/orders/guest",
            None,
            Some(json!({
                "items": [{ "productId": product.id.to_string(), "quantity": 1, "price": 10.0 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, body) = app
        .request(
            Method::POST,
            "/orders/guest",
            None,
            Some(json!({
                "items": [{ "productId": product.id.to_string(), "quantity": 1, "price": 10.0 }],
                "guestName": "Jane",
                "guestEmail": "jane@x.com",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["guestEmail"], json!("jane@x.com"));
    assert_eq!(body["data"]["customerId"], json!(null));
}

#[tokio::test]
async fn validation_failure_uses_field_error_envelope() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer("Alice", "alice@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/orders",
            Some(&token),
            Some(json!({
                "items": [{ "quantity": 0, "price": 10.0 }],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Validation failed"));
    let errors = body["errors"].as_array().unwrap();
    assert!(errors
        .iter()
        .any(|e| e["field"].as_str().unwrap().contains("quantity")));
}

#[tokio::test]
async fn admin_can_override_order_state() {
    let app = TestApp::new().await;
    let product = app.seed_product("sku-admin", dec!(30.00), 5).await;
    let (_, customer_token) = app.seed_customer("Alice", "alice@example.com").await;
    let (_, admin_token) = app.seed_admin("Root", "root@example.com").await;

    let (_, body) = app
        .request(
            Method::POST,
            "/orders",
            Some(&customer_token),
            Some(json!({
                "items": [{ "productId": product.id.to_string(), "quantity": 1, "price": 30.0 }],
            })),
        )
        .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Customer tokens are rejected with 403 on the admin surface.
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/admin/orders/{}", order_id),
            Some(&customer_token),
            Some(json!({ "status": "SHIPPED" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // No token at all is 401.
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/admin/orders/{}", order_id),
            None,
            Some(json!({ "status": "SHIPPED" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Admin override sets both fields, ungated by payment state.
    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/admin/orders/{}", order_id),
            Some(&admin_token),
            Some(json!({ "status": "SHIPPED", "paymentStatus": "REFUNDED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("SHIPPED"));
    assert_eq!(body["data"]["paymentStatus"], json!("REFUNDED"));

    // Admin list sees the order.
    let (status, body) = app
        .request(
            Method::GET,
            "/admin/orders?page=1&per_page=10&status=SHIPPED",
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(1));

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/admin/orders/{}", uuid::Uuid::new_v4()),
            Some(&admin_token),
            Some(json!({ "status": "SHIPPED" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_flow_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Jane",
                "email": "jane@example.com",
                "password": "secret-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(Method::GET, "/auth/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!("jane@example.com"));
    assert!(body["data"].get("password_hash").is_none());

    // Wrong password rejected.
    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": "secret-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Duplicate registration rejected.
    let (status, _) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Jane Again",
                "email": "jane@example.com",
                "password": "secret-password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
