mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use storefront_api::{
    entities::address,
    errors::ServiceError,
    services::addresses::{CreateAddressRequest, UpdateAddressRequest},
};

use common::TestApp;

fn address_request(full_name: &str, is_default: bool) -> CreateAddressRequest {
    CreateAddressRequest {
        full_name: full_name.to_string(),
        phone: "9999999999".to_string(),
        line1: "1 High Street".to_string(),
        line2: None,
        city: "Pune".to_string(),
        state: "MH".to_string(),
        postal_code: "411001".to_string(),
        country: "IN".to_string(),
        is_default,
    }
}

async fn count_defaults(app: &TestApp, customer_id: uuid::Uuid) -> usize {
    address::Entity::find()
        .filter(address::Column::CustomerId.eq(customer_id))
        .filter(address::Column::IsDefault.eq(true))
        .all(&*app.state.db)
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn setting_a_new_default_clears_the_previous_one() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer("Alice", "alice@example.com").await;

    let first = app
        .state
        .services
        .addresses
        .create(Some(customer.id), address_request("Home", true))
        .await
        .unwrap();
    assert!(first.is_default);

    let second = app
        .state
        .services
        .addresses
        .create(Some(customer.id), address_request("Office", true))
        .await
        .unwrap();
    assert!(second.is_default);

    // Invariant: at most one default per customer.
    assert_eq!(count_defaults(&app, customer.id).await, 1);
    let first_reloaded = address::Entity::find_by_id(first.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!first_reloaded.is_default);
}

#[tokio::test]
async fn update_can_move_the_default_flag() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer("Alice", "alice@example.com").await;

    let first = app
        .state
        .services
        .addresses
        .create(Some(customer.id), address_request("Home", true))
        .await
        .unwrap();
    let second = app
        .state
        .services
        .addresses
        .create(Some(customer.id), address_request("Office", false))
        .await
        .unwrap();

    let updated = app
        .state
        .services
        .addresses
        .update(
            customer.id,
            second.id,
            UpdateAddressRequest {
                full_name: None,
                phone: None,
                line1: None,
                line2: None,
                city: None,
                state: None,
                postal_code: None,
                country: None,
                is_default: Some(true),
            },
        )
        .await
        .unwrap();
    assert!(updated.is_default);

    assert_eq!(count_defaults(&app, customer.id).await, 1);
    let first_reloaded = address::Entity::find_by_id(first.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!first_reloaded.is_default);
}

#[tokio::test]
async fn guest_addresses_are_anonymous_and_never_default() {
    let app = TestApp::new().await;

    let created = app
        .state
        .services
        .addresses
        .create(None, address_request("Guest", true))
        .await
        .unwrap();

    assert_eq!(created.customer_id, None);
    assert!(!created.is_default);
}

#[tokio::test]
async fn customers_cannot_touch_each_others_addresses() {
    let app = TestApp::new().await;
    let (alice, _) = app.seed_customer("Alice", "alice@example.com").await;
    let (bob, _) = app.seed_customer("Bob", "bob@example.com").await;

    let addr = app
        .state
        .services
        .addresses
        .create(Some(alice.id), address_request("Home", false))
        .await
        .unwrap();

    let err = app
        .state
        .services
        .addresses
        .delete(bob.id, addr.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .state
        .services
        .addresses
        .update(
            bob.id,
            addr.id,
            UpdateAddressRequest {
                full_name: Some("Hijacked".to_string()),
                phone: None,
                line1: None,
                line2: None,
                city: None,
                state: None,
                postal_code: None,
                country: None,
                is_default: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn address_endpoints_honor_ownership() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer("Alice", "alice@example.com").await;

    // Guest create works without a token.
    let (status, body) = app
        .request(
            Method::POST,
            "/customers/addresses",
            None,
            Some(json!({
                "fullName": "Guest",
                "phone": "9999999999",
                "line1": "1 High Street",
                "city": "Pune",
                "state": "MH",
                "postalCode": "411001",
                "country": "IN",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["customerId"], json!(null));

    // Owned create + list round-trip.
    let (status, _) = app
        .request(
            Method::POST,
            "/customers/addresses",
            Some(&token),
            Some(json!({
                "fullName": "Home",
                "phone": "9999999999",
                "line1": "1 High Street",
                "city": "Pune",
                "state": "MH",
                "postalCode": "411001",
                "country": "IN",
                "isDefault": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(Method::GET, "/customers/addresses", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["isDefault"], json!(true));

    // Listing requires auth.
    let (status, _) = app
        .request(Method::GET, "/customers/addresses", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
