mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use storefront_api::{
    entities::{order, order_item},
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderItemRequest},
};

use common::TestApp;

fn guest_request(items: Vec<OrderItemRequest>) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: None,
        address_id: None,
        items,
        guest_name: Some("Jane".to_string()),
        guest_email: Some("jane@x.com".to_string()),
        guest_phone: None,
    }
}

#[tokio::test]
async fn total_is_computed_from_catalog_prices_not_client_prices() {
    let app = TestApp::new().await;
    let product = app.seed_product("sku-1", dec!(199.99), 10).await;

    // Client claims the unit price is 999; the catalog price must win.
    let created = app
        .state
        .services
        .orders
        .create_order(guest_request(vec![OrderItemRequest {
            product_id: Some(product.id),
            variant_id: None,
            quantity: 2,
            price: dec!(999),
        }]))
        .await
        .expect("order should be created");

    assert_eq!(created.total, dec!(399.98));
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].price, dec!(199.99));

    let persisted = app.reload_order(created.id).await;
    assert_eq!(persisted.total, dec!(399.98));
}

#[tokio::test]
async fn order_creation_decrements_stock() {
    let app = TestApp::new().await;
    let product = app.seed_product("sku-1", dec!(50.00), 5).await;

    app.state
        .services
        .orders
        .create_order(guest_request(vec![OrderItemRequest {
            product_id: Some(product.id),
            variant_id: None,
            quantity: 3,
            price: dec!(50.00),
        }]))
        .await
        .expect("order should be created");

    assert_eq!(app.reload_product(product.id).await.stock, 2);

    // A second order for more than the remaining stock must fail and leave
    // the count untouched.
    let err = app
        .state
        .services
        .orders
        .create_order(guest_request(vec![OrderItemRequest {
            product_id: Some(product.id),
            variant_id: None,
            quantity: 3,
            price: dec!(50.00),
        }]))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientStock(ref target) if target.contains(&product.id.to_string()));
    assert_eq!(app.reload_product(product.id).await.stock, 2);
}

#[tokio::test]
async fn failed_order_leaves_no_partial_state() {
    let app = TestApp::new().await;
    let in_stock = app.seed_product("sku-ok", dec!(10.00), 10).await;
    let scarce = app.seed_product("sku-scarce", dec!(20.00), 1).await;

    let err = app
        .state
        .services
        .orders
        .create_order(guest_request(vec![
            OrderItemRequest {
                product_id: Some(in_stock.id),
                variant_id: None,
                quantity: 2,
                price: dec!(10.00),
            },
            OrderItemRequest {
                product_id: Some(scarce.id),
                variant_id: None,
                quantity: 5,
                price: dec!(20.00),
            },
        ]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // No order, no items, no decrement on the line that would have passed.
    assert_eq!(
        order::Entity::find().count(&*app.state.db).await.unwrap(),
        0
    );
    assert_eq!(
        order_item::Entity::find()
            .count(&*app.state.db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(app.reload_product(in_stock.id).await.stock, 10);
    assert_eq!(app.reload_product(scarce.id).await.stock, 1);
}

#[tokio::test]
async fn variant_price_is_authoritative_and_both_stocks_decrement() {
    let app = TestApp::new().await;
    let product = app.seed_product("tee", dec!(100.00), 10).await;
    let variant = app.seed_variant(product.id, "XL", dec!(120.00), 4).await;

    let created = app
        .state
        .services
        .orders
        .create_order(guest_request(vec![OrderItemRequest {
            product_id: Some(product.id),
            variant_id: Some(variant.id),
            quantity: 2,
            price: dec!(1.00),
        }]))
        .await
        .expect("order should be created");

    assert_eq!(created.total, dec!(240.00));
    assert_eq!(app.reload_product(product.id).await.stock, 8);
    assert_eq!(app.reload_variant(variant.id).await.stock, 2);
}

#[tokio::test]
async fn free_form_line_keeps_client_price() {
    let app = TestApp::new().await;

    let created = app
        .state
        .services
        .orders
        .create_order(guest_request(vec![OrderItemRequest {
            product_id: None,
            variant_id: None,
            quantity: 3,
            price: dec!(15.50),
        }]))
        .await
        .expect("order should be created");

    assert_eq!(created.total, dec!(46.50));
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .orders
        .create_order(guest_request(vec![OrderItemRequest {
            product_id: Some(uuid::Uuid::new_v4()),
            variant_id: None,
            quantity: 1,
            price: dec!(1.00),
        }]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn ordering_party_must_be_customer_xor_guest() {
    let app = TestApp::new().await;
    let product = app.seed_product("sku-1", dec!(10.00), 10).await;
    let (customer, _) = app.seed_customer("Alice", "alice@example.com").await;

    let items = vec![OrderItemRequest {
        product_id: Some(product.id),
        variant_id: None,
        quantity: 1,
        price: dec!(10.00),
    }];

    // Both populated.
    let mut both = guest_request(items.clone());
    both.customer_id = Some(customer.id);
    let err = app
        .state
        .services
        .orders
        .create_order(both)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Neither populated.
    let neither = CreateOrderRequest {
        customer_id: None,
        address_id: None,
        items: items.clone(),
        guest_name: None,
        guest_email: None,
        guest_phone: None,
    };
    let err = app
        .state
        .services
        .orders
        .create_order(neither)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Guest name without email is incomplete.
    let incomplete = CreateOrderRequest {
        guest_email: None,
        ..guest_request(items)
    };
    let err = app
        .state
        .services
        .orders
        .create_order(incomplete)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Nothing was written along the way.
    assert_eq!(
        order::Entity::find().count(&*app.state.db).await.unwrap(),
        0
    );
    assert_eq!(app.reload_product(product.id).await.stock, 10);
}

#[tokio::test]
async fn empty_item_list_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .orders
        .create_order(guest_request(vec![]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationFailed(_));
}

#[tokio::test]
async fn created_order_reads_back_identically() {
    let app = TestApp::new().await;
    let product = app.seed_product("sku-1", dec!(25.00), 10).await;
    let (customer, _) = app.seed_customer("Alice", "alice@example.com").await;

    let mut request = guest_request(vec![OrderItemRequest {
        product_id: Some(product.id),
        variant_id: None,
        quantity: 2,
        price: dec!(25.00),
    }]);
    request.customer_id = Some(customer.id);
    request.guest_name = None;
    request.guest_email = None;

    let created = app
        .state
        .services
        .orders
        .create_order(request)
        .await
        .expect("order should be created");

    // An immediate read must observe the committed order in PENDING/PENDING.
    let read_back = app
        .state
        .services
        .orders
        .get_order_for_customer(created.id, customer.id)
        .await
        .expect("owner read");

    assert_eq!(read_back.id, created.id);
    assert_eq!(read_back.total, created.total);
    assert_eq!(read_back.status, created.status);
    assert_eq!(read_back.payment_status, created.payment_status);
    assert_eq!(read_back.items.len(), 1);
    assert_eq!(
        read_back.items[0].product.as_ref().map(|p| p.name.clone()),
        Some("sku-1".to_string())
    );
}
