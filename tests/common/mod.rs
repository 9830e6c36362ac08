#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    auth::{AuthService, Role},
    config::{AppConfig, RazorpayConfig},
    db,
    entities::{admin_user, customer, order, product, product_variant},
    events::{self, EventSender},
    gateway::RazorpayGateway,
    services::AppServices,
    AppState,
};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const TEST_GATEWAY_SECRET: &str = "rzp_test_secret";

/// Test harness: a real application state over a private in-memory SQLite
/// database, with the full route tree mounted.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// App with the default (unreachable) gateway endpoint. Fine for every
    /// flow that stops before an outbound gateway call.
    pub async fn new() -> Self {
        Self::with_razorpay(RazorpayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: TEST_GATEWAY_SECRET.to_string(),
            api_base: "http://127.0.0.1:1".to_string(),
        })
        .await
    }

    /// App whose gateway adapter points at the given base URL (a wiremock
    /// server in payment tests).
    pub async fn with_razorpay(razorpay: RazorpayConfig) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.razorpay = razorpay;
        // A single pooled connection keeps the in-memory database alive and
        // shared for the whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(cfg.jwt_secret.clone(), cfg.jwt_expiration));
        let gateway = Arc::new(RazorpayGateway::new(cfg.razorpay.clone()));
        let services = AppServices::new(db_arc.clone(), event_sender.clone(), auth, gateway);

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .merge(storefront_api::api_routes())
            .with_state(state.clone());

        Self { state, router }
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            stock: Set(stock),
            category: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_variant(
        &self,
        product_id: Uuid,
        size: &str,
        price: Decimal,
        stock: i32,
    ) -> product_variant::Model {
        let now = Utc::now();
        product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            size: Set(Some(size.to_string())),
            color: Set(None),
            price: Set(price),
            stock: Set(stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed variant")
    }

    /// Registers a customer row directly and returns it with a valid token.
    pub async fn seed_customer(&self, name: &str, email: &str) -> (customer::Model, String) {
        let now = Utc::now();
        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            phone: Set(None),
            password_hash: Set("unused".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed customer");

        let token = self
            .state
            .services
            .auth
            .issue_token(model.id, &model.name, &model.email, Role::Customer)
            .expect("issue customer token");
        (model, token)
    }

    pub async fn seed_admin(&self, name: &str, email: &str) -> (admin_user::Model, String) {
        let model = admin_user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set("unused".to_string()),
            role: Set("admin".to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed admin");

        let token = self
            .state
            .services
            .auth
            .issue_token(model.id, &model.name, &model.email, Role::Admin)
            .expect("issue admin token");
        (model, token)
    }

    pub async fn reload_product(&self, id: Uuid) -> product::Model {
        product::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query product")
            .expect("product exists")
    }

    pub async fn reload_variant(&self, id: Uuid) -> product_variant::Model {
        product_variant::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query variant")
            .expect("variant exists")
    }

    pub async fn reload_order(&self, id: Uuid) -> order::Model {
        order::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query order")
            .expect("order exists")
    }

    /// Sends a request through the router and returns (status, parsed body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse body")
        };
        (status, value)
    }
}

/// Computes the gateway callback signature the way the gateway does, for
/// forging valid (or deliberately invalid) callbacks in tests.
pub fn gateway_signature(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}|{}", gateway_order_id, gateway_payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
