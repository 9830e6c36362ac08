use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AdminUser, CustomerUser};
use crate::entities::order::OrderStatus;
use crate::errors::ServiceError;
use crate::handlers::common::PaginationParams;
use crate::services::orders::{
    CreateOrderRequest, OrderListResponse, OrderResponse, UpdateOrderRequest,
};
use crate::{ApiResponse, AppState};

/// Create an order for the authenticated customer. The token identifies the
/// ordering customer; any guest fields in the body are rejected downstream.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = crate::ApiResponse<OrderResponse>),
        (status = 400, description = "Validation failed or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced product or variant missing", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: CustomerUser,
    Json(mut request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    request.customer_id = Some(user.id);

    let order = state.services.orders.create_order(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            order,
            "Order created successfully",
        )),
    ))
}

/// Create a guest order; guest name and email stand in for a customer.
#[utoipa::path(
    post,
    path = "/orders/guest",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Guest order created", body = crate::ApiResponse<OrderResponse>),
        (status = 400, description = "Validation failed or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced product or variant missing", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_guest_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    if request.customer_id.is_some() {
        return Err(ServiceError::ValidationError(
            "Guest orders cannot carry a customer id".to_string(),
        ));
    }

    let order = state.services.orders.create_order(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            order,
            "Guest order created successfully",
        )),
    ))
}

/// List the authenticated customer's orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Customer's orders", body = crate::ApiResponse<Vec<OrderResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: CustomerUser,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state
        .services
        .orders
        .list_orders_for_customer(user.id)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Fetch one of the authenticated customer's orders. Orders owned by anyone
/// else (including guest orders, which have no owner) read as not found.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail", body = crate::ApiResponse<OrderResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: CustomerUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .orders
        .get_order_for_customer(id, user.id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize, Serialize, ToSchema, utoipa::IntoParams)]
pub struct OrderStatusFilter {
    /// Filter by order status (PENDING, CONFIRMED, SHIPPED, DELIVERED, CANCELLED)
    pub status: Option<String>,
}

/// Admin: list orders with pagination and optional status filter.
#[utoipa::path(
    get,
    path = "/admin/orders",
    params(PaginationParams, OrderStatusFilter),
    responses(
        (status = 200, description = "Orders", body = crate::ApiResponse<OrderListResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<OrderStatusFilter>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    let status = match filter.status.as_deref() {
        Some(value) => Some(parse_status_filter(value)?),
        None => None,
    };

    let orders = state
        .services
        .orders
        .list_orders(params.page, params.per_page, status)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Admin: fetch any order.
#[utoipa::path(
    get,
    path = "/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail", body = crate::ApiResponse<OrderResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_get_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Admin: override order status and/or payment status. Not gated by payment
/// state; this is the manual fulfilment path.
#[utoipa::path(
    put,
    path = "/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = crate::ApiResponse<OrderResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_update_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.update_order(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        order,
        "Order updated successfully",
    )))
}

fn parse_status_filter(value: &str) -> Result<OrderStatus, ServiceError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "PENDING" => Ok(OrderStatus::Pending),
        "CONFIRMED" => Ok(OrderStatus::Confirmed),
        "SHIPPED" => Ok(OrderStatus::Shipped),
        "DELIVERED" => Ok(OrderStatus::Delivered),
        "CANCELLED" | "CANCELED" => Ok(OrderStatus::Cancelled),
        other => Err(ServiceError::ValidationError(format!(
            "invalid order status filter: {}",
            other
        ))),
    }
}

/// Customer-facing order routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/guest", post(create_guest_order))
        .route("/:id", get(get_order))
}

/// Back-office order routes
pub fn admin_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list_orders))
        .route("/:id", get(admin_get_order).put(admin_update_order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parsing() {
        assert_eq!(parse_status_filter("shipped").unwrap(), OrderStatus::Shipped);
        assert_eq!(
            parse_status_filter(" CANCELED ").unwrap(),
            OrderStatus::Cancelled
        );
        assert!(parse_status_filter("bogus").is_err());
    }
}
