use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::payments::{
    InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusResponse, VerifyPaymentRequest,
    VerifyPaymentResponse,
};
use crate::{ApiResponse, AppState};

/// Create a gateway payment-intent for an order. The declared amount must
/// equal the persisted order total or the request is rejected before any
/// gateway traffic.
#[utoipa::path(
    post,
    path = "/payment/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = crate::ApiResponse<InitiatePaymentResponse>),
        (status = 400, description = "Amount mismatch or validation failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn initiate_payment(
    State(state): State<AppState>,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<Json<ApiResponse<InitiatePaymentResponse>>, ServiceError> {
    let response = state.services.payments.initiate(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Reconcile the gateway's completion callback against order state. The
/// signature is verified before anything else in the payload is trusted; a
/// failed check still persists paymentStatus=FAILED.
#[utoipa::path(
    post,
    path = "/payment/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment reconciled", body = crate::ApiResponse<VerifyPaymentResponse>),
        (status = 400, description = "Signature verification failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<VerifyPaymentResponse>>, ServiceError> {
    let order = state.services.payments.verify(request).await?;
    Ok(Json(ApiResponse::success(VerifyPaymentResponse {
        order,
        message: "Payment successful".to_string(),
    })))
}

/// Payment status projection for checkout polling.
#[utoipa::path(
    get,
    path = "/payment/status/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Payment status", body = crate::ApiResponse<PaymentStatusResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentStatusResponse>>, ServiceError> {
    let status = state.services.payments.status(order_id).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// Payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(initiate_payment))
        .route("/verify", post(verify_payment))
        .route("/status/:order_id", get(payment_status))
}
