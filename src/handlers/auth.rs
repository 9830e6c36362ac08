use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::auth::{AdminUser, CustomerUser};
use crate::entities::{admin_user, customer};
use crate::errors::ServiceError;
use crate::services::customers::{AdminSession, CustomerSession, LoginRequest, RegisterRequest};
use crate::{ApiResponse, AppState};

/// Register a storefront customer and issue a session token.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Customer registered", body = crate::ApiResponse<CustomerSession>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerSession>>), ServiceError> {
    let session = state.services.customers.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            session,
            "Registration successful",
        )),
    ))
}

/// Customer login.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::ApiResponse<CustomerSession>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<CustomerSession>>, ServiceError> {
    let session = state.services.customers.login(request).await?;
    Ok(Json(ApiResponse::success(session)))
}

/// Current customer profile.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current customer", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: CustomerUser,
) -> Result<Json<ApiResponse<customer::Model>>, ServiceError> {
    let found = state.services.customers.get(user.id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// Back-office admin login.
#[utoipa::path(
    post,
    path = "/admin/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::ApiResponse<AdminSession>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AdminSession>>, ServiceError> {
    let session = state.services.customers.admin_login(request).await?;
    Ok(Json(ApiResponse::success(session)))
}

/// Current admin profile.
#[utoipa::path(
    get,
    path = "/admin/auth/me",
    responses(
        (status = 200, description = "Current admin", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn admin_me(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<ApiResponse<admin_user::Model>>, ServiceError> {
    let found = state.services.customers.admin_get(admin.id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// Customer auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Admin auth routes
pub fn admin_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin_login))
        .route("/me", get(admin_me))
}
