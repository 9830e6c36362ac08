use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{CustomerUser, MaybeCustomer};
use crate::entities::address;
use crate::errors::ServiceError;
use crate::services::addresses::{CreateAddressRequest, UpdateAddressRequest};
use crate::{ApiResponse, AppState};

/// List the authenticated customer's addresses, default first.
#[utoipa::path(
    get,
    path = "/customers/addresses",
    responses(
        (status = 200, description = "Addresses", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: CustomerUser,
) -> Result<Json<ApiResponse<Vec<address::Model>>>, ServiceError> {
    let addresses = state.services.addresses.list_for_customer(user.id).await?;
    Ok(Json(ApiResponse::success(addresses)))
}

/// Create an address. Signed-in customers own the row (and may mark it
/// default); guests create anonymous rows for checkout.
#[utoipa::path(
    post,
    path = "/customers/addresses",
    request_body = CreateAddressRequest,
    responses(
        (status = 201, description = "Address created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Addresses"
)]
pub async fn create_address(
    State(state): State<AppState>,
    MaybeCustomer(user): MaybeCustomer,
    Json(request): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<address::Model>>), ServiceError> {
    let created = state
        .services
        .addresses
        .create(user.map(|u| u.id), request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            created,
            "Address created successfully",
        )),
    ))
}

/// Update one of the authenticated customer's addresses.
#[utoipa::path(
    put,
    path = "/customers/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: CustomerUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAddressRequest>,
) -> Result<Json<ApiResponse<address::Model>>, ServiceError> {
    let updated = state.services.addresses.update(user.id, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Address updated successfully",
    )))
}

/// Delete one of the authenticated customer's addresses.
#[utoipa::path(
    delete,
    path = "/customers/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: CustomerUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.addresses.delete(user.id, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        serde_json::json!({ "id": id }),
        "Address deleted successfully",
    )))
}

/// Address book routes
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/:id", put(update_address).delete(delete_address))
}
