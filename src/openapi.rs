use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "Storefront ordering and payment reconciliation API"
    ),
    modifiers(&BearerAuth),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::create_guest_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::admin_list_orders,
        crate::handlers::orders::admin_get_order,
        crate::handlers::orders::admin_update_order,
        crate::handlers::payments::initiate_payment,
        crate::handlers::payments::verify_payment,
        crate::handlers::payments::payment_status,
        crate::handlers::addresses::list_addresses,
        crate::handlers::addresses::create_address,
        crate::handlers::addresses::update_address,
        crate::handlers::addresses::delete_address,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::admin_login,
        crate::handlers::auth::admin_me,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::errors::FieldError,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::OrderItemRequest,
        crate::services::orders::UpdateOrderRequest,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderItemResponse,
        crate::services::orders::OrderListResponse,
        crate::services::payments::InitiatePaymentRequest,
        crate::services::payments::InitiatePaymentResponse,
        crate::services::payments::VerifyPaymentRequest,
        crate::services::payments::VerifyPaymentResponse,
        crate::services::payments::PaymentStatusResponse,
        crate::services::addresses::CreateAddressRequest,
        crate::services::addresses::UpdateAddressRequest,
        crate::services::customers::RegisterRequest,
        crate::services::customers::LoginRequest,
        crate::services::customers::CustomerSession,
        crate::services::customers::AdminSession,
    )),
    tags(
        (name = "Orders", description = "Order creation and retrieval"),
        (name = "Payments", description = "Payment gateway initiation and reconciliation"),
        (name = "Addresses", description = "Customer address book"),
        (name = "Auth", description = "Customer and admin sessions"),
        (name = "Admin", description = "Back-office order management")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
