use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::order::{self, OrderStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{GatewayOrder, RazorpayGateway},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
    /// Client-declared amount; must equal the persisted order total.
    #[schema(value_type = f64, example = 500.00)]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub customer_phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiatePaymentResponse {
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    /// Remote payment-intent, passed to the gateway's client-side UI
    #[serde(rename = "razorOrder")]
    #[schema(value_type = Object)]
    pub razor_order: GatewayOrder,
    /// Public key id the client needs to open the payment widget
    pub key: String,
}

/// Completion callback payload as the gateway's client-side flow posts it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    #[schema(value_type = Object)]
    pub order: order::Model,
    pub message: String,
}

/// Projection served to polling clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    #[schema(value_type = f64)]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<order::Model> for PaymentStatusResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            payment_status: model.payment_status,
            payment_id: model.payment_id,
            total: model.total,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Drives the payment half of the order lifecycle: initiates gateway
/// transactions and reconciles their asynchronous completion callbacks
/// against order state.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<RazorpayGateway>,
    event_sender: EventSender,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<RazorpayGateway>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
        }
    }

    /// Creates a remote payment-intent for an order. The declared amount is
    /// checked against the persisted total before the gateway is contacted;
    /// a mismatch never leaves the process.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn initiate(
        &self,
        request: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, ServiceError> {
        request.validate()?;

        let found = order::Entity::find_by_id(request.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if request.amount != found.total {
            warn!(
                order_id = %found.id,
                declared = %request.amount,
                total = %found.total,
                "Payment initiation amount mismatch"
            );
            return Err(ServiceError::AmountMismatch);
        }

        let razor_order = self
            .gateway
            .create_order(&found.id.to_string(), found.total)
            .await?;

        let order_id = found.id;
        let mut active: order::ActiveModel = found.into();
        active.payment_status = Set(PaymentStatus::Pending);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        info!(order_id = %order_id, gateway_order_id = %razor_order.id, "Payment initiated");
        self.event_sender
            .send(Event::PaymentInitiated {
                order_id,
                gateway_order_id: razor_order.id.clone(),
            })
            .await;

        Ok(InitiatePaymentResponse {
            order_id,
            razor_order,
            key: self.gateway.key_id().to_string(),
        })
    }

    /// Reconciles a completion callback. The signature gate runs before any
    /// other callback field is trusted; a failed check is still persisted as
    /// payment_status=FAILED so polling clients see a definitive state
    /// instead of waiting on PENDING forever.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn verify(&self, request: VerifyPaymentRequest) -> Result<order::Model, ServiceError> {
        let found = order::Entity::find_by_id(request.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        // Gateway callback retries replay the same payment id; applying the
        // transition again would be a write of identical values, so short-
        // circuit instead.
        if found.payment_status == PaymentStatus::Paid
            && found.payment_id.as_deref() == Some(request.razorpay_payment_id.as_str())
        {
            info!(order_id = %found.id, "Duplicate payment callback ignored");
            return Ok(found);
        }

        let valid = self.gateway.verify_signature(
            &request.razorpay_order_id,
            &request.razorpay_payment_id,
            &request.razorpay_signature,
        );

        if !valid {
            warn!(order_id = %found.id, "Payment callback failed signature verification");
            let order_id = found.id;
            let mut active: order::ActiveModel = found.into();
            active.payment_status = Set(PaymentStatus::Failed);
            active.updated_at = Set(Utc::now());
            active.update(&*self.db).await?;

            self.event_sender.send(Event::PaymentFailed(order_id)).await;
            return Err(ServiceError::SignatureInvalid);
        }

        let order_id = found.id;
        let mut active: order::ActiveModel = found.into();
        active.payment_status = Set(PaymentStatus::Paid);
        active.status = Set(OrderStatus::Confirmed);
        active.payment_id = Set(Some(request.razorpay_payment_id.clone()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        info!(order_id = %order_id, payment_id = %request.razorpay_payment_id, "Payment reconciled");
        self.event_sender
            .send(Event::PaymentSucceeded {
                order_id,
                payment_id: request.razorpay_payment_id,
            })
            .await;

        Ok(updated)
    }

    /// Payment status projection for polling clients.
    #[instrument(skip(self))]
    pub async fn status(&self, order_id: Uuid) -> Result<PaymentStatusResponse, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .map(PaymentStatusResponse::from)
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }
}
