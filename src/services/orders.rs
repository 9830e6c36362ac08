use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entities::{
        address, customer, order,
        order::{OrderStatus, PaymentStatus},
        order_item, product, product_variant,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock,
};

/// One requested order line. The submitted `price` is informational: it is
/// replaced by the catalog price whenever the line references a product or
/// variant, and only survives for free-form lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    #[validate(custom = "validate_positive_price")]
    #[schema(value_type = f64, example = 199.99)]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    pub address_id: Option<Uuid>,
    #[validate]
    pub items: Vec<OrderItemRequest>,
    pub guest_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
}

/// Admin override of order state; both fields optional, neither gated on
/// the other.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("Price must be positive".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantSummary {
    pub id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<customer::Model> for CustomerSummary {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub product: Option<ProductSummary>,
    pub variant: Option<VariantSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub address_id: Option<Uuid>,
    #[schema(value_type = f64)]
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    #[schema(value_type = Option<Object>)]
    pub address: Option<address::Model>,
    pub customer: Option<CustomerSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

struct ResolvedLine {
    product_id: Option<Uuid>,
    variant_id: Option<Uuid>,
    quantity: i32,
    unit_price: Decimal,
}

/// Order builder: validates requested lines against the live catalog,
/// computes the authoritative total, and persists the order, its items, and
/// the stock decrements in one transaction.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an order. The submitted per-item prices are discarded in
    /// favor of catalog prices (variant price wins over product price);
    /// stock is checked up front and decremented conditionally inside the
    /// same transaction that inserts the order, so a failure at any point
    /// leaves no partial order and no partial decrement.
    #[instrument(skip(self, request), fields(customer_id = ?request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        if request.items.is_empty() {
            return Err(ServiceError::ValidationFailed(vec![
                crate::errors::FieldError::new("items", "At least one item is required"),
            ]));
        }
        self.check_ordering_party(&request)?;

        let lines = self.resolve_lines(&request.items).await?;
        let total: Decimal = lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        order::ActiveModel {
            id: Set(order_id),
            customer_id: Set(request.customer_id),
            address_id: Set(request.address_id),
            total: Set(total),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_id: Set(None),
            guest_name: Set(request.guest_name.clone()),
            guest_email: Set(request.guest_email.clone()),
            guest_phone: Set(request.guest_phone.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for line in &lines {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                variant_id: Set(line.variant_id),
                quantity: Set(line.quantity),
                price: Set(line.unit_price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            // Dropping the transaction on error rolls everything back,
            // including the order row inserted above.
            if let Some(product_id) = line.product_id {
                stock::decrement_product_stock(&txn, product_id, line.quantity).await?;
            }
            if let Some(variant_id) = line.variant_id {
                stock::decrement_variant_stock(&txn, variant_id, line.quantity).await?;
            }
        }

        txn.commit().await?;

        info!(order_id = %order_id, %total, "Order created");
        self.event_sender.send(Event::OrderCreated(order_id)).await;

        self.load_order(order_id).await
    }

    /// Exactly one ordering party: a customer id, or guest name + email.
    fn check_ordering_party(&self, request: &CreateOrderRequest) -> Result<(), ServiceError> {
        let has_customer = request.customer_id.is_some();
        let has_guest_fields = request.guest_name.is_some() || request.guest_email.is_some();

        if has_customer && has_guest_fields {
            return Err(ServiceError::ValidationError(
                "Provide either a customer or guest details, not both".to_string(),
            ));
        }
        if !has_customer {
            let guest_complete = request
                .guest_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty())
                && request
                    .guest_email
                    .as_deref()
                    .is_some_and(|email| !email.trim().is_empty());
            if !guest_complete {
                return Err(ServiceError::ValidationError(
                    "Guest name and email are required for guest orders".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Resolves the authoritative unit price and pre-checks stock for each
    /// line. A line referencing both a product and a variant has both stocks
    /// checked; the variant price is the one kept.
    async fn resolve_lines(
        &self,
        items: &[OrderItemRequest],
    ) -> Result<Vec<ResolvedLine>, ServiceError> {
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let mut unit_price = item.price;

            if let Some(product_id) = item.product_id {
                let found = product::Entity::find_by_id(product_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Product {} not found", product_id))
                    })?;
                stock::ensure_available(
                    found.stock,
                    item.quantity,
                    format!("product {}", product_id),
                )?;
                unit_price = found.price;
            }

            if let Some(variant_id) = item.variant_id {
                let found = product_variant::Entity::find_by_id(variant_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Product variant {} not found", variant_id))
                    })?;
                stock::ensure_available(
                    found.stock,
                    item.quantity,
                    format!("variant {}", variant_id),
                )?;
                unit_price = found.price;
            }

            lines.push(ResolvedLine {
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price,
            });
        }
        Ok(lines)
    }

    /// Order detail visible to its owner. Guest orders have no owning
    /// customer, so any authenticated lookup misses and reads as not-found.
    #[instrument(skip(self))]
    pub async fn get_order_for_customer(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let found = order::Entity::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        self.hydrate(found).await
    }

    /// Caller's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let found = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut orders = Vec::with_capacity(found.len());
        for model in found {
            orders.push(self.hydrate(model).await?);
        }
        Ok(orders)
    }

    /// Admin-facing lookup, unscoped.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        self.load_order(order_id).await
    }

    /// Admin list with pagination and optional status filter.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<OrderStatus>,
    ) -> Result<OrderListResponse, ServiceError> {
        let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut orders = Vec::with_capacity(models.len());
        for model in models {
            orders.push(self.hydrate(model).await?);
        }

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Admin override of status/payment status. Deliberately not gated on
    /// payment state: manual fulfilment and cancellations bypass the
    /// reconciler.
    #[instrument(skip(self, request))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let existing = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let old_status = existing.status;
        let mut active: order::ActiveModel = existing.into();
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        if let Some(payment_status) = request.payment_status {
            active.payment_status = Set(payment_status);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        if updated.status != old_status {
            self.event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status: old_status.to_string(),
                    new_status: updated.status.to_string(),
                })
                .await;
        }

        self.hydrate(updated).await
    }

    async fn load_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        self.hydrate(found).await
    }

    /// Attaches items (with product/variant summaries), the shipping
    /// address, and the customer summary to an order row.
    async fn hydrate(&self, model: order::Model) -> Result<OrderResponse, ServiceError> {
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(model.id))
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().filter_map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let variant_ids: Vec<Uuid> = items.iter().filter_map(|i| i.variant_id).collect();
        let variants: HashMap<Uuid, product_variant::Model> = if variant_ids.is_empty() {
            HashMap::new()
        } else {
            product_variant::Entity::find()
                .filter(product_variant::Column::Id.is_in(variant_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|v| (v.id, v))
                .collect()
        };

        let address = match model.address_id {
            Some(address_id) => address::Entity::find_by_id(address_id).one(&*self.db).await?,
            None => None,
        };

        let customer = match model.customer_id {
            Some(customer_id) => customer::Entity::find_by_id(customer_id)
                .one(&*self.db)
                .await?
                .map(CustomerSummary::from),
            None => None,
        };

        let items = items
            .into_iter()
            .map(|item| OrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                price: item.price,
                product: item.product_id.and_then(|id| {
                    products.get(&id).map(|p| ProductSummary {
                        id: p.id,
                        name: p.name.clone(),
                    })
                }),
                variant: item.variant_id.and_then(|id| {
                    variants.get(&id).map(|v| VariantSummary {
                        id: v.id,
                        size: v.size.clone(),
                        color: v.color.clone(),
                    })
                }),
            })
            .collect();

        Ok(OrderResponse {
            id: model.id,
            customer_id: model.customer_id,
            address_id: model.address_id,
            total: model.total,
            status: model.status,
            payment_status: model.payment_status,
            payment_id: model.payment_id,
            guest_name: model.guest_name,
            guest_email: model.guest_email,
            guest_phone: model.guest_phone,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items,
            address,
            customer,
        })
    }
}
