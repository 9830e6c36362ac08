use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{entities::address, errors::ServiceError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address line 1 is required"))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

/// Shipping address book. Guest checkouts create anonymous rows (no
/// customer); signed-in customers get ownership and the single-default
/// invariant.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(customer_id = ?owner))]
    pub async fn create(
        &self,
        owner: Option<Uuid>,
        request: CreateAddressRequest,
    ) -> Result<address::Model, ServiceError> {
        request.validate()?;

        if let Some(customer_id) = owner {
            if request.is_default {
                clear_default_flags(&*self.db, customer_id).await?;
            }
        }

        let now = Utc::now();
        let created = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(owner),
            full_name: Set(request.full_name),
            phone: Set(request.phone),
            line1: Set(request.line1),
            line2: Set(request.line2),
            city: Set(request.city),
            state: Set(request.state),
            postal_code: Set(request.postal_code),
            country: Set(request.country),
            // An anonymous address can never be anyone's default.
            is_default: Set(owner.is_some() && request.is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        Ok(created)
    }

    /// Customer's addresses, default first, then newest.
    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<address::Model>, ServiceError> {
        Ok(address::Entity::find()
            .filter(address::Column::CustomerId.eq(customer_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
        request: UpdateAddressRequest,
    ) -> Result<address::Model, ServiceError> {
        request.validate()?;

        let existing = self.find_owned(customer_id, address_id).await?;

        if request.is_default == Some(true) && !existing.is_default {
            clear_default_flags(&*self.db, customer_id).await?;
        }

        let mut active: address::ActiveModel = existing.into();
        if let Some(full_name) = request.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone);
        }
        if let Some(line1) = request.line1 {
            active.line1 = Set(line1);
        }
        if let Some(line2) = request.line2 {
            active.line2 = Set(Some(line2));
        }
        if let Some(city) = request.city {
            active.city = Set(city);
        }
        if let Some(state) = request.state {
            active.state = Set(state);
        }
        if let Some(postal_code) = request.postal_code {
            active.postal_code = Set(postal_code);
        }
        if let Some(country) = request.country {
            active.country = Set(country);
        }
        if let Some(is_default) = request.is_default {
            active.is_default = Set(is_default);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, customer_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.find_owned(customer_id, address_id).await?;
        address::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn find_owned(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<address::Model, ServiceError> {
        address::Entity::find()
            .filter(address::Column::Id.eq(address_id))
            .filter(address::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Address not found".to_string()))
    }
}

/// Clears `is_default` on all of a customer's addresses; the caller then
/// writes the single new default. Keeps the at-most-one-default invariant.
async fn clear_default_flags<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
) -> Result<(), ServiceError> {
    address::Entity::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(false))
        .col_expr(address::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(address::Column::CustomerId.eq(customer_id))
        .exec(conn)
        .await?;
    Ok(())
}
