use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AuthService, Role},
    entities::{admin_user, customer},
    errors::ServiceError,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Issued session: bearer token plus the principal it represents.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerSession {
    pub token: String,
    #[schema(value_type = Object)]
    pub customer: customer::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminSession {
    pub token: String,
    #[schema(value_type = Object)]
    pub admin: admin_user::Model,
}

/// Account management for both principals: customer signup/login and the
/// back-office admin login. Password hashing and token issuance delegate to
/// [`AuthService`].
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<CustomerSession, ServiceError> {
        request.validate()?;

        let existing = customer::Entity::find()
            .filter(customer::Column::Email.eq(request.email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "Email already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let created = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            password_hash: Set(self.auth.hash_password(&request.password)?),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(customer_id = %created.id, "Customer registered");

        let token =
            self.auth
                .issue_token(created.id, &created.name, &created.email, Role::Customer)?;
        Ok(CustomerSession {
            token,
            customer: created,
        })
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<CustomerSession, ServiceError> {
        request.validate()?;

        let found = customer::Entity::find()
            .filter(customer::Column::Email.eq(request.email.clone()))
            .one(&*self.db)
            .await?;

        // Same rejection for unknown email and wrong password.
        let found = found.filter(|c| self.auth.verify_password(&request.password, &c.password_hash));
        let found = found
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        let token = self
            .auth
            .issue_token(found.id, &found.name, &found.email, Role::Customer)?;
        Ok(CustomerSession {
            token,
            customer: found,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn admin_login(&self, request: LoginRequest) -> Result<AdminSession, ServiceError> {
        request.validate()?;

        let found = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(request.email.clone()))
            .one(&*self.db)
            .await?;

        let found = found.filter(|a| self.auth.verify_password(&request.password, &a.password_hash));
        let found = found
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        let token = self
            .auth
            .issue_token(found.id, &found.name, &found.email, Role::Admin)?;
        Ok(AdminSession {
            token,
            admin: found,
        })
    }

    #[instrument(skip(self))]
    pub async fn admin_get(&self, admin_id: Uuid) -> Result<admin_user::Model, ServiceError> {
        admin_user::Entity::find_by_id(admin_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Admin not found".to_string()))
    }
}
