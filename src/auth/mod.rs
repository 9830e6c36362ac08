//! Authentication and authorization for the storefront API.
//!
//! Two principals exist: customers (storefront) and admins (back office),
//! each with their own login surface and table. Both are issued HS256 bearer
//! tokens carrying a role claim; the extractors below gate routes by role.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Principal role carried in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies bearer tokens and hashes passwords. Constructed once
/// from config and shared through application state.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    token_ttl_secs: usize,
}

impl AuthService {
    pub fn new(jwt_secret: String, token_ttl_secs: usize) -> Self {
        Self {
            jwt_secret,
            token_ttl_secs,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        use argon2::password_hash::{rand_core::OsRng, SaltString};
        use argon2::{Argon2, PasswordHasher};

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {}", e)))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        use argon2::{Argon2, PasswordHash, PasswordVerifier};

        PasswordHash::new(password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub fn issue_token(
        &self,
        subject: Uuid,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.token_ttl_secs as i64,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("token encoding failed: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ServiceError::Unauthorized("Unauthorized".to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn claims_from_parts(parts: &Parts, state: &crate::AppState) -> Result<Claims, ServiceError> {
    let token =
        bearer_token(parts).ok_or_else(|| ServiceError::Unauthorized("Unauthorized".into()))?;
    state.services.auth.verify_token(token)
}

/// Authenticated storefront customer, extracted from a bearer token.
/// Rejects with 401 when the token is missing, invalid, or admin-role.
#[derive(Debug, Clone)]
pub struct CustomerUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<crate::AppState> for CustomerUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        if claims.role != Role::Customer {
            return Err(ServiceError::Unauthorized("Unauthorized".into()));
        }
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Unauthorized".into()))?;
        Ok(Self {
            id,
            name: claims.name,
            email: claims.email,
        })
    }
}

/// Customer identity when a token happens to be present; `None` otherwise.
/// Used on guest-accessible routes (e.g. address creation) that attach
/// ownership only for signed-in callers.
#[derive(Debug, Clone)]
pub struct MaybeCustomer(pub Option<CustomerUser>);

#[async_trait]
impl FromRequestParts<crate::AppState> for MaybeCustomer {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(Self(None));
        }
        match CustomerUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(_) => Ok(Self(None)),
        }
    }
}

/// Authenticated back-office admin. Missing/invalid token rejects with 401;
/// a valid customer token rejects with 403.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<crate::AppState> for AdminUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        if claims.role != Role::Admin {
            return Err(ServiceError::Forbidden("Forbidden".into()));
        }
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Unauthorized".into()))?;
        Ok(Self {
            id,
            name: claims.name,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            "a_test_secret_that_is_long_enough_for_validation".to_string(),
            3600,
        )
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let auth = service();
        let id = Uuid::new_v4();
        let token = auth
            .issue_token(id, "Jane", "jane@example.com", Role::Customer)
            .unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, Role::Customer);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let auth = service();
        let other = AuthService::new(
            "a_different_secret_that_is_also_long_enough!!".to_string(),
            3600,
        );
        let token = other
            .issue_token(Uuid::new_v4(), "Eve", "eve@example.com", Role::Admin)
            .unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn password_hash_roundtrip() {
        let auth = service();
        let hash = auth.hash_password("hunter2hunter2").unwrap();
        assert!(auth.verify_password("hunter2hunter2", &hash));
        assert!(!auth.verify_password("wrong", &hash));
        assert!(!auth.verify_password("hunter2hunter2", "not-a-phc-string"));
    }
}
