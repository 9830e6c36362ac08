//! Stock ledger: the only writer of product/variant stock counts.
//!
//! Decrements are conditional updates (`stock = stock - q WHERE stock >= q`)
//! executed on the caller's transaction, so two concurrent orders can never
//! drive a count negative regardless of the backing store's isolation level.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{product, product_variant};
use crate::errors::ServiceError;

/// Decrements a product's stock by `quantity` on `conn` (normally an open
/// transaction). Zero rows affected means a concurrent order consumed the
/// stock first; the caller's transaction must roll back.
pub async fn decrement_product_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> Result<(), ServiceError> {
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        warn!(product_id = %product_id, quantity, "Conditional stock decrement matched no rows");
        return Err(ServiceError::InsufficientStock(format!(
            "product {}",
            product_id
        )));
    }
    Ok(())
}

/// Variant counterpart of [`decrement_product_stock`]. Variant stock is
/// independent of the parent product's.
pub async fn decrement_variant_stock<C: ConnectionTrait>(
    conn: &C,
    variant_id: Uuid,
    quantity: i32,
) -> Result<(), ServiceError> {
    let result = product_variant::Entity::update_many()
        .col_expr(
            product_variant::Column::Stock,
            Expr::col(product_variant::Column::Stock).sub(quantity),
        )
        .col_expr(product_variant::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product_variant::Column::Id.eq(variant_id))
        .filter(product_variant::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        warn!(variant_id = %variant_id, quantity, "Conditional stock decrement matched no rows");
        return Err(ServiceError::InsufficientStock(format!(
            "variant {}",
            variant_id
        )));
    }
    Ok(())
}

/// Pre-check used while resolving prices, for an early failure naming the
/// offending line. The conditional update above remains the authoritative
/// guard under concurrency.
pub fn ensure_available(stock: i32, requested: i32, label: String) -> Result<(), ServiceError> {
    if stock < requested {
        return Err(ServiceError::InsufficientStock(label));
    }
    Ok(())
}
