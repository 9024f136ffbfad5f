//! Inventory movement ledger: append-only audit trail of stock changes
//!
//! Movements are written by the transaction engine, the location transfer
//! flow and manual adjustments. No update or delete path exists; the ledger
//! is the audit trail the rest of the subsystem is checked against.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{MovementReason, MovementType};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_transfer_quantity;

use crate::error::{AppError, AppResult};

/// Movement ledger service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

/// One immutable ledger row recording a stock change and its cause
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryMovement {
    pub id: Uuid,
    pub company_id: Uuid,
    pub product_id: Option<Uuid>,
    pub movement_type: MovementType,
    pub reason: MovementReason,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub transaction_id: Option<Uuid>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Typed filter for ledger listings
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub reason: Option<MovementReason>,
    pub date_from: Option<chrono::NaiveDate>,
    pub date_to: Option<chrono::NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub product_id: Uuid,
    /// Positive adds stock, negative removes
    pub quantity: i32,
    pub notes: Option<String>,
}

const MOVEMENT_COLUMNS: &str = r#"
    id, company_id, product_id, movement_type, reason, quantity,
    previous_stock, new_stock, unit_cost, total_cost,
    transaction_id, from_location_id, to_location_id,
    notes, created_by, created_at
"#;

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List ledger rows matching a filter, newest first
    pub async fn list(
        &self,
        company_id: Uuid,
        filter: MovementFilter,
    ) -> AppResult<PaginatedResponse<InventoryMovement>> {
        let pagination = Pagination {
            page: filter.page.unwrap_or(1),
            per_page: filter.per_page.unwrap_or(20),
        };

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM inventory_movements
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::movement_type IS NULL OR movement_type = $3)
              AND ($4::movement_reason IS NULL OR reason = $4)
              AND ($5::date IS NULL OR created_at::date >= $5)
              AND ($6::date IS NULL OR created_at::date <= $6)
            "#,
        )
        .bind(company_id)
        .bind(filter.product_id)
        .bind(filter.movement_type)
        .bind(filter.reason)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_one(&self.db)
        .await?;

        let data = sqlx::query_as::<_, InventoryMovement>(&format!(
            r#"
            SELECT {} FROM inventory_movements
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::movement_type IS NULL OR movement_type = $3)
              AND ($4::movement_reason IS NULL OR reason = $4)
              AND ($5::date IS NULL OR created_at::date >= $5)
              AND ($6::date IS NULL OR created_at::date <= $6)
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(company_id)
        .bind(filter.product_id)
        .bind(filter.movement_type)
        .bind(filter.reason)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Audit view: every movement linked to one transaction, oldest first
    pub async fn list_for_transaction(
        &self,
        company_id: Uuid,
        transaction_id: Uuid,
    ) -> AppResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            r#"
            SELECT {} FROM inventory_movements
            WHERE company_id = $1 AND transaction_id = $2
            ORDER BY created_at
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(company_id)
        .bind(transaction_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Manual signed stock correction on a product.
    ///
    /// Locked read-modify-write plus one adjustment ledger row in a single
    /// unit of work. Adjustments may not drive stock negative.
    pub async fn adjust_stock(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: AdjustStockInput,
    ) -> AppResult<InventoryMovement> {
        if input.quantity == 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Adjustment quantity cannot be zero".to_string(),
            });
        }
        validate_transfer_quantity(input.quantity.abs()).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        let previous_stock = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT current_stock FROM products
            WHERE id = $1 AND company_id = $2
            FOR UPDATE
            "#,
        )
        .bind(input.product_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let new_stock = previous_stock + input.quantity;
        if new_stock < 0 {
            return Err(AppError::InsufficientStock(format!(
                "Product holds {} units, cannot remove {}",
                previous_stock,
                input.quantity.abs()
            )));
        }

        let movement_type = if input.quantity > 0 {
            MovementType::In
        } else {
            MovementType::Out
        };

        let movement = sqlx::query_as::<_, InventoryMovement>(&format!(
            r#"
            INSERT INTO inventory_movements (company_id, product_id, movement_type, reason,
                                             quantity, previous_stock, new_stock, notes, created_by)
            VALUES ($1, $2, $3, 'adjustment', $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(company_id)
        .bind(input.product_id)
        .bind(movement_type)
        .bind(input.quantity.abs())
        .bind(previous_stock)
        .bind(new_stock)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET current_stock = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_stock)
            .bind(input.product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            product_id = %input.product_id,
            quantity = input.quantity,
            "Adjusted product stock"
        );

        Ok(movement)
    }
}
