//! Transaction engine: sales, purchases and returns with inventory effects
//!
//! Creating a transaction validates every referenced entity up front, then
//! inserts the header, its items and the per-item inventory movements inside
//! one database transaction. Deleting a transaction appends inverse movements
//! rather than rewriting history, so the ledger stays append-only.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{
    is_fully_paid, line_total, transaction_total, PaymentMethod, PaymentStatus, TransactionStatus,
    TransactionType,
};
use shared::types::{DateRange, PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_monetary_amount, validate_quantity};

use crate::error::{AppError, AppResult};

/// Transaction service for commercial events and their stock effects
#[derive(Clone)]
pub struct TransactionService {
    db: PgPool,
}

/// Transaction header record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub company_id: Uuid,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub payment_status: PaymentStatus,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub discount: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub transaction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item record; immutable once the transaction is created
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransactionItem {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payment record; append-only
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransactionPayment {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Fully hydrated transaction
#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub payments: Vec<TransactionPayment>,
}

/// Input for creating a transaction with its items
#[derive(Debug, Deserialize)]
pub struct CreateTransactionInput {
    pub transaction_type: TransactionType,
    pub status: Option<TransactionStatus>,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub transaction_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<CreateTransactionItemInput>,
}

/// Line item input
#[derive(Debug, Deserialize)]
pub struct CreateTransactionItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for updating transaction header fields.
/// Items and stock effects are never touched after creation.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionInput {
    pub status: Option<TransactionStatus>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub transaction_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Input for recording a payment
#[derive(Debug, Deserialize)]
pub struct AddPaymentInput {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<String>,
}

/// Typed filter for transaction listings
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TransactionFilter {
    fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
    }
}

/// Count of transactions per type
#[derive(Debug, Serialize)]
pub struct TypeCount {
    pub transaction_type: TransactionType,
    pub count: i64,
}

/// Count of transactions per status
#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: TransactionStatus,
    pub count: i64,
}

/// Read-side aggregation over a date range
#[derive(Debug, Serialize)]
pub struct TransactionStats {
    pub total_transactions: i64,
    pub by_type: Vec<TypeCount>,
    pub by_status: Vec<StatusCount>,
    pub sales_total: Decimal,
    pub purchases_total: Decimal,
    pub returns_total: Decimal,
}

impl TransactionService {
    /// Create a new TransactionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a transaction with its items and apply inventory effects
    pub async fn create(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateTransactionInput,
    ) -> AppResult<TransactionWithDetails> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A transaction requires at least one item".to_string(),
            });
        }

        for (idx, item) in input.items.iter().enumerate() {
            validate_quantity(item.quantity).map_err(|msg| AppError::Validation {
                field: format!("items[{}].quantity", idx),
                message: msg.to_string(),
            })?;
            validate_monetary_amount(item.unit_price).map_err(|msg| AppError::Validation {
                field: format!("items[{}].unit_price", idx),
                message: msg.to_string(),
            })?;
            validate_monetary_amount(item.discount.unwrap_or(Decimal::ZERO)).map_err(|msg| {
                AppError::Validation {
                    field: format!("items[{}].discount", idx),
                    message: msg.to_string(),
                }
            })?;
        }

        let discount = input.discount.unwrap_or(Decimal::ZERO);
        let tax = input.tax.unwrap_or(Decimal::ZERO);
        let shipping_cost = input.shipping_cost.unwrap_or(Decimal::ZERO);
        for (field, amount) in [
            ("discount", discount),
            ("tax", tax),
            ("shipping_cost", shipping_cost),
        ] {
            validate_monetary_amount(amount).map_err(|msg| AppError::Validation {
                field: field.to_string(),
                message: msg.to_string(),
            })?;
        }

        // Validate referenced parties before any write
        if let Some(customer_id) = input.customer_id {
            self.assert_exists("customers", "Customer", customer_id, company_id)
                .await?;
        }
        if let Some(supplier_id) = input.supplier_id {
            self.assert_exists("suppliers", "Supplier", supplier_id, company_id)
                .await?;
        }

        let mut product_ids: Vec<Uuid> = input.items.iter().map(|i| i.product_id).collect();
        product_ids.sort();
        product_ids.dedup();

        // Start transaction
        let mut tx = self.db.begin().await?;

        // Lock every referenced product row for the duration of the unit of
        // work and verify all of them resolve in scope, so a missing product
        // on item N fails before items 1..N-1 are applied.
        let rows = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            SELECT id, current_stock FROM products
            WHERE id = ANY($1) AND company_id = $2
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&product_ids)
        .bind(company_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut stock_levels: HashMap<Uuid, i32> = rows.into_iter().collect();
        for item in &input.items {
            if !stock_levels.contains_key(&item.product_id) {
                return Err(AppError::NotFound(format!("Product {}", item.product_id)));
            }
        }

        let status = input.status.unwrap_or(TransactionStatus::Completed);
        let transaction_date = input
            .transaction_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let transaction_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO transactions (company_id, transaction_type, status, payment_status,
                                      customer_id, supplier_id, reference, notes,
                                      discount, tax, shipping_cost,
                                      transaction_date, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(company_id)
        .bind(input.transaction_type)
        .bind(status)
        .bind(PaymentStatus::Pending)
        .bind(input.customer_id)
        .bind(input.supplier_id)
        .bind(&input.reference)
        .bind(&input.notes)
        .bind(discount)
        .bind(tax)
        .bind(shipping_cost)
        .bind(transaction_date)
        .bind(input.due_date)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let effect = input.transaction_type.stock_effect();

        // Items are applied sequentially: each movement brackets the stock
        // value left by the previous item, not a batched diff.
        for item in &input.items {
            let item_discount = item.discount.unwrap_or(Decimal::ZERO);

            sqlx::query(
                r#"
                INSERT INTO transaction_items (transaction_id, product_id, quantity,
                                               unit_price, discount, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(transaction_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item_discount)
            .bind(&item.notes)
            .execute(&mut *tx)
            .await?;

            if let Some(effect) = effect {
                let previous_stock = stock_levels[&item.product_id];
                let new_stock = previous_stock + effect.delta(item.quantity);

                sqlx::query(
                    "UPDATE products SET current_stock = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(new_stock)
                .bind(item.product_id)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO inventory_movements (company_id, product_id, movement_type, reason,
                                                     quantity, previous_stock, new_stock,
                                                     unit_cost, total_cost, transaction_id, created_by)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    "#,
                )
                .bind(company_id)
                .bind(item.product_id)
                .bind(effect.movement_type)
                .bind(effect.reason)
                .bind(item.quantity)
                .bind(previous_stock)
                .bind(new_stock)
                .bind(item.unit_price)
                .bind(line_total(item.quantity, item.unit_price, item_discount))
                .bind(transaction_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

                stock_levels.insert(item.product_id, new_stock);
            }
        }

        tx.commit().await?;

        tracing::debug!(%transaction_id, transaction_type = ?input.transaction_type, "Created transaction");

        self.get(company_id, transaction_id).await
    }

    /// List transactions matching a filter, soft-deleted rows excluded
    pub async fn list(
        &self,
        company_id: Uuid,
        filter: TransactionFilter,
    ) -> AppResult<PaginatedResponse<Transaction>> {
        let pagination = filter.pagination();

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE company_id = $1 AND deleted_at IS NULL
              AND ($2::transaction_type IS NULL OR transaction_type = $2)
              AND ($3::transaction_status IS NULL OR status = $3)
              AND ($4::payment_status IS NULL OR payment_status = $4)
              AND ($5::uuid IS NULL OR customer_id = $5)
              AND ($6::uuid IS NULL OR supplier_id = $6)
              AND ($7::date IS NULL OR transaction_date >= $7)
              AND ($8::date IS NULL OR transaction_date <= $8)
            "#,
        )
        .bind(company_id)
        .bind(filter.transaction_type)
        .bind(filter.status)
        .bind(filter.payment_status)
        .bind(filter.customer_id)
        .bind(filter.supplier_id)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_one(&self.db)
        .await?;

        let data = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, company_id, transaction_type, status, payment_status,
                   customer_id, supplier_id, reference, notes,
                   discount, tax, shipping_cost, transaction_date, due_date,
                   paid_at, deleted_at, created_by, created_at, updated_at
            FROM transactions
            WHERE company_id = $1 AND deleted_at IS NULL
              AND ($2::transaction_type IS NULL OR transaction_type = $2)
              AND ($3::transaction_status IS NULL OR status = $3)
              AND ($4::payment_status IS NULL OR payment_status = $4)
              AND ($5::uuid IS NULL OR customer_id = $5)
              AND ($6::uuid IS NULL OR supplier_id = $6)
              AND ($7::date IS NULL OR transaction_date >= $7)
              AND ($8::date IS NULL OR transaction_date <= $8)
            ORDER BY transaction_date DESC, created_at DESC
            LIMIT $9 OFFSET $10
            "#,
        )
        .bind(company_id)
        .bind(filter.transaction_type)
        .bind(filter.status)
        .bind(filter.payment_status)
        .bind(filter.customer_id)
        .bind(filter.supplier_id)
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

    /// Get a transaction with items and payments
    pub async fn get(
        &self,
        company_id: Uuid,
        transaction_id: Uuid,
    ) -> AppResult<TransactionWithDetails> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, company_id, transaction_type, status, payment_status,
                   customer_id, supplier_id, reference, notes,
                   discount, tax, shipping_cost, transaction_date, due_date,
                   paid_at, deleted_at, created_by, created_at, updated_at
            FROM transactions
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(transaction_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        let items = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT id, transaction_id, product_id, quantity, unit_price, discount, notes, created_at
            FROM transaction_items
            WHERE transaction_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.db)
        .await?;

        let payments = sqlx::query_as::<_, TransactionPayment>(
            r#"
            SELECT id, transaction_id, method, amount, reference, processed_at
            FROM transaction_payments
            WHERE transaction_id = $1
            ORDER BY processed_at
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.db)
        .await?;

        Ok(TransactionWithDetails {
            transaction,
            items,
            payments,
        })
    }

    /// Update header fields of a transaction
    pub async fn update(
        &self,
        company_id: Uuid,
        transaction_id: Uuid,
        input: UpdateTransactionInput,
    ) -> AppResult<TransactionWithDetails> {
        let existing = self.get(company_id, transaction_id).await?.transaction;

        if existing.payment_status == PaymentStatus::Paid {
            return Err(AppError::Conflict {
                resource: "Transaction".to_string(),
                message: "Cannot update a completed transaction".to_string(),
            });
        }

        let status = input.status.unwrap_or(existing.status);
        let reference = input.reference.or(existing.reference);
        let notes = input.notes.or(existing.notes);
        let discount = input.discount.unwrap_or(existing.discount);
        let tax = input.tax.unwrap_or(existing.tax);
        let shipping_cost = input.shipping_cost.unwrap_or(existing.shipping_cost);
        let transaction_date = input.transaction_date.unwrap_or(existing.transaction_date);
        let due_date = input.due_date.or(existing.due_date);

        for (field, amount) in [
            ("discount", discount),
            ("tax", tax),
            ("shipping_cost", shipping_cost),
        ] {
            validate_monetary_amount(amount).map_err(|msg| AppError::Validation {
                field: field.to_string(),
                message: msg.to_string(),
            })?;
        }

        sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, reference = $2, notes = $3, discount = $4, tax = $5,
                shipping_cost = $6, transaction_date = $7, due_date = $8, updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(status)
        .bind(&reference)
        .bind(&notes)
        .bind(discount)
        .bind(tax)
        .bind(shipping_cost)
        .bind(transaction_date)
        .bind(due_date)
        .bind(transaction_id)
        .execute(&self.db)
        .await?;

        self.get(company_id, transaction_id).await
    }

    /// Soft-delete a transaction and reverse its stock effects.
    ///
    /// Each movement linked to the transaction gets an inverse movement
    /// appended (flipped direction, reason adjustment) and the product stock
    /// updated to match, all in one unit of work. The ledger itself is never
    /// rewritten.
    pub async fn remove(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let payment_status = sqlx::query_scalar::<_, PaymentStatus>(
            r#"
            SELECT payment_status FROM transactions
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        if payment_status == PaymentStatus::Paid {
            return Err(AppError::Conflict {
                resource: "Transaction".to_string(),
                message: "Cannot delete a completed transaction".to_string(),
            });
        }

        let movements = sqlx::query_as::<_, ReversibleMovement>(
            r#"
            SELECT product_id, movement_type, quantity, previous_stock, new_stock
            FROM inventory_movements
            WHERE transaction_id = $1 AND company_id = $2
            ORDER BY created_at
            "#,
        )
        .bind(transaction_id)
        .bind(company_id)
        .fetch_all(&mut *tx)
        .await?;

        for movement in &movements {
            let product_id = match movement.product_id {
                Some(id) => id,
                None => continue,
            };

            let current_stock = sqlx::query_scalar::<_, i32>(
                "SELECT current_stock FROM products WHERE id = $1 FOR UPDATE",
            )
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))?;

            let delta = movement.new_stock - movement.previous_stock;
            let restored_stock = current_stock - delta;

            sqlx::query(
                r#"
                INSERT INTO inventory_movements (company_id, product_id, movement_type, reason,
                                                 quantity, previous_stock, new_stock,
                                                 transaction_id, notes, created_by)
                VALUES ($1, $2, $3, 'adjustment', $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(company_id)
            .bind(product_id)
            .bind(movement.movement_type.inverse())
            .bind(movement.quantity)
            .bind(current_stock)
            .bind(restored_stock)
            .bind(transaction_id)
            .bind(format!("Reversal of transaction {}", transaction_id))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE products SET current_stock = $1, updated_at = NOW() WHERE id = $2")
                .bind(restored_stock)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE transactions SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(%transaction_id, reversed_movements = movements.len(), "Soft-deleted transaction");

        Ok(())
    }

    /// Record a payment and flip the payment status once fully paid
    pub async fn add_payment(
        &self,
        company_id: Uuid,
        transaction_id: Uuid,
        input: AddPaymentInput,
    ) -> AppResult<TransactionPayment> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Payment amount must be greater than 0".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        // Lock the header so concurrent payments serialize on the status flip
        let header = sqlx::query_as::<_, PaymentHeader>(
            r#"
            SELECT payment_status, discount, tax, shipping_cost FROM transactions
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        if header.payment_status == PaymentStatus::Paid {
            return Err(AppError::Conflict {
                resource: "Transaction".to_string(),
                message: "Cannot add a payment to a completed transaction".to_string(),
            });
        }

        let payment = sqlx::query_as::<_, TransactionPayment>(
            r#"
            INSERT INTO transaction_payments (transaction_id, method, amount, reference)
            VALUES ($1, $2, $3, $4)
            RETURNING id, transaction_id, method, amount, reference, processed_at
            "#,
        )
        .bind(transaction_id)
        .bind(input.method)
        .bind(input.amount)
        .bind(&input.reference)
        .fetch_one(&mut *tx)
        .await?;

        let item_sum = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity * unit_price - discount), 0)
            FROM transaction_items
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        let total = transaction_total(item_sum, header.discount, header.tax, header.shipping_cost);

        let paid_sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM transaction_payments WHERE transaction_id = $1",
        )
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        if is_fully_paid(paid_sum, total) {
            sqlx::query(
                r#"
                UPDATE transactions
                SET payment_status = 'paid', paid_at = NOW(), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "UPDATE transactions SET payment_status = 'partial', updated_at = NOW() WHERE id = $1",
            )
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(payment)
    }

    /// Derive the total amount of a transaction on demand
    pub async fn get_total_amount(
        &self,
        company_id: Uuid,
        transaction_id: Uuid,
    ) -> AppResult<Decimal> {
        let header = sqlx::query_as::<_, PaymentHeader>(
            r#"
            SELECT payment_status, discount, tax, shipping_cost FROM transactions
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(transaction_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        let item_sum = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity * unit_price - discount), 0)
            FROM transaction_items
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_one(&self.db)
        .await?;

        Ok(transaction_total(
            item_sum,
            header.discount,
            header.tax,
            header.shipping_cost,
        ))
    }

    /// Aggregate counts and monetary totals over a date range.
    ///
    /// Totals are recomputed by walking every matching transaction's items;
    /// fine for reporting cadence, not for hot paths.
    pub async fn get_stats(
        &self,
        company_id: Uuid,
        range: Option<DateRange>,
    ) -> AppResult<TransactionStats> {
        let (date_from, date_to) = match range {
            Some(r) => (Some(r.start), Some(r.end)),
            None => (None, None),
        };

        let headers = sqlx::query_as::<_, StatsHeader>(
            r#"
            SELECT id, transaction_type, status, discount, tax, shipping_cost
            FROM transactions
            WHERE company_id = $1 AND deleted_at IS NULL
              AND ($2::date IS NULL OR transaction_date >= $2)
              AND ($3::date IS NULL OR transaction_date <= $3)
            "#,
        )
        .bind(company_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.db)
        .await?;

        let item_rows = sqlx::query_as::<_, (Uuid, i32, Decimal, Decimal)>(
            r#"
            SELECT i.transaction_id, i.quantity, i.unit_price, i.discount
            FROM transaction_items i
            JOIN transactions t ON t.id = i.transaction_id
            WHERE t.company_id = $1 AND t.deleted_at IS NULL
              AND ($2::date IS NULL OR t.transaction_date >= $2)
              AND ($3::date IS NULL OR t.transaction_date <= $3)
            "#,
        )
        .bind(company_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.db)
        .await?;

        let mut item_sums: HashMap<Uuid, Decimal> = HashMap::new();
        for (transaction_id, quantity, unit_price, discount) in item_rows {
            *item_sums.entry(transaction_id).or_insert(Decimal::ZERO) +=
                line_total(quantity, unit_price, discount);
        }

        let mut type_counts: HashMap<TransactionType, i64> = HashMap::new();
        let mut status_counts: HashMap<TransactionStatus, i64> = HashMap::new();
        let mut sales_total = Decimal::ZERO;
        let mut purchases_total = Decimal::ZERO;
        let mut returns_total = Decimal::ZERO;

        for header in &headers {
            *type_counts.entry(header.transaction_type).or_insert(0) += 1;
            *status_counts.entry(header.status).or_insert(0) += 1;

            let item_sum = item_sums
                .get(&header.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let total =
                transaction_total(item_sum, header.discount, header.tax, header.shipping_cost);

            match header.transaction_type {
                TransactionType::Sale => sales_total += total,
                TransactionType::Purchase => purchases_total += total,
                TransactionType::Return => returns_total += total,
                TransactionType::Quotation => {}
            }
        }

        Ok(TransactionStats {
            total_transactions: headers.len() as i64,
            by_type: type_counts
                .into_iter()
                .map(|(transaction_type, count)| TypeCount {
                    transaction_type,
                    count,
                })
                .collect(),
            by_status: status_counts
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            sales_total,
            purchases_total,
            returns_total,
        })
    }

    /// Validate a scoped entity reference exists
    async fn assert_exists(
        &self,
        table: &str,
        resource: &str,
        id: Uuid,
        company_id: Uuid,
    ) -> AppResult<()> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND company_id = $2)",
            table
        );
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::NotFound(resource.to_string()));
        }
        Ok(())
    }
}

/// Row for the reversal walk
#[derive(Debug, FromRow)]
struct ReversibleMovement {
    product_id: Option<Uuid>,
    movement_type: shared::models::MovementType,
    quantity: i32,
    previous_stock: i32,
    new_stock: i32,
}

/// Header fields needed to derive a total
#[derive(Debug, FromRow)]
struct PaymentHeader {
    payment_status: PaymentStatus,
    discount: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
}

/// Header row for statistics aggregation
#[derive(Debug, FromRow)]
struct StatsHeader {
    id: Uuid,
    transaction_type: TransactionType,
    status: TransactionStatus,
    discount: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
}
