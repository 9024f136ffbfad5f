//! Transaction domain types and monetary arithmetic

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::movement::{MovementReason, MovementType};

/// Kind of commercial event a transaction records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Purchase,
    Return,
    /// Quoted but not executed; carries no stock effect
    Quotation,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Purchase => "purchase",
            TransactionType::Return => "return",
            TransactionType::Quotation => "quotation",
        }
    }

    /// Inventory effect applied per line item, if any.
    ///
    /// Sales take stock out; purchases and returns bring stock in.
    pub fn stock_effect(&self) -> Option<StockEffect> {
        match self {
            TransactionType::Sale => Some(StockEffect {
                movement_type: MovementType::Out,
                reason: MovementReason::Sale,
                sign: -1,
            }),
            TransactionType::Purchase => Some(StockEffect {
                movement_type: MovementType::In,
                reason: MovementReason::Purchase,
                sign: 1,
            }),
            TransactionType::Return => Some(StockEffect {
                movement_type: MovementType::In,
                reason: MovementReason::Return,
                sign: 1,
            }),
            TransactionType::Quotation => None,
        }
    }
}

/// How a transaction type moves stock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockEffect {
    pub movement_type: MovementType,
    pub reason: MovementReason,
    /// +1 adds to product stock, -1 removes
    pub sign: i32,
}

impl StockEffect {
    /// Signed stock delta for a line item quantity
    pub fn delta(&self, quantity: i32) -> i32 {
        self.sign * quantity
    }
}

/// Transaction lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Payment progress against a transaction's total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

/// Means of payment recorded against a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Check,
    Other,
}

/// Total for a single line item: quantity x unit price minus item discount
pub fn line_total(quantity: i32, unit_price: Decimal, discount: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price - discount
}

/// Transaction total from the summed line totals and header amounts.
///
/// total = item_sum - discount + tax + shipping_cost
///
/// No floor at zero: a discount larger than the item sum yields a negative
/// total, which is surfaced as-is.
pub fn transaction_total(
    item_sum: Decimal,
    discount: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
) -> Decimal {
    item_sum - discount + tax + shipping_cost
}

/// Whether the summed payments settle the transaction.
///
/// Uses `>=`: overpayment settles the transaction silently.
pub fn is_fully_paid(paid_sum: Decimal, total: Decimal) -> bool {
    paid_sum >= total
}
