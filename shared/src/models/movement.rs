//! Inventory movement ledger types

use serde::{Deserialize, Serialize};

/// Direction of a stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Transfer,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Transfer => "transfer",
        }
    }

    /// The opposite direction, used when a transaction is reversed
    pub fn inverse(&self) -> MovementType {
        match self {
            MovementType::In => MovementType::Out,
            MovementType::Out => MovementType::In,
            MovementType::Transfer => MovementType::Transfer,
        }
    }
}

/// Why a stock change happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    Sale,
    Purchase,
    Return,
    Transfer,
    Adjustment,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::Sale => "sale",
            MovementReason::Purchase => "purchase",
            MovementReason::Return => "return",
            MovementReason::Transfer => "transfer",
            MovementReason::Adjustment => "adjustment",
        }
    }
}
