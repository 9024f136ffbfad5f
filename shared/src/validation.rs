//! Validation utilities for the StockFlow Inventory Platform

use rust_decimal::Decimal;

/// Validate that a monetary amount is non-negative
pub fn validate_monetary_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Validate a line item quantity (whole units, at least one)
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Validate a transfer or adjustment quantity (strictly positive)
pub fn validate_transfer_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than 0");
    }
    Ok(())
}

/// Validate location code format (2-16 uppercase alphanumeric, dashes allowed)
pub fn validate_location_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 {
        return Err("Location code must be at least 2 characters");
    }
    if code.len() > 16 {
        return Err("Location code must be at most 16 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Location code must be uppercase alphanumeric");
    }
    Ok(())
}

/// Validate an optional location capacity
pub fn validate_capacity(capacity: Option<i32>) -> Result<(), &'static str> {
    if let Some(cap) = capacity {
        if cap < 0 {
            return Err("Capacity cannot be negative");
        }
    }
    Ok(())
}
