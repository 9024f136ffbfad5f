//! Warehouse location types and capacity rules

use serde::{Deserialize, Serialize};

/// Kind of storage location in the warehouse hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "location_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Warehouse,
    Zone,
    Shelf,
    Bin,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Warehouse => "warehouse",
            LocationType::Zone => "zone",
            LocationType::Shelf => "shelf",
            LocationType::Bin => "bin",
        }
    }
}

/// Whether receiving `quantity` units would push a location past its
/// capacity. A location without a capacity accepts any quantity.
pub fn exceeds_capacity(current_stock: i32, quantity: i32, capacity: Option<i32>) -> bool {
    match capacity {
        Some(cap) => current_stock + quantity > cap,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceeds_capacity() {
        assert!(exceeds_capacity(90, 20, Some(100)));
        assert!(!exceeds_capacity(90, 10, Some(100)));
        assert!(!exceeds_capacity(90, 1000, None));
    }

    #[test]
    fn test_exact_fill_is_allowed() {
        assert!(!exceeds_capacity(0, 100, Some(100)));
    }
}
