//! Database models for the StockFlow Inventory Platform
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;
