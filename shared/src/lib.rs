//! Shared types and domain logic for the StockFlow Inventory Platform
//!
//! This crate contains the tenant-agnostic pieces of the domain: enums stored
//! in the database, money and stock arithmetic, and input validation helpers.
//! It performs no I/O of its own.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
