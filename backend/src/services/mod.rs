//! Business logic services for the StockFlow Inventory Platform

pub mod location;
pub mod movement;
pub mod transaction;

pub use location::LocationService;
pub use movement::MovementService;
pub use transaction::TransactionService;
