//! Domain models for the StockFlow Inventory Platform

pub mod location;
pub mod movement;
pub mod transaction;

pub use location::*;
pub use movement::*;
pub use transaction::*;
