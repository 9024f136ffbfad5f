//! HTTP handlers for the StockFlow Inventory Platform

pub mod health;
pub mod location;
pub mod movement;
pub mod transaction;

pub use health::*;
pub use location::*;
pub use movement::*;
pub use transaction::*;
