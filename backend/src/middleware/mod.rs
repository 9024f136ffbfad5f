//! Request middleware

pub mod scope;

pub use scope::{scope_middleware, CurrentScope, ScopeContext};
