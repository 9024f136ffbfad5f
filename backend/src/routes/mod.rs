//! Route definitions for the StockFlow Inventory Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::scope_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Scoped routes - transaction engine
        .nest("/transactions", transaction_routes())
        // Scoped routes - warehouse locations
        .nest("/locations", location_routes())
        // Scoped routes - movement ledger
        .nest("/movements", movement_routes())
}

/// Transaction engine routes (tenant scoped)
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/stats", get(handlers::get_transaction_stats))
        .route(
            "/:transaction_id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route("/:transaction_id/payments", post(handlers::add_payment))
        .route("/:transaction_id/total", get(handlers::get_total_amount))
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Location management routes (tenant scoped)
fn location_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route("/transfer", post(handlers::transfer_stock))
        .route(
            "/:location_id",
            get(handlers::get_location)
                .put(handlers::update_location)
                .delete(handlers::delete_location),
        )
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Movement ledger routes (tenant scoped)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_movements))
        .route("/adjustments", post(handlers::adjust_stock))
        .route(
            "/transactions/:transaction_id",
            get(handlers::get_transaction_movements),
        )
        .route_layer(middleware::from_fn(scope_middleware))
}
