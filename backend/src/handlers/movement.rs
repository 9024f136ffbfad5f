//! HTTP handlers for inventory movement endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentScope;
use crate::services::movement::{
    AdjustStockInput, InventoryMovement, MovementFilter, MovementService,
};
use crate::AppState;

use shared::types::PaginatedResponse;

/// List inventory movements matching the filter
pub async fn list_movements(
    State(state): State<AppState>,
    scope: CurrentScope,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<PaginatedResponse<InventoryMovement>>> {
    let service = MovementService::new(state.db);
    let movements = service.list(scope.0.company_id, filter).await?;
    Ok(Json(movements))
}

/// Get the movements linked to one transaction
pub async fn get_transaction_movements(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryMovement>>> {
    let service = MovementService::new(state.db);
    let movements = service
        .list_for_transaction(scope.0.company_id, transaction_id)
        .await?;
    Ok(Json(movements))
}

/// Record a manual stock adjustment
pub async fn adjust_stock(
    State(state): State<AppState>,
    scope: CurrentScope,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<InventoryMovement>> {
    let service = MovementService::new(state.db);
    let movement = service
        .adjust_stock(scope.0.company_id, scope.0.user_id, input)
        .await?;
    Ok(Json(movement))
}
