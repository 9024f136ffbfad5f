//! HTTP handlers for location endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentScope;
use crate::services::location::{
    CreateLocationInput, Location, LocationService, StockTransfer, TransferStockInput,
    UpdateLocationInput,
};
use crate::AppState;

/// Create a location
pub async fn create_location(
    State(state): State<AppState>,
    scope: CurrentScope,
    Json(input): Json<CreateLocationInput>,
) -> AppResult<Json<Location>> {
    let service = LocationService::new(state.db);
    let location = service.create(scope.0.company_id, input).await?;
    Ok(Json(location))
}

/// List all locations
pub async fn list_locations(
    State(state): State<AppState>,
    scope: CurrentScope,
) -> AppResult<Json<Vec<Location>>> {
    let service = LocationService::new(state.db);
    let locations = service.list(scope.0.company_id).await?;
    Ok(Json(locations))
}

/// Get a location
pub async fn get_location(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<Location>> {
    let service = LocationService::new(state.db);
    let location = service.get(scope.0.company_id, location_id).await?;
    Ok(Json(location))
}

/// Update a location (including reparenting)
pub async fn update_location(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(location_id): Path<Uuid>,
    Json(input): Json<UpdateLocationInput>,
) -> AppResult<Json<Location>> {
    let service = LocationService::new(state.db);
    let location = service
        .update(scope.0.company_id, location_id, input)
        .await?;
    Ok(Json(location))
}

/// Delete a location
pub async fn delete_location(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = LocationService::new(state.db);
    service.delete(scope.0.company_id, location_id).await?;
    Ok(Json(()))
}

/// Transfer stock between two locations
pub async fn transfer_stock(
    State(state): State<AppState>,
    scope: CurrentScope,
    Json(input): Json<TransferStockInput>,
) -> AppResult<Json<StockTransfer>> {
    let service = LocationService::new(state.db);
    let transfer = service
        .transfer_stock(scope.0.company_id, scope.0.user_id, input)
        .await?;
    Ok(Json(transfer))
}
