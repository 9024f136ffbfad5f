//! HTTP handlers for transaction endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentScope;
use crate::services::transaction::{
    AddPaymentInput, CreateTransactionInput, Transaction, TransactionFilter, TransactionPayment,
    TransactionService, TransactionStats, TransactionWithDetails, UpdateTransactionInput,
};
use crate::AppState;

use shared::types::{DateRange, PaginatedResponse};

/// Create a transaction with its items
pub async fn create_transaction(
    State(state): State<AppState>,
    scope: CurrentScope,
    Json(input): Json<CreateTransactionInput>,
) -> AppResult<Json<TransactionWithDetails>> {
    let service = TransactionService::new(state.db);
    let transaction = service
        .create(scope.0.company_id, scope.0.user_id, input)
        .await?;
    Ok(Json(transaction))
}

/// List transactions matching the filter
pub async fn list_transactions(
    State(state): State<AppState>,
    scope: CurrentScope,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<PaginatedResponse<Transaction>>> {
    let service = TransactionService::new(state.db);
    let transactions = service.list(scope.0.company_id, filter).await?;
    Ok(Json(transactions))
}

/// Get one transaction with items and payments
pub async fn get_transaction(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<TransactionWithDetails>> {
    let service = TransactionService::new(state.db);
    let transaction = service.get(scope.0.company_id, transaction_id).await?;
    Ok(Json(transaction))
}

/// Update transaction header fields
pub async fn update_transaction(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(transaction_id): Path<Uuid>,
    Json(input): Json<UpdateTransactionInput>,
) -> AppResult<Json<TransactionWithDetails>> {
    let service = TransactionService::new(state.db);
    let transaction = service
        .update(scope.0.company_id, transaction_id, input)
        .await?;
    Ok(Json(transaction))
}

/// Soft-delete a transaction and reverse its stock effects
pub async fn delete_transaction(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = TransactionService::new(state.db);
    service
        .remove(scope.0.company_id, scope.0.user_id, transaction_id)
        .await?;
    Ok(Json(()))
}

/// Record a payment against a transaction
pub async fn add_payment(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(transaction_id): Path<Uuid>,
    Json(input): Json<AddPaymentInput>,
) -> AppResult<Json<TransactionPayment>> {
    let service = TransactionService::new(state.db);
    let payment = service
        .add_payment(scope.0.company_id, transaction_id, input)
        .await?;
    Ok(Json(payment))
}

/// Response for the derived total
#[derive(Serialize)]
pub struct TotalAmountResponse {
    pub transaction_id: Uuid,
    pub total_amount: Decimal,
}

/// Get the derived total amount of a transaction
pub async fn get_total_amount(
    State(state): State<AppState>,
    scope: CurrentScope,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<TotalAmountResponse>> {
    let service = TransactionService::new(state.db);
    let total_amount = service
        .get_total_amount(scope.0.company_id, transaction_id)
        .await?;
    Ok(Json(TotalAmountResponse {
        transaction_id,
        total_amount,
    }))
}

/// Get transaction statistics, optionally bounded by a date range
pub async fn get_transaction_stats(
    State(state): State<AppState>,
    scope: CurrentScope,
    range: Option<Query<DateRange>>,
) -> AppResult<Json<TransactionStats>> {
    let service = TransactionService::new(state.db);
    let stats = service
        .get_stats(scope.0.company_id, range.map(|q| q.0))
        .await?;
    Ok(Json(stats))
}
