use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    api::{state::AppState, middleware::auth::CurrentUser},
    domain::{CreditTransaction, DistributionReport},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
}

pub async fn balance(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>> {
    let credits = state.service_context.credit_service
        .balance(user.user.id)
        .await?;

    Ok(Json(json!({ "success": true, "credits": credits })))
}

pub async fn transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionsQuery>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<CreditTransaction>>> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let transactions = state.service_context.credit_service
        .transactions(user.user.id, limit)
        .await?;

    Ok(Json(transactions))
}

/// Credit actions answer `{success, credits}` on the happy path and
/// `{success:false, error}` when the balance does not cover the spend;
/// everything else goes through the usual error translation.
pub async fn consume(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<ConsumeRequest>,
) -> Result<Response> {
    match state.service_context.credit_service
        .consume(user.user.id, request.amount, &request.description)
        .await
    {
        Ok(account) => Ok(
            Json(json!({ "success": true, "credits": account.balance })).into_response()
        ),
        Err(AppError::InsufficientCredits(msg)) => Ok((
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({ "success": false, "error": msg })),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

pub async fn grant(
    State(state): State<AppState>,
    Json(request): Json<GrantRequest>,
) -> Result<Json<serde_json::Value>> {
    let account = state.service_context.credit_service
        .grant(request.user_id, request.amount, &request.description)
        .await?;

    Ok(Json(json!({ "success": true, "credits": account.balance })))
}

pub async fn distribute(
    State(state): State<AppState>,
) -> Result<Json<DistributionReport>> {
    let report = state.service_context.credit_service
        .distribute_to_all()
        .await?;

    Ok(Json(report))
}

pub async fn user_balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let credits = state.service_context.credit_service
        .balance(user_id)
        .await?;

    Ok(Json(json!({ "success": true, "credits": credits })))
}
