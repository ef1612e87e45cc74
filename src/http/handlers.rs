//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::escrow::intake::IntakeRequest;
use crate::escrow::service::HealthReport;
use crate::escrow::types::Transaction;
use crate::escrow::verifier::Classification;
use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub transaction: Transaction,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub sender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub tx_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub transaction: Transaction,
    pub escrow_verification: Option<Classification>,
    pub forward_verification: Option<Classification>,
}

/// Unparseable ids can never match a record.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.trim().parse().map_err(|_| ApiError::NotFound)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.service.health())
}

pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<IntakeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let transaction = state.service.submit(request)?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            transaction,
        }),
    ))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    let id = parse_id(&id)?;
    state.service.get(id)?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let transactions = match query.sender.as_deref().map(str::trim) {
        Some(sender) if !sender.is_empty() => state.service.list_by_sender(sender)?,
        _ => state.service.list_all()?,
    };
    Ok(Json(ListResponse {
        success: true,
        count: transactions.len(),
        transactions,
    }))
}

pub async fn verify_transaction(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let raw = request
        .tx_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Transaction ID required".to_string()))?;

    let report = state.service.trigger(parse_id(&raw)?).await?;
    Ok(Json(VerifyResponse {
        success: true,
        transaction: report.transaction,
        escrow_verification: report.escrow,
        forward_verification: report.forward,
    }))
}
