//! Purchase ledger handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kasse_core::error::AppError;

use crate::authz::{decide, Action, Resource};
use crate::dtos::{
    CreatePurchaseRequest, PurchaseCountParams, PurchaseCountResponse, PurchaseListParams,
    PurchaseResponse, UpdatePurchaseRequest,
};
use crate::middleware::CurrentActor;
use crate::query::{parse_id, CountOrder, PurchaseOrder};
use crate::AppState;

pub async fn list_purchases(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<PurchaseListParams>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::Purchase, None)?;

    let account_id = parse_id(params.user.as_deref());
    let beverage_type_id = parse_id(params.beverage_type.as_deref());
    let order = PurchaseOrder::parse(params.order.as_deref());

    let purchases = state
        .db
        .list_purchases(account_id, beverage_type_id, order)
        .await?;

    Ok(Json(
        purchases
            .into_iter()
            .map(PurchaseResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Grouped per-beverage-type purchase counts, optionally filtered to one
/// account. Default order is ascending count.
pub async fn purchase_counts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<PurchaseCountParams>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::Purchase, None)?;

    let account_id = parse_id(params.user.as_deref());
    let order = CountOrder::parse(params.order.as_deref());

    let counts = state.db.purchase_counts(account_id, order).await?;

    Ok(Json(
        counts
            .into_iter()
            .map(PurchaseCountResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::Purchase, None)?;

    let purchase = state
        .db
        .get_purchase(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase {} not found", id)))?;

    Ok(Json(PurchaseResponse::from(purchase)))
}

/// Record a purchase. The target account must be the actor unless the actor
/// is staff; the debit and the insert commit together or not at all.
pub async fn create_purchase(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    decide(
        Some(&actor),
        Action::Create,
        Resource::Purchase,
        Some(req.user),
    )?;

    let purchase = state.db.create_purchase(req.user, req.beverage_type).await?;

    Ok((StatusCode::CREATED, Json(PurchaseResponse::from(purchase))))
}

/// Staff-only reference fixup. Deliberately no balance adjustment: money
/// corrections go through the profile add-balance operation.
pub async fn update_purchase(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Update, Resource::Purchase, None)?;

    let purchase = state
        .db
        .update_purchase(id, req.user, req.beverage_type)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase {} not found", id)))?;

    Ok(Json(PurchaseResponse::from(purchase)))
}

/// Staff-only delete. Deliberately no balance reversal.
pub async fn delete_purchase(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Delete, Resource::Purchase, None)?;

    if !state.db.delete_purchase(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Purchase {} not found",
            id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
