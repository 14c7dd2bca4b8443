//! Beverage catalog handlers. Reads for any authenticated actor, writes for
//! staff only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kasse_core::error::AppError;
use validator::Validate;

use crate::authz::{decide, Action, Resource};
use crate::dtos::{
    BeverageTypeListParams, BeverageTypeResponse, CreateBeverageTypeRequest,
    UpdateBeverageTypeRequest,
};
use crate::middleware::CurrentActor;
use crate::AppState;

pub async fn list_beverage_types(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<BeverageTypeListParams>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::BeverageType, None)?;

    let beverages = state.db.list_beverage_types(params.name.as_deref()).await?;

    Ok(Json(
        beverages
            .into_iter()
            .map(BeverageTypeResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_beverage_type(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::BeverageType, None)?;

    let beverage = state
        .db
        .get_beverage_type(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Beverage type {} not found", id)))?;

    Ok(Json(BeverageTypeResponse::from(beverage)))
}

pub async fn create_beverage_type(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<CreateBeverageTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Create, Resource::BeverageType, None)?;
    req.validate()?;
    req.validate_price()?;

    let beverage = state.db.create_beverage_type(&req.name, req.price).await?;

    Ok((StatusCode::CREATED, Json(BeverageTypeResponse::from(beverage))))
}

pub async fn update_beverage_type(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBeverageTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Update, Resource::BeverageType, None)?;
    req.validate()?;
    req.validate_price()?;

    let beverage = state
        .db
        .update_beverage_type(id, req.name.as_deref(), req.price)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Beverage type {} not found", id)))?;

    Ok(Json(BeverageTypeResponse::from(beverage)))
}

/// Staff-only delete; the purchase history referencing this type is removed
/// with it (cascade policy).
pub async fn delete_beverage_type(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Delete, Resource::BeverageType, None)?;

    if !state.db.delete_beverage_type(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Beverage type {} not found",
            id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
