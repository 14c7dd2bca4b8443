//! Profile handlers.
//!
//! Profiles have no create or delete route; their lifecycle is driven
//! entirely by the owning account.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use kasse_core::error::AppError;

use crate::authz::{decide, touches_protected_fields, Action, Resource};
use crate::dtos::{AddBalanceRequest, ProfileListParams, ProfileResponse, UpdateProfileRequest};
use crate::middleware::CurrentActor;
use crate::query::parse_int_bool;
use crate::AppState;

pub async fn list_profiles(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<ProfileListParams>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::Profile, None)?;

    let is_freeloader = parse_int_bool(params.is_freeloader.as_deref());

    let profiles = state
        .db
        .list_profiles(is_freeloader, params.bio.as_deref())
        .await?;

    Ok(Json(
        profiles
            .into_iter()
            .map(ProfileResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::Profile, Some(id))?;

    let profile = state
        .db
        .get_profile(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile {} not found", id)))?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Partial profile update. The owner may edit `bio`; a non-staff payload
/// containing `is_freeloader` or `balance` is rejected outright, even when
/// the submitted value equals the stored one.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Update, Resource::Profile, Some(id))?;

    if !actor.is_staff && touches_protected_fields(&payload) {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Only staff may set is_freeloader or balance"
        )));
    }

    let req: UpdateProfileRequest = serde_json::from_value(payload)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Malformed profile payload: {}", e)))?;

    let profile = state
        .db
        .update_profile(id, req.is_freeloader, req.balance, req.bio.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile {} not found", id)))?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Staff correction endpoint: adds (not replaces) the submitted amount to
/// the target balance. Negative amounts are allowed.
pub async fn add_balance(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<AddBalanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::AddBalance, Resource::Profile, Some(id))?;

    let profile = state
        .db
        .add_balance(id, req.balance)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile {} not found", id)))?;

    Ok(Json(ProfileResponse::from(profile)))
}
