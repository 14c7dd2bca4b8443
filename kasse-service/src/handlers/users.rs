//! Account handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kasse_core::error::AppError;
use validator::Validate;

use crate::authz::{decide, Action, Resource};
use crate::dtos::{CreateUserRequest, UpdateUserRequest, UserListParams, UserResponse};
use crate::middleware::{CurrentActor, MaybeActor};
use crate::models::CreateAccount;
use crate::query::{parse_int_bool, AccountOrder};
use crate::services::generate_token;
use crate::utils::{hash_password, Password};
use crate::AppState;

/// Self-registration. Provisions the profile row and the bearer token in the
/// same transaction as the account; an optional nested `profile.bio` partial
/// is applied at creation.
pub async fn create_user(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    decide(actor.as_ref(), Action::Create, Resource::Account, None)?;
    req.validate()?;

    let password_hash = hash_password(&Password::new(req.password))?;
    let input = CreateAccount {
        username: req.username,
        password_hash,
        is_staff: req.is_staff,
        bio: req.profile.and_then(|p| p.bio),
    };

    let token = generate_token();
    let (account, _profile) = state.db.create_account(&input, &token).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::Account, None)?;

    let is_staff = parse_int_bool(params.is_staff.as_deref());
    let order = AccountOrder::parse(params.order.as_deref());

    let accounts = state
        .db
        .list_accounts(is_staff, params.username.as_deref(), order)
        .await?;

    Ok(Json(
        accounts
            .into_iter()
            .map(UserResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Read, Resource::Account, Some(id))?;

    let account = state
        .db
        .get_account(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", id)))?;

    Ok(Json(UserResponse::from(account)))
}

/// The account bound to the presented token.
pub async fn me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .db
        .get_account(actor.id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", actor.id)))?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Update, Resource::Account, Some(id))?;
    req.validate()?;

    // Credential updates are re-hashed, never stored raw.
    let password_hash = match req.password {
        Some(password) => Some(hash_password(&Password::new(password))?),
        None => None,
    };

    let account = state
        .db
        .update_account(
            id,
            req.username.as_deref(),
            password_hash.as_deref(),
            req.is_staff,
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", id)))?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    decide(Some(&actor), Action::Delete, Resource::Account, Some(id))?;

    if !state.db.delete_account(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("User {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
