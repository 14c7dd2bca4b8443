//! Credential-to-token exchange.

use axum::{extract::State, response::IntoResponse, Json};
use kasse_core::error::AppError;

use crate::dtos::{TokenRequest, TokenResponse};
use crate::utils::{verify_password, Password};
use crate::AppState;

/// Exchange username/password for the account's bearer token. The same 400
/// is returned for an unknown username and a wrong password.
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::BadRequest(anyhow::anyhow!("Unable to log in with provided credentials"));

    let account = state
        .db
        .get_account_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    verify_password(&Password::new(req.password), &account.password_hash).map_err(|_| invalid())?;

    let token = state
        .db
        .get_token_for_account(account.id)
        .await?
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Account has no token")))?;

    tracing::info!(account_id = account.id, "Token issued");

    Ok(Json(TokenResponse { token }))
}
