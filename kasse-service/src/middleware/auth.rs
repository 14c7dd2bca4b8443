//! Bearer-token authentication.
//!
//! The middleware resolves `Authorization: Bearer <token>` to an [`Actor`]
//! and stores it in the request extensions. Requests without a header pass
//! through unauthenticated so that public routes (registration, token
//! exchange, health) share the same router; a present-but-invalid token is
//! still a hard 401.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::IntoResponse,
};

use crate::authz::Actor;
use crate::AppState;
use kasse_core::error::AppError;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        let account = state
            .db
            .get_account_by_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid token")))?;

        req.extensions_mut().insert(Actor {
            id: account.id,
            is_staff: account.is_staff,
        });
    }

    Ok(next.run(req).await)
}

/// Extractor for handlers that require an authenticated actor.
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .extensions
            .get::<Actor>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

        Ok(CurrentActor(actor))
    }
}

/// Extractor for handlers that allow anonymous access (registration).
pub struct MaybeActor(pub Option<Actor>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeActor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeActor(parts.extensions.get::<Actor>().copied()))
    }
}
