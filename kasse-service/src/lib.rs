//! Kasse Service - prepaid beverage-fund accounting over REST.

pub mod authz;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod services;
pub mod utils;

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::KasseConfig;
use crate::middleware::auth_middleware;
use crate::services::Database;

#[derive(Clone)]
pub struct AppState {
    pub config: KasseConfig,
    pub db: Database,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = match state.db.health_check().await {
        Ok(()) => "healthy",
        Err(_) => "degraded",
    };

    Json(serde_json::json!({
        "status": status,
        "service": state.config.service_name,
        "version": state.config.service_version,
    }))
}

/// Explicit route table for the whole service. Every route passes through
/// the token middleware; routes that allow anonymous access (registration,
/// token exchange, health) simply run without an actor.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/token", post(handlers::auth::obtain_token))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/users/me", get(handlers::users::me))
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/profiles", get(handlers::profiles::list_profiles))
        .route(
            "/profiles/:id",
            get(handlers::profiles::get_profile)
                .put(handlers::profiles::update_profile)
                .patch(handlers::profiles::update_profile),
        )
        .route(
            "/profiles/:id/add-balance",
            patch(handlers::profiles::add_balance),
        )
        .route(
            "/beverage-types",
            get(handlers::beverage_types::list_beverage_types)
                .post(handlers::beverage_types::create_beverage_type),
        )
        .route(
            "/beverage-types/:id",
            get(handlers::beverage_types::get_beverage_type)
                .put(handlers::beverage_types::update_beverage_type)
                .patch(handlers::beverage_types::update_beverage_type)
                .delete(handlers::beverage_types::delete_beverage_type),
        )
        .route(
            "/purchases",
            get(handlers::purchases::list_purchases).post(handlers::purchases::create_purchase),
        )
        .route("/purchases/counts", get(handlers::purchases::purchase_counts))
        .route(
            "/purchases/:id",
            get(handlers::purchases::get_purchase)
                .put(handlers::purchases::update_purchase)
                .patch(handlers::purchases::update_purchase)
                .delete(handlers::purchases::delete_purchase),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
