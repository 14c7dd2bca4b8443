//! Common test utilities for kasse-service integration tests.
//!
//! Tests drive the full router via `tower::util::ServiceExt::oneshot` against
//! a real PostgreSQL database. Set `TEST_DATABASE_URL` before running.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use kasse_core::config::Config as CommonConfig;
use kasse_service::config::{DatabaseConfig, KasseConfig};
use kasse_service::services::Database;
use kasse_service::{build_router, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Once;
use tower::util::ServiceExt;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,kasse_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub router: Router,
    pub db: Database,
}

/// Build the application against `TEST_DATABASE_URL` and run migrations.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let database_url =
        std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for integration tests");

    let config = KasseConfig {
        common: CommonConfig { port: 0 },
        service_name: "kasse-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: database_url.clone(),
            max_connections: 8,
            min_connections: 1,
        },
    };

    let db = Database::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    let router = build_router(AppState {
        config,
        db: db.clone(),
    });

    TestApp { router, db }
}

impl TestApp {
    /// Send one request through the router and decode the JSON body (Null
    /// for empty bodies such as 204 responses).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body was not JSON")
        };

        (status, body)
    }

    /// Register an account and exchange credentials for its token.
    /// Returns (account id, token).
    pub async fn register(&self, username: &str, staff: bool) -> (i64, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/users",
                None,
                Some(json!({
                    "username": username,
                    "password": "hunter2hunter2",
                    "is_staff": staff,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
        let id = body["id"].as_i64().expect("registration returned no id");

        let (status, body) = self
            .request(
                Method::POST,
                "/auth/token",
                None,
                Some(json!({
                    "username": username,
                    "password": "hunter2hunter2",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "token exchange failed: {}", body);
        let token = body["token"].as_str().expect("no token in response").to_string();

        (id, token)
    }

    /// Create a catalog entry as the given staff actor.
    pub async fn create_beverage(&self, staff_token: &str, name: &str, price: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/beverage-types",
                Some(staff_token),
                Some(json!({ "name": name, "price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "catalog create failed: {}", body);
        body["id"].as_i64().expect("catalog entry has no id")
    }

    /// Set a profile balance directly (test fixture, bypasses the API).
    pub async fn set_balance(&self, account_id: i64, balance: &str) {
        sqlx::query("UPDATE profiles SET balance = $2 WHERE account_id = $1")
            .bind(account_id)
            .bind(Decimal::from_str(balance).unwrap())
            .execute(self.db.pool())
            .await
            .expect("Failed to set balance");
    }

    /// Mark a profile as freeloader directly (test fixture).
    pub async fn set_freeloader(&self, account_id: i64) {
        sqlx::query("UPDATE profiles SET is_freeloader = TRUE WHERE account_id = $1")
            .bind(account_id)
            .execute(self.db.pool())
            .await
            .expect("Failed to set freeloader flag");
    }

    /// Read a profile's balance through the API.
    pub async fn balance(&self, token: &str, account_id: i64) -> Decimal {
        let (status, body) = self
            .request(
                Method::GET,
                &format!("/profiles/{}", account_id),
                Some(token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "profile fetch failed: {}", body);
        parse_decimal(&body["balance"])
    }
}

/// Balances and prices serialize as decimal strings.
pub fn parse_decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("expected a decimal string")).unwrap()
}

/// Unique username per test run; the suite shares one database.
pub fn unique(name: &str) -> String {
    use rand::Rng;
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}_{:08x}", name, suffix)
}
