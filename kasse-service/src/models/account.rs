//! Account and profile models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Authenticatable identity. The password hash never leaves the service
/// boundary; response shaping happens in the DTO layer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

/// Balance/flag/bio record attached 1:1 to an account. Shares the account's
/// id and lifetime; there is no independent create or delete path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub account_id: i64,
    pub is_freeloader: bool,
    pub balance: Decimal,
    pub bio: String,
}

/// Opaque bearer token bound to an account, issued at registration.
#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub token: String,
    pub account_id: i64,
    pub created: DateTime<Utc>,
}

/// Input for creating a new account (password already hashed).
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub username: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub bio: Option<String>,
}
