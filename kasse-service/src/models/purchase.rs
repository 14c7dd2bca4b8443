//! Purchase ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Consumption event linking an account to a beverage type. The timestamp is
/// server-assigned at creation and immutable thereafter.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub account_id: i64,
    pub beverage_type_id: i64,
    pub date: DateTime<Utc>,
}

/// Grouped aggregation row: purchases per beverage type.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PurchaseCount {
    pub beverage_type_id: i64,
    pub count: i64,
}
