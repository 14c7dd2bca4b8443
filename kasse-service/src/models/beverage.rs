//! Beverage catalog model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Priced catalog entry. Staff-owned lifecycle; purchases reference it and
/// resolve the current price at debit time (no price snapshot on the
/// purchase record).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BeverageType {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
}
