//! Request and response shapes for the REST surface.
//!
//! Related resources are rendered as relative URLs (`/users/3`,
//! `/beverage-types/2`), and the password is write-only: it never appears in
//! any response.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Account, BeverageType, Profile, Purchase, PurchaseCount};
use kasse_core::error::AppError;

// -----------------------------------------------------------------------------
// Accounts
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub is_staff: bool,
    pub profile: Option<ProfilePartial>,
}

/// Nested profile fields accepted at registration.
#[derive(Debug, Deserialize)]
pub struct ProfilePartial {
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub is_staff: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub profile: String,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            is_staff: account.is_staff,
            date_joined: account.date_joined,
            profile: format!("/profiles/{}", account.id),
        }
    }
}

// -----------------------------------------------------------------------------
// Profiles
// -----------------------------------------------------------------------------

/// Partial profile update, deserialized only after the raw payload's key set
/// has been checked against the staff-only fields.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub is_freeloader: Option<bool>,
    pub balance: Option<Decimal>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddBalanceRequest {
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub is_freeloader: bool,
    pub balance: Decimal,
    pub bio: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.account_id,
            is_freeloader: profile.is_freeloader,
            balance: profile.balance,
            bio: profile.bio,
        }
    }
}

// -----------------------------------------------------------------------------
// Beverage catalog
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBeverageTypeRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: String,
    pub price: Decimal,
}

impl CreateBeverageTypeRequest {
    /// Prices are non-negative; validated by hand since `validator` has no
    /// decimal range rule.
    pub fn validate_price(&self) -> Result<(), AppError> {
        validate_price(&self.price)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBeverageTypeRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

impl UpdateBeverageTypeRequest {
    pub fn validate_price(&self) -> Result<(), AppError> {
        match &self.price {
            Some(price) => validate_price(price),
            None => Ok(()),
        }
    }
}

fn validate_price(price: &Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Price must not be negative"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BeverageTypeResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
}

impl From<BeverageType> for BeverageTypeResponse {
    fn from(beverage: BeverageType) -> Self {
        Self {
            id: beverage.id,
            name: beverage.name,
            price: beverage.price,
        }
    }
}

// -----------------------------------------------------------------------------
// Purchases
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub user: i64,
    pub beverage_type: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseRequest {
    pub user: Option<i64>,
    pub beverage_type: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub id: i64,
    pub user: String,
    pub beverage_type: String,
    pub date: DateTime<Utc>,
}

impl From<Purchase> for PurchaseResponse {
    fn from(purchase: Purchase) -> Self {
        Self {
            id: purchase.id,
            user: format!("/users/{}", purchase.account_id),
            beverage_type: format!("/beverage-types/{}", purchase.beverage_type_id),
            date: purchase.date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseCountResponse {
    pub beverage_type: String,
    pub count: i64,
}

impl From<PurchaseCount> for PurchaseCountResponse {
    fn from(row: PurchaseCount) -> Self {
        Self {
            beverage_type: format!("/beverage-types/{}", row.beverage_type_id),
            count: row.count,
        }
    }
}

// -----------------------------------------------------------------------------
// Token auth
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// -----------------------------------------------------------------------------
// List query parameters (raw strings; shaping is lenient)
// -----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseListParams {
    pub user: Option<String>,
    pub beverage_type: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseCountParams {
    pub user: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub is_staff: Option<String>,
    pub username: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileListParams {
    pub is_freeloader: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BeverageTypeListParams {
    pub name: Option<String>,
}
