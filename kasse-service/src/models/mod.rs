//! Domain models for kasse-service.

mod account;
mod beverage;
mod purchase;

pub use account::{Account, AuthToken, CreateAccount, Profile};
pub use beverage::BeverageType;
pub use purchase::{Purchase, PurchaseCount};
