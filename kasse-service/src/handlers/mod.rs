pub mod auth;
pub mod beverage_types;
pub mod profiles;
pub mod purchases;
pub mod users;
