mod database;
mod token;

pub use database::Database;
pub use token::generate_token;
