pub mod auth;
pub mod health;
pub mod templates;
pub mod users;
