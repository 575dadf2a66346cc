pub mod app;
pub mod authz;
pub mod db;
pub mod docs;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod params;
pub mod routes;
pub mod settings;

// Re-export commonly used items for tests
pub use app::{build_router, create_app, AppState};
