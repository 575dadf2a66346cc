use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{require_permission, PermissionLevel, RequireExt, REQUIRE_ADMIN, REQUIRE_MANAGER};
use crate::db::{AuthzStore, SqliteStore};
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, health, templates, users};
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub store: Arc<dyn AuthzStore>,
    pub jwt: Arc<JwtConfig>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, settings: Settings) -> Self {
        Self {
            store: Arc::new(SqliteStore::new(pool.clone())),
            pool,
            jwt: Arc::new(jwt),
            settings: Arc::new(settings),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config, Settings::from_env());
    Ok(build_router(state))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new().route("/me", get(auth::me));

    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/greeting", get(auth::greeting))
        .route(
            "/templates",
            get(templates::list_templates).require(
                &state,
                require_permission("templates", "list", PermissionLevel::Read),
            ),
        )
        .route(
            "/templates/:template_id/grants",
            get(templates::template_grants).require(&state, REQUIRE_MANAGER),
        )
        .route(
            "/users/:user_id/permission-check",
            get(users::permission_check).require(&state, REQUIRE_ADMIN),
        );

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
