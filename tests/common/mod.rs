#![allow(dead_code)]

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use template_gate::jwt::JwtConfig;
use template_gate::settings::Settings;
use template_gate::AppState;

pub const JWT_SECRET: &str = "test-secret";

pub struct TestDb {
    pub pool: SqlitePool,
    // keeps the database file alive for the duration of the test
    _dir: TempDir,
}

pub async fn setup_db() -> Result<TestDb> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    Ok(TestDb { pool, _dir: dir })
}

pub fn jwt() -> JwtConfig {
    JwtConfig::new(JWT_SECRET, 1)
}

pub fn state(pool: &SqlitePool) -> AppState {
    AppState::new(pool.clone(), jwt(), Settings::from_lookup(|_| None))
}

pub fn token_for(user_id: Uuid) -> String {
    jwt().encode(user_id).expect("sign token")
}

pub async fn insert_user(pool: &SqlitePool, role: i64, is_active: bool) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email, role, is_active) VALUES (?, ?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(format!("User {}", role))
        .bind(format!("{}@example.com", id))
        .bind(role)
        .bind(is_active)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_template(pool: &SqlitePool, role_name: &str, is_active: bool) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO permission_templates (id, role_name, description, is_active) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(role_name)
        .bind(format!("{} template", role_name))
        .bind(is_active)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_permission(pool: &SqlitePool, entity: &str, action: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO permissions (id, entity, action) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(entity)
        .bind(action)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_item(pool: &SqlitePool, template_id: Uuid, permission_id: Uuid, level: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO permission_template_items (id, template_id, permission_id, permission_level) VALUES (?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(template_id.to_string())
    .bind(permission_id.to_string())
    .bind(level)
    .execute(pool)
    .await?;
    Ok(())
}

/// Sends a GET, optionally with a bearer token, and returns status plus JSON body.
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = builder.body(Body::empty())?;

    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
    };

    Ok((status, value))
}
