use sqlx::Row;
use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use template_gate::authz::{check_permission, Grant, PermissionLevel};
use template_gate::db::{AuthzStore, SqliteStore};
use template_gate::errors::{AppError, AppResult};
use template_gate::jwt::JwtConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "template-gate admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Sign a bearer token for an existing user (development only)
    IssueToken { user_id: Uuid },
    /// Evaluate a permission check for a user and print the outcome
    Check {
        user_id: Uuid,
        entity: String,
        action: String,
        /// Minimum level, 0 (none) to 4 (delete)
        #[arg(long, default_value_t = 1)]
        min_level: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::IssueToken { user_id } => {
            let store = SqliteStore::new(get_pool().await?);
            store
                .find_user(user_id)
                .await?
                .with_context(|| format!("no user with id {}", user_id))?;

            let jwt = JwtConfig::from_env()?;
            println!("{}", jwt.encode(user_id)?);
        }
        Commands::Check {
            user_id,
            entity,
            action,
            min_level,
        } => {
            let min_level = PermissionLevel::try_from(min_level)?;
            let store = SqliteStore::new(get_pool().await?);
            let user = store
                .find_user(user_id)
                .await?
                .with_context(|| format!("no user with id {}", user_id))?;

            let outcome = check_permission(&store, &user, &entity, &action, min_level).await;
            println!("{}", describe_check(outcome, &entity, &action)?);
        }
    }

    Ok(())
}

/// Denials are a normal outcome; any other failure is returned so the process exits non-zero.
fn describe_check(outcome: AppResult<Grant>, entity: &str, action: &str) -> anyhow::Result<String> {
    match outcome {
        Ok(grant) => Ok(format!(
            "allowed: {} grants {}:{} at level {} ({})",
            grant.template.role_name,
            entity,
            action,
            grant.item.level,
            grant.item.level.label()
        )),
        Err(AppError::Forbidden(denial)) => Ok(format!("denied: {}: {}", denial.reason(), denial)),
        Err(err) => Err(err.into()),
    }
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    let table = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when run from the repo root, else the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
