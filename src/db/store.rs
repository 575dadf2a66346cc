//! Read-only access to users and the permission template tables.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::row_parsers;
use crate::errors::{AppError, AppResult};
use crate::models::permission::{Permission, PermissionTemplate, PermissionTemplateItem, TemplateGrant};
use crate::models::user::User;
use crate::params::{ListFilters, Pagination};

/// Exact-match lookups the authorization checks depend on.
///
/// When storage holds several matching rows the first one (in insertion
/// order) is returned; uniqueness is the storage layer's job.
#[async_trait]
pub trait AuthzStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// First active template whose `role_name` equals `role_name`.
    async fn find_active_template(&self, role_name: &str) -> AppResult<Option<PermissionTemplate>>;

    async fn find_template(&self, id: Uuid) -> AppResult<Option<PermissionTemplate>>;

    async fn find_permission(&self, entity: &str, action: &str) -> AppResult<Option<Permission>>;

    async fn find_template_item(
        &self,
        template_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<Option<PermissionTemplateItem>>;

    async fn list_templates(
        &self,
        filters: &ListFilters,
        pagination: &Pagination,
    ) -> AppResult<Vec<PermissionTemplate>>;

    async fn template_grants(&self, template_id: Uuid) -> AppResult<Vec<TemplateGrant>>;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Escapes `LIKE` wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

const USER_COLUMNS: &str = "id, name, email, role, is_active, created_at, updated_at";
const TEMPLATE_COLUMNS: &str = "id, role_name, description, is_active, created_at, updated_at";

fn template_order_column(order_by: Option<&str>) -> AppResult<&'static str> {
    match order_by {
        None | Some("role_name") => Ok("role_name"),
        Some("created_at") => Ok("created_at"),
        Some("updated_at") => Ok("updated_at"),
        Some(other) => Err(AppError::unprocessable(format!("cannot order templates by '{}'", other))),
    }
}

#[async_trait]
impl AuthzStore for SqliteStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::user_from_row).transpose()
    }

    async fn find_active_template(&self, role_name: &str) -> AppResult<Option<PermissionTemplate>> {
        let sql = format!(
            "SELECT {} FROM permission_templates WHERE role_name = ? AND is_active = 1 ORDER BY rowid LIMIT 1",
            TEMPLATE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(role_name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::template_from_row).transpose()
    }

    async fn find_template(&self, id: Uuid) -> AppResult<Option<PermissionTemplate>> {
        let sql = format!("SELECT {} FROM permission_templates WHERE id = ?", TEMPLATE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::template_from_row).transpose()
    }

    async fn find_permission(&self, entity: &str, action: &str) -> AppResult<Option<Permission>> {
        let row = sqlx::query(
            "SELECT id, entity, action, description, created_at FROM permissions \
             WHERE entity = ? AND action = ? ORDER BY rowid LIMIT 1",
        )
        .bind(entity)
        .bind(action)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_parsers::permission_from_row).transpose()
    }

    async fn find_template_item(
        &self,
        template_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<Option<PermissionTemplateItem>> {
        let row = sqlx::query(
            "SELECT id, template_id, permission_id, permission_level, scope FROM permission_template_items \
             WHERE template_id = ? AND permission_id = ? ORDER BY rowid LIMIT 1",
        )
        .bind(template_id.to_string())
        .bind(permission_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_parsers::template_item_from_row).transpose()
    }

    async fn list_templates(
        &self,
        filters: &ListFilters,
        pagination: &Pagination,
    ) -> AppResult<Vec<PermissionTemplate>> {
        let order_column = template_order_column(filters.order_by.as_deref())?;
        let sql = format!(
            "SELECT {} FROM permission_templates \
             WHERE (? = 0 OR is_active = 1) AND (? IS NULL OR role_name LIKE ? ESCAPE '\\') \
             ORDER BY {} {} LIMIT ? OFFSET ?",
            TEMPLATE_COLUMNS,
            order_column,
            filters.order_direction.as_sql()
        );

        let pattern = filters.search.as_deref().map(like_pattern);
        let rows = sqlx::query(&sql)
            .bind(filters.active_only)
            .bind(pattern.as_deref())
            .bind(pattern.as_deref())
            .bind(pagination.per_page)
            .bind(pagination.skip)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_parsers::template_from_row).collect()
    }

    async fn template_grants(&self, template_id: Uuid) -> AppResult<Vec<TemplateGrant>> {
        let rows = sqlx::query(
            r#"
            SELECT i.permission_id, p.entity, p.action, i.permission_level, i.scope
            FROM permission_template_items i
            INNER JOIN permissions p ON p.id = i.permission_id
            WHERE i.template_id = ?
            ORDER BY p.entity, p.action
            "#,
        )
        .bind(template_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_parsers::template_grant_from_row).collect()
    }
}
