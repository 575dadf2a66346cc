use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Decode, Row, Sqlite, Type};
use uuid::Uuid;

use crate::authz::{PermissionLevel, PermissionScope};
use crate::errors::AppError;
use crate::models::permission::{Permission, PermissionTemplate, PermissionTemplateItem, TemplateGrant};
use crate::models::user::User;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 (2025-11-19T12:34:56Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // sqlx's own encoding of DateTime<Utc> ("YYYY-MM-DD HH:MM:SS.f+00:00")
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::internal("invalid datetime: date out of range"))?;
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, AppError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| AppError::internal(format!("missing {}: {}", name, e)))
}

fn uuid_column(row: &SqliteRow, name: &str) -> Result<Uuid, AppError> {
    let raw: String = column(row, name)?;
    Uuid::parse_str(&raw).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", name, e)))
}

fn datetime_column(row: &SqliteRow, name: &str) -> Result<DateTime<Utc>, AppError> {
    let raw: String = column(row, name)?;
    parse_datetime(&raw)
}

fn level_column(row: &SqliteRow, name: &str) -> Result<PermissionLevel, AppError> {
    let raw: i64 = column(row, name)?;
    Ok(PermissionLevel::from_stored(raw)?)
}

fn scope_column(row: &SqliteRow, name: &str) -> Result<PermissionScope, AppError> {
    let raw: String = column(row, name)?;
    Ok(raw.parse::<PermissionScope>()?)
}

pub fn user_from_row(row: &SqliteRow) -> Result<User, AppError> {
    Ok(User {
        id: uuid_column(row, "id")?,
        name: column(row, "name")?,
        email: column(row, "email")?,
        role: column(row, "role")?,
        is_active: column(row, "is_active")?,
        created_at: datetime_column(row, "created_at")?,
        updated_at: datetime_column(row, "updated_at")?,
    })
}

pub fn template_from_row(row: &SqliteRow) -> Result<PermissionTemplate, AppError> {
    Ok(PermissionTemplate {
        id: uuid_column(row, "id")?,
        role_name: column(row, "role_name")?,
        description: column(row, "description")?,
        is_active: column(row, "is_active")?,
        created_at: datetime_column(row, "created_at")?,
        updated_at: datetime_column(row, "updated_at")?,
    })
}

pub fn permission_from_row(row: &SqliteRow) -> Result<Permission, AppError> {
    Ok(Permission {
        id: uuid_column(row, "id")?,
        entity: column(row, "entity")?,
        action: column(row, "action")?,
        description: column(row, "description")?,
        created_at: datetime_column(row, "created_at")?,
    })
}

pub fn template_item_from_row(row: &SqliteRow) -> Result<PermissionTemplateItem, AppError> {
    Ok(PermissionTemplateItem {
        id: uuid_column(row, "id")?,
        template_id: uuid_column(row, "template_id")?,
        permission_id: uuid_column(row, "permission_id")?,
        level: level_column(row, "permission_level")?,
        scope: scope_column(row, "scope")?,
    })
}

pub fn template_grant_from_row(row: &SqliteRow) -> Result<TemplateGrant, AppError> {
    Ok(TemplateGrant {
        permission_id: uuid_column(row, "permission_id")?,
        entity: column(row, "entity")?,
        action: column(row, "action")?,
        level: level_column(row, "permission_level")?,
        scope: scope_column(row, "scope")?,
    })
}
