use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::check_permission;
use crate::errors::{AppError, AppResult, Denial};
use crate::models::permission::{PermissionCheckQuery, PermissionCheckReport};

/// Dry-run a permission check for another user
///
/// Denials are reported in the body; misconfiguration still fails the request.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/permission-check",
    tag = "Users",
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        PermissionCheckQuery
    ),
    responses(
        (status = 200, description = "Check outcome", body = PermissionCheckReport),
        (status = 404, description = "User not found"),
        (status = 422, description = "Missing entity/action or min_level outside 0-4"),
        (status = 500, description = "Role or permission not configured")
    ),
    security(("bearerAuth" = []))
)]
pub async fn permission_check(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    query: Result<Query<PermissionCheckQuery>, QueryRejection>,
) -> AppResult<Json<PermissionCheckReport>> {
    let Query(query) = query.map_err(|err| AppError::unprocessable(err.body_text()))?;

    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let required = query.min_level.unwrap_or_default();
    let mut report = PermissionCheckReport {
        user_id,
        entity: query.entity,
        action: query.action,
        required,
        allowed: false,
        granted: None,
        reason: None,
    };

    if !user.is_active {
        report.reason = Some(Denial::Inactive.reason().to_string());
        return Ok(Json(report));
    }

    match check_permission(state.store.as_ref(), &user, &report.entity, &report.action, required).await {
        Ok(grant) => {
            report.allowed = true;
            report.granted = Some(grant.item.level);
        }
        Err(AppError::Forbidden(denial)) => {
            if let Denial::InsufficientLevel { actual, .. } = &denial {
                report.granted = Some(*actual);
            }
            report.reason = Some(denial.reason().to_string());
        }
        Err(err) => return Err(err),
    }

    Ok(Json(report))
}
