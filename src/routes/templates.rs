use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::permission::{PermissionTemplate, TemplateGrant};
use crate::params::{FiltersQuery, ListFilters, Pagination, PaginationQuery};

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplatePage {
    pub page: i64,
    pub per_page: i64,
    pub items: Vec<PermissionTemplate>,
}

/// List permission templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    params(PaginationQuery, FiltersQuery),
    responses(
        (status = 200, description = "Page of templates", body = TemplatePage),
        (status = 403, description = "Role lacks templates:list"),
        (status = 422, description = "Invalid pagination or filter parameters")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_templates(
    State(state): State<AppState>,
    pagination: Pagination,
    filters: ListFilters,
) -> AppResult<Json<TemplatePage>> {
    let items = state.store.list_templates(&filters, &pagination).await?;

    Ok(Json(TemplatePage {
        page: pagination.page,
        per_page: pagination.per_page,
        items,
    }))
}

/// List the grants bundled in a template
#[utoipa::path(
    get,
    path = "/api/templates/{template_id}/grants",
    tag = "Templates",
    params(
        ("template_id" = Uuid, Path, description = "Template ID"),
    ),
    responses(
        (status = 200, description = "Grants of the template", body = Vec<TemplateGrant>),
        (status = 404, description = "Template not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn template_grants(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> AppResult<Json<Vec<TemplateGrant>>> {
    state
        .store
        .find_template(template_id)
        .await?
        .ok_or_else(|| AppError::not_found("template not found"))?;

    let grants = state.store.template_grants(template_id).await?;
    Ok(Json(grants))
}
