//! Query-string extractors shared by list endpoints.

use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, AppResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number, starting at 1
    #[param(example = 1)]
    pub page: Option<i64>,
    /// Records per page, at most 100
    #[param(example = 20)]
    pub per_page: Option<i64>,
}

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub skip: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, max_per_page: i64) -> AppResult<Self> {
        if page < 1 {
            return Err(AppError::unprocessable("page number must be greater than 0"));
        }
        if per_page < 1 {
            return Err(AppError::unprocessable("per_page must be greater than 0"));
        }
        if per_page > max_per_page {
            return Err(AppError::unprocessable(format!(
                "at most {} records per page are allowed",
                max_per_page
            )));
        }

        let skip = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::unprocessable("page number is too large"))?;

        Ok(Self { page, per_page, skip })
    }

    pub fn from_query(query: &PaginationQuery) -> AppResult<Self> {
        Self::new(
            query.page.unwrap_or(DEFAULT_PAGE),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE),
            MAX_PER_PAGE,
        )
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            skip: 0,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PaginationQuery>::from_request_parts(parts, state)
            .await
            .map_err(|err| AppError::unprocessable(err.body_text()))?;
        Self::from_query(&query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FiltersQuery {
    /// Only include active records (default true)
    pub active_only: Option<bool>,
    /// Free-text search term
    pub search: Option<String>,
    /// Column to order by
    pub order_by: Option<String>,
    /// `asc` or `desc`
    #[param(example = "asc")]
    pub order_direction: Option<String>,
}

/// Common list filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ListFilters {
    pub active_only: bool,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub order_direction: SortDirection,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            active_only: true,
            search: None,
            order_by: None,
            order_direction: SortDirection::Asc,
        }
    }
}

impl ListFilters {
    pub fn from_query(query: FiltersQuery) -> AppResult<Self> {
        let order_direction = match query.order_direction.as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => {
                return Err(AppError::unprocessable(
                    "order_direction must be 'asc' or 'desc'",
                ))
            }
        };

        let search = query
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());

        Ok(Self {
            active_only: query.active_only.unwrap_or(true),
            search,
            order_by: query.order_by,
            order_direction,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ListFilters
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<FiltersQuery>::from_request_parts(parts, state)
            .await
            .map_err(|err| AppError::unprocessable(err.body_text()))?;
        Self::from_query(query)
    }
}
