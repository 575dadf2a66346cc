use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::authz::PermissionLevel;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(#[from] Denial),
    #[error("configuration error: {0}")]
    Configuration(#[from] Misconfiguration),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error: {0}")]
    Internal(String),
}

/// A legitimate authorization refusal: the caller is known but not allowed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    #[error("inactive user")]
    Inactive,
    #[error("role level {required} or higher is required")]
    RoleTooLow { required: i64, actual: i64 },
    #[error("no permission template configured for role {role_name}")]
    NoTemplateForRole { role_name: String },
    #[error("role {role_name} has no permission for {entity}:{action}")]
    RoleLacksPermission {
        role_name: String,
        entity: String,
        action: String,
    },
    #[error("insufficient permission level: requires {required}, has {actual}")]
    InsufficientLevel {
        required: PermissionLevel,
        actual: PermissionLevel,
    },
}

impl Denial {
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::Inactive => "inactive",
            Denial::RoleTooLow { .. } => "role_too_low",
            Denial::NoTemplateForRole { .. } => "no_template_for_role",
            Denial::RoleLacksPermission { .. } => "role_lacks_permission",
            Denial::InsufficientLevel { .. } => "insufficient_level",
        }
    }

    /// Required and actual values, for the denials that compare two numbers.
    pub fn levels(&self) -> Option<(i64, i64)> {
        match self {
            Denial::RoleTooLow { required, actual } => Some((*required, *actual)),
            Denial::InsufficientLevel { required, actual } => Some((i64::from(*required), i64::from(*actual))),
            _ => None,
        }
    }
}

/// A system defect: the deployment is missing configuration the caller cannot fix.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Misconfiguration {
    #[error("invalid user role: {role}")]
    InvalidRole { role: i64 },
    #[error("permission not registered: {entity}:{action}")]
    PermissionNotRegistered { entity: String, action: String },
    #[error("stored permission level out of range: {value}")]
    InvalidPermissionLevel { value: i64 },
    #[error("unknown permission scope: {value}")]
    InvalidScope { value: String },
    #[error("{0}")]
    Setting(String),
}

impl Misconfiguration {
    pub fn reason(&self) -> &'static str {
        match self {
            Misconfiguration::InvalidRole { .. } => "invalid_role",
            Misconfiguration::PermissionNotRegistered { .. } => "permission_not_registered",
            Misconfiguration::InvalidPermissionLevel { .. } => "invalid_permission_level",
            Misconfiguration::InvalidScope { .. } => "invalid_scope",
            Misconfiguration::Setting(_) => "setting",
        }
    }
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(Misconfiguration::Setting(message.into()))
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Configuration(_) => "configuration",
            AppError::Unprocessable(_) => "unprocessable",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<i64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (reason, levels) = match &self {
            AppError::Forbidden(denial) => (Some(denial.reason()), denial.levels()),
            AppError::Configuration(misconfig) => {
                tracing::error!(reason = misconfig.reason(), "{}", misconfig);
                (Some(misconfig.reason()), None)
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                (None, None)
            }
            AppError::Internal(message) => {
                tracing::error!(%message, "internal error");
                (None, None)
            }
            _ => (None, None),
        };

        let payload = ErrorResponse {
            error: self.kind(),
            reason,
            message: self.to_string(),
            required: levels.map(|(required, _)| required),
            actual: levels.map(|(_, actual)| actual),
        };

        let mut response = (status, Json(payload)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misconfiguration_maps_to_server_error() {
        let err = AppError::from(Misconfiguration::InvalidRole { role: 99 });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::from(Misconfiguration::PermissionNotRegistered {
            entity: "reports".into(),
            action: "export".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn denial_maps_to_forbidden_and_reports_levels() {
        let denial = Denial::InsufficientLevel {
            required: PermissionLevel::Create,
            actual: PermissionLevel::Update,
        };
        assert_eq!(denial.levels(), Some((3, 2)));
        assert_eq!(denial.to_string(), "insufficient permission level: requires 3, has 2");
        assert_eq!(AppError::from(denial).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unauthorized_response_carries_bearer_challenge() {
        let response = AppError::unauthorized("missing token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }
}
