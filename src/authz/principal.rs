use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::app::AppState;
use crate::db::AuthzStore;
use crate::errors::{AppError, AppResult, Denial};
use crate::jwt::JwtConfig;
use crate::models::user::User;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Turns a bearer token into an active user.
///
/// Missing, malformed, expired and unknown-subject tokens all fail with
/// `Unauthorized`; an inactive user fails with `Forbidden(Inactive)`.
pub async fn resolve(store: &dyn AuthzStore, jwt: &JwtConfig, token: Option<&str>) -> AppResult<User> {
    let token = token.ok_or_else(|| AppError::unauthorized("could not validate credentials"))?;
    let claims = jwt.decode(token)?;

    let user = store
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("could not validate credentials"))?;

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "inactive user rejected");
        return Err(Denial::Inactive.into());
    }

    Ok(user)
}

/// Like [`resolve`], but any failure yields `None`.
pub async fn resolve_optional(store: &dyn AuthzStore, jwt: &JwtConfig, token: Option<&str>) -> Option<User> {
    token?;
    match resolve(store, jwt, token).await {
        Ok(user) => Some(user),
        Err(err) => {
            tracing::debug!(error = %err, "treating request as anonymous");
            None
        }
    }
}

/// The authenticated user for this request.
///
/// Reuses the user a route guard already resolved, if any.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let user = resolve(state.store.as_ref(), &state.jwt, bearer_token(&parts.headers)).await?;
        Ok(CurrentUser(user))
    }
}

/// The authenticated user, or `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(CurrentUser(user)) = parts.extensions.get::<CurrentUser>() {
            return Ok(MaybeUser(Some(user.clone())));
        }

        let user = resolve_optional(state.store.as_ref(), &state.jwt, bearer_token(&parts.headers)).await;
        Ok(MaybeUser(user))
    }
}
