use axum::Json;

use crate::authz::{CurrentUser, MaybeUser};
use crate::errors::AppResult;
use crate::models::user::{GreetingResponse, User};

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Inactive user")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(CurrentUser(user): CurrentUser) -> AppResult<Json<User>> {
    Ok(Json(user))
}

/// Works with or without credentials.
#[utoipa::path(
    get,
    path = "/api/greeting",
    tag = "Auth",
    responses((status = 200, description = "Greeting", body = GreetingResponse))
)]
pub async fn greeting(MaybeUser(user): MaybeUser) -> Json<GreetingResponse> {
    let response = match user {
        Some(user) => GreetingResponse {
            message: format!("Hello {}!", user.name),
            user_id: Some(user.id),
        },
        None => GreetingResponse {
            message: "Hello guest!".to_string(),
            user_id: None,
        },
    };

    Json(response)
}
