use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::MethodRouter;
use axum::Router;

use crate::app::AppState;
use crate::errors::AppError;

use super::principal::{bearer_token, CurrentUser};
use super::Check;

#[derive(Clone)]
struct Guard {
    state: AppState,
    check: Check,
}

async fn enforce(State(guard): State<Guard>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).map(str::to_owned);
    let user = guard
        .check
        .enforce(guard.state.store.as_ref(), &guard.state.jwt, token.as_deref())
        .await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Attaches a [`Check`] in front of a route or router.
///
/// The authorized user is stored in request extensions, so handlers can take
/// a [`CurrentUser`] without a second lookup.
///
/// ```rust,ignore
/// Router::new().route(
///     "/reports/export",
///     get(export_reports).require(&state, require_permission("reports", "export", PermissionLevel::Delete)),
/// )
/// ```
pub trait RequireExt: Sized {
    fn require(self, state: &AppState, check: Check) -> Self;
}

impl RequireExt for MethodRouter<AppState> {
    fn require(self, state: &AppState, check: Check) -> Self {
        let guard = Guard {
            state: state.clone(),
            check,
        };
        self.route_layer(middleware::from_fn_with_state(guard, enforce))
    }
}

impl RequireExt for Router<AppState> {
    fn require(self, state: &AppState, check: Check) -> Self {
        let guard = Guard {
            state: state.clone(),
            check,
        };
        self.route_layer(middleware::from_fn_with_state(guard, enforce))
    }
}
