use std::borrow::Cow;

use crate::db::AuthzStore;
use crate::errors::{AppResult, Denial};
use crate::jwt::JwtConfig;
use crate::models::user::User;

use super::{evaluator, principal, LegacyRole, PermissionLevel};

/// A reusable authorization requirement, declared once and attached to routes.
///
/// Role checks compare the legacy numeric role; permission checks resolve the
/// role's template grants. Both variants coexist and routes pick whichever
/// guarantee they need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Role {
        minimum_role: i64,
    },
    Permission {
        entity: Cow<'static, str>,
        action: Cow<'static, str>,
        min_level: PermissionLevel,
    },
}

pub const REQUIRE_ADMIN: Check = require_role(LegacyRole::Admin.rank());
pub const REQUIRE_MANAGER: Check = require_role(LegacyRole::Manager.rank());
pub const REQUIRE_EMPLOYEE: Check = require_role(LegacyRole::Collaborator.rank());
pub const REQUIRE_ANY_USER: Check = require_role(LegacyRole::Guest.rank());

/// Allows users whose role number is `minimum_role` or lower.
pub const fn require_role(minimum_role: i64) -> Check {
    Check::Role { minimum_role }
}

pub fn require_permission(
    entity: impl Into<Cow<'static, str>>,
    action: impl Into<Cow<'static, str>>,
    min_level: PermissionLevel,
) -> Check {
    Check::Permission {
        entity: entity.into(),
        action: action.into(),
        min_level,
    }
}

impl Check {
    /// Runs the check against an already resolved user and hands the user back.
    pub async fn authorize(&self, store: &dyn AuthzStore, user: User) -> AppResult<User> {
        match self {
            Check::Role { minimum_role } => check_role(*minimum_role, user),
            Check::Permission {
                entity,
                action,
                min_level,
            } => {
                evaluator::check_permission(store, &user, entity, action, *min_level).await?;
                Ok(user)
            }
        }
    }

    /// Resolves the bearer token, then runs the check.
    pub async fn enforce(&self, store: &dyn AuthzStore, jwt: &JwtConfig, token: Option<&str>) -> AppResult<User> {
        let user = principal::resolve(store, jwt, token).await?;
        self.authorize(store, user).await
    }
}

pub fn check_role(minimum_role: i64, user: User) -> AppResult<User> {
    if user.role > minimum_role {
        tracing::debug!(
            user_id = %user.id,
            required = minimum_role,
            actual = user.role,
            "role too low"
        );
        return Err(Denial::RoleTooLow {
            required: minimum_role,
            actual: user.role,
        }
        .into());
    }

    Ok(user)
}
