use crate::db::AuthzStore;
use crate::errors::{AppResult, Denial, Misconfiguration};
use crate::models::permission::{Permission, PermissionTemplate, PermissionTemplateItem};
use crate::models::user::User;

use super::{LegacyRole, PermissionLevel};

/// Everything that backed a successful permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub role: LegacyRole,
    pub template: PermissionTemplate,
    pub permission: Permission,
    pub item: PermissionTemplateItem,
}

/// Resolves whether `user`'s role template grants `entity:action` at `min_level` or above.
///
/// Evaluation order:
/// 1. legacy role -> template name (unmapped role is a misconfiguration)
/// 2. active template for that name -> deny if absent
/// 3. registered permission for (entity, action) -> misconfiguration if absent
/// 4. template item binding the two -> deny if absent
/// 5. granted level vs `min_level` -> deny if lower
///
/// Lookups run one after another since each is keyed by the previous result.
pub async fn check_permission(
    store: &dyn AuthzStore,
    user: &User,
    entity: &str,
    action: &str,
    min_level: PermissionLevel,
) -> AppResult<Grant> {
    let role = LegacyRole::try_from(user.role)?;
    let role_name = role.template_name();

    let template = store
        .find_active_template(role_name)
        .await?
        .ok_or_else(|| Denial::NoTemplateForRole {
            role_name: role_name.to_string(),
        })?;

    let permission = store
        .find_permission(entity, action)
        .await?
        .ok_or_else(|| Misconfiguration::PermissionNotRegistered {
            entity: entity.to_string(),
            action: action.to_string(),
        })?;

    let item = store
        .find_template_item(template.id, permission.id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(
                user_id = %user.id,
                role = role_name,
                permission = %permission.key(),
                "role lacks permission"
            );
            Denial::RoleLacksPermission {
                role_name: role_name.to_string(),
                entity: entity.to_string(),
                action: action.to_string(),
            }
        })?;

    if item.level < min_level {
        tracing::debug!(
            user_id = %user.id,
            permission = %permission.key(),
            required = min_level.label(),
            actual = item.level.label(),
            "insufficient permission level"
        );
        return Err(Denial::InsufficientLevel {
            required: min_level,
            actual: item.level,
        }
        .into());
    }

    // Scope is carried on the grant but does not narrow access yet.
    tracing::debug!(
        user_id = %user.id,
        permission = %permission.key(),
        level = item.level.label(),
        scope = %item.scope,
        restricted = item.scope.restricts_rows(),
        "permission granted"
    );

    Ok(Grant {
        role,
        template,
        permission,
        item,
    })
}
