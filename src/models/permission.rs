use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::authz::{PermissionLevel, PermissionScope};

// =============================================================================
// PERMISSION TEMPLATE
// =============================================================================

/// A named bundle of grants, selected by the legacy role's template name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionTemplate {
    pub id: Uuid,
    #[schema(example = "Manager")]
    pub role_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// PERMISSION
// =============================================================================

/// A registered (entity, action) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    pub id: Uuid,
    #[schema(example = "reports")]
    pub entity: String,
    #[schema(example = "export")]
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn key(&self) -> String {
        format!("{}:{}", self.entity, self.action)
    }
}

// =============================================================================
// TEMPLATE ITEM (binding)
// =============================================================================

/// Grants one permission to one template at a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionTemplateItem {
    pub id: Uuid,
    pub template_id: Uuid,
    pub permission_id: Uuid,
    #[schema(value_type = i64, example = 2)]
    pub level: PermissionLevel,
    #[schema(value_type = String, example = "all")]
    pub scope: PermissionScope,
}

// =============================================================================
// READ MODELS
// =============================================================================

/// A template item joined with the permission it grants.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TemplateGrant {
    pub permission_id: Uuid,
    pub entity: String,
    pub action: String,
    #[schema(value_type = i64, example = 4)]
    pub level: PermissionLevel,
    #[schema(value_type = String, example = "all")]
    pub scope: PermissionScope,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionCheckQuery {
    #[param(example = "invoices")]
    pub entity: String,
    #[param(example = "update")]
    pub action: String,
    /// Minimum level 0-4, defaults to 1 (read)
    #[param(value_type = Option<i64>, example = 2)]
    pub min_level: Option<PermissionLevel>,
}

/// Outcome of a dry-run permission check against another user.
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCheckReport {
    pub user_id: Uuid,
    pub entity: String,
    pub action: String,
    #[schema(value_type = i64)]
    pub required: PermissionLevel,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub granted: Option<PermissionLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
