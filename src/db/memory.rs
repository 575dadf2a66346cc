//! In-process `AuthzStore` for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::store::AuthzStore;
use crate::authz::{LegacyRole, PermissionLevel, PermissionScope};
use crate::errors::AppResult;
use crate::models::permission::{Permission, PermissionTemplate, PermissionTemplateItem, TemplateGrant};
use crate::models::user::User;
use crate::params::{ListFilters, Pagination};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    templates: Vec<PermissionTemplate>,
    permissions: Vec<Permission>,
    items: Vec<PermissionTemplateItem>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    lookups: Mutex<Vec<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, role: i64, is_active: bool) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: format!("user-{role}"),
            email: format!("user-{role}@example.com"),
            role,
            is_active,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn add_template(&self, role: LegacyRole, is_active: bool) -> PermissionTemplate {
        let now = Utc::now();
        let template = PermissionTemplate {
            id: Uuid::new_v4(),
            role_name: role.template_name().to_string(),
            description: None,
            is_active,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().templates.push(template.clone());
        template
    }

    pub fn add_permission(&self, entity: &str, action: &str) -> Permission {
        let permission = Permission {
            id: Uuid::new_v4(),
            entity: entity.to_string(),
            action: action.to_string(),
            description: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().permissions.push(permission.clone());
        permission
    }

    pub fn grant(
        &self,
        template: &PermissionTemplate,
        permission: &Permission,
        level: PermissionLevel,
    ) -> PermissionTemplateItem {
        let item = PermissionTemplateItem {
            id: Uuid::new_v4(),
            template_id: template.id,
            permission_id: permission.id,
            level,
            scope: PermissionScope::All,
        };
        self.tables.lock().unwrap().items.push(item.clone());
        item
    }

    /// Names of the lookups performed so far, in call order.
    pub fn lookups(&self) -> Vec<&'static str> {
        self.lookups.lock().unwrap().clone()
    }

    fn record(&self, lookup: &'static str) {
        self.lookups.lock().unwrap().push(lookup);
    }
}

#[async_trait]
impl AuthzStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        self.record("user");
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_active_template(&self, role_name: &str) -> AppResult<Option<PermissionTemplate>> {
        self.record("template");
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .templates
            .iter()
            .find(|t| t.is_active && t.role_name == role_name)
            .cloned())
    }

    async fn find_template(&self, id: Uuid) -> AppResult<Option<PermissionTemplate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.templates.iter().find(|t| t.id == id).cloned())
    }

    async fn find_permission(&self, entity: &str, action: &str) -> AppResult<Option<Permission>> {
        self.record("permission");
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .permissions
            .iter()
            .find(|p| p.entity == entity && p.action == action)
            .cloned())
    }

    async fn find_template_item(
        &self,
        template_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<Option<PermissionTemplateItem>> {
        self.record("item");
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .items
            .iter()
            .find(|i| i.template_id == template_id && i.permission_id == permission_id)
            .cloned())
    }

    async fn list_templates(
        &self,
        filters: &ListFilters,
        pagination: &Pagination,
    ) -> AppResult<Vec<PermissionTemplate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .templates
            .iter()
            .filter(|t| !filters.active_only || t.is_active)
            .skip(pagination.skip as usize)
            .take(pagination.per_page as usize)
            .cloned()
            .collect())
    }

    async fn template_grants(&self, template_id: Uuid) -> AppResult<Vec<TemplateGrant>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .items
            .iter()
            .filter(|i| i.template_id == template_id)
            .filter_map(|i| {
                let p = tables.permissions.iter().find(|p| p.id == i.permission_id)?;
                Some(TemplateGrant {
                    permission_id: p.id,
                    entity: p.entity.clone(),
                    action: p.action.clone(),
                    level: i.level,
                    scope: i.scope,
                })
            })
            .collect())
    }
}
