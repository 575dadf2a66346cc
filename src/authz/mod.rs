//! Authorization - identity resolution, role gates and template permissions
//!
//! This module implements:
//! - Bearer token -> active user resolution (`CurrentUser`, `MaybeUser`)
//! - Legacy numeric role gates with fixed presets
//! - Entity/action/level checks resolved through the user's role template
//! - Route guards that attach either kind of check declaratively

mod check;
mod evaluator;
mod guard;
mod level;
mod principal;
mod role;

pub use check::{
    check_role, require_permission, require_role, Check, REQUIRE_ADMIN, REQUIRE_ANY_USER, REQUIRE_EMPLOYEE,
    REQUIRE_MANAGER,
};
pub use evaluator::{check_permission, Grant};
pub use guard::RequireExt;
pub use level::{LevelOutOfRange, PermissionLevel, PermissionScope};
pub use principal::{bearer_token, resolve, resolve_optional, CurrentUser, MaybeUser};
pub use role::LegacyRole;
