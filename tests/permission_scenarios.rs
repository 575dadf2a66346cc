mod common;

use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use template_gate::authz::{require_permission, CurrentUser, PermissionLevel, RequireExt, REQUIRE_EMPLOYEE};
use template_gate::AppState;

async fn whoami(CurrentUser(user): CurrentUser) -> axum::Json<serde_json::Value> {
    axum::Json(json!({ "id": user.id, "role": user.role }))
}

/// A router with one guarded operation per scenario, declared as data.
fn scenario_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/reports/export",
            get(whoami).require(&state, require_permission("reports", "export", PermissionLevel::Delete)),
        )
        .route(
            "/users/delete",
            get(whoami).require(&state, require_permission("users", "delete", PermissionLevel::Read)),
        )
        .route(
            "/invoices/update",
            get(whoami).require(&state, require_permission("invoices", "update", PermissionLevel::Create)),
        )
        .route(
            "/invoices/read",
            get(whoami).require(&state, require_permission("invoices", "update", PermissionLevel::Update)),
        )
        .route(
            "/ghosts/haunt",
            get(whoami).require(&state, require_permission("ghosts", "haunt", PermissionLevel::Read)),
        )
        .with_state(state)
}

#[tokio::test]
async fn admin_with_delete_grant_can_export_reports() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 1, true).await?;
    let template_id = common::insert_template(&db.pool, "Admin", true).await?;
    let permission_id = common::insert_permission(&db.pool, "reports", "export").await?;
    common::insert_item(&db.pool, template_id, permission_id, 4).await?;

    let app = scenario_router(common::state(&db.pool));
    let token = common::token_for(user_id);

    let (status, body) = common::get(&app, "/reports/export", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], json!(user_id));
    assert_eq!(body["role"], json!(1));

    Ok(())
}

#[tokio::test]
async fn guest_without_binding_is_forbidden() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 5, true).await?;
    common::insert_template(&db.pool, "Guest", true).await?;
    common::insert_permission(&db.pool, "users", "delete").await?;

    let app = scenario_router(common::state(&db.pool));
    let (status, body) = common::get(&app, "/users/delete", Some(&common::token_for(user_id))).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["reason"], "role_lacks_permission");

    Ok(())
}

#[tokio::test]
async fn unmapped_role_is_a_server_side_configuration_error() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 99, true).await?;
    let template_id = common::insert_template(&db.pool, "Admin", true).await?;
    let permission_id = common::insert_permission(&db.pool, "reports", "export").await?;
    common::insert_item(&db.pool, template_id, permission_id, 4).await?;

    let app = scenario_router(common::state(&db.pool));
    let token = common::token_for(user_id);

    for uri in ["/reports/export", "/users/delete", "/ghosts/haunt"] {
        let (status, body) = common::get(&app, uri, Some(&token)).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["error"], "configuration");
        assert_eq!(body["reason"], "invalid_role");
    }

    Ok(())
}

#[tokio::test]
async fn manager_below_required_level_gets_both_levels() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 2, true).await?;
    let template_id = common::insert_template(&db.pool, "Manager", true).await?;
    let permission_id = common::insert_permission(&db.pool, "invoices", "update").await?;
    common::insert_item(&db.pool, template_id, permission_id, 2).await?;

    let app = scenario_router(common::state(&db.pool));
    let token = common::token_for(user_id);

    let (status, body) = common::get(&app, "/invoices/update", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "insufficient_level");
    assert_eq!(body["required"], 3);
    assert_eq!(body["actual"], 2);

    // same binding satisfies a requirement at its own level
    let (status, _) = common::get(&app, "/invoices/read", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn inactive_user_is_forbidden_before_permission_lookup() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 1, false).await?;

    let app = scenario_router(common::state(&db.pool));
    let (status, body) = common::get(&app, "/ghosts/haunt", Some(&common::token_for(user_id))).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "inactive");

    Ok(())
}

#[tokio::test]
async fn unregistered_permission_fails_regardless_of_role() -> Result<()> {
    let db = common::setup_db().await?;
    for name in ["Admin", "Manager", "Collaborator", "Reader", "Guest"] {
        common::insert_template(&db.pool, name, true).await?;
    }

    let app = scenario_router(common::state(&db.pool));
    for role in 1..=5 {
        let user_id = common::insert_user(&db.pool, role, true).await?;
        let (status, body) = common::get(&app, "/ghosts/haunt", Some(&common::token_for(user_id))).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "role {}", role);
        assert_eq!(body["reason"], "permission_not_registered");
    }

    Ok(())
}

#[tokio::test]
async fn inactive_template_is_treated_as_missing() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 4, true).await?;
    let template_id = common::insert_template(&db.pool, "Reader", false).await?;
    let permission_id = common::insert_permission(&db.pool, "users", "delete").await?;
    common::insert_item(&db.pool, template_id, permission_id, 4).await?;

    let app = scenario_router(common::state(&db.pool));
    let (status, body) = common::get(&app, "/users/delete", Some(&common::token_for(user_id))).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "no_template_for_role");

    Ok(())
}

#[tokio::test]
async fn repeated_checks_give_identical_outcomes() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 2, true).await?;
    let template_id = common::insert_template(&db.pool, "Manager", true).await?;
    let permission_id = common::insert_permission(&db.pool, "invoices", "update").await?;
    common::insert_item(&db.pool, template_id, permission_id, 2).await?;

    let app = scenario_router(common::state(&db.pool));
    let token = common::token_for(user_id);

    let first = common::get(&app, "/invoices/update", Some(&token)).await?;
    let second = common::get(&app, "/invoices/update", Some(&token)).await?;
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn out_of_range_stored_level_is_a_configuration_error() -> Result<()> {
    let db = common::setup_db().await?;
    let user_id = common::insert_user(&db.pool, 1, true).await?;
    let template_id = common::insert_template(&db.pool, "Admin", true).await?;
    let permission_id = common::insert_permission(&db.pool, "reports", "export").await?;
    common::insert_item(&db.pool, template_id, permission_id, 7).await?;

    let app = scenario_router(common::state(&db.pool));
    let (status, body) = common::get(&app, "/reports/export", Some(&common::token_for(user_id))).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["reason"], "invalid_permission_level");

    Ok(())
}

#[tokio::test]
async fn router_level_guard_covers_every_route() -> Result<()> {
    let db = common::setup_db().await?;
    let collaborator = common::insert_user(&db.pool, 3, true).await?;
    let reader = common::insert_user(&db.pool, 4, true).await?;

    let state = common::state(&db.pool);
    let app = Router::<AppState>::new()
        .route("/staff/a", get(whoami))
        .route("/staff/b", get(whoami))
        .require(&state, REQUIRE_EMPLOYEE)
        .with_state(state);

    for uri in ["/staff/a", "/staff/b"] {
        let (status, body) = common::get(&app, uri, Some(&common::token_for(collaborator))).await?;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["role"], 3);

        let (status, body) = common::get(&app, uri, Some(&common::token_for(reader))).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["reason"], "role_too_low");
        assert_eq!(body["required"], 3);
        assert_eq!(body["actual"], 4);
    }

    Ok(())
}
