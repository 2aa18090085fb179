mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde_json::json;

#[tokio::test]
async fn admin_creates_and_updates_an_employee() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let admin_token = app.admin_token().await?;

    let create = app
        .post_json(
            "/api/employees",
            &json!({
                "name": "Asha Verma",
                "code": "EMP001",
                "mobile": "9876543210",
                "password": "field-pass",
                "designation": "Field Executive",
                "department": "Operations"
            }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(create.status(), StatusCode::CREATED);
    let body = body_to_vec(create.into_body()).await?;
    let created: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(created["code"], "EMP001");
    assert!(created.get("password_hash").is_none());
    let employee_id = created["id"].as_str().unwrap().to_string();

    // The new employee can sign in right away.
    app.login_token("9876543210", "field-pass").await?;

    let update = app
        .patch_json(
            &format!("/api/employees/{employee_id}"),
            &json!({ "designation": "Senior Field Executive" }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(update.status(), StatusCode::OK);
    let body = body_to_vec(update.into_body()).await?;
    let updated: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(updated["designation"], "Senior Field Executive");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn create_validations_run_before_any_write() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let admin_token = app.admin_token().await?;

    let short_mobile = app
        .post_json(
            "/api/employees",
            &json!({
                "name": "Asha Verma",
                "code": "EMP001",
                "mobile": "98765",
                "password": "field-pass",
                "designation": "Field Executive"
            }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(short_mobile.status(), StatusCode::BAD_REQUEST);

    let weak_password = app
        .post_json(
            "/api/employees",
            &json!({
                "name": "Asha Verma",
                "code": "EMP001",
                "mobile": "9876543210",
                "password": "abc",
                "designation": "Field Executive"
            }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(weak_password.status(), StatusCode::BAD_REQUEST);

    app.insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;
    let duplicate_code = app
        .post_json(
            "/api/employees",
            &json!({
                "name": "Someone Else",
                "code": "EMP001",
                "mobile": "9876543211",
                "password": "other-pass",
                "designation": "Clerk"
            }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(duplicate_code.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn employee_cannot_use_admin_endpoints() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;
    let token = app.login_token("9876543210", "field-pass").await?;

    let create = app
        .post_json(
            "/api/employees",
            &json!({
                "name": "Intruder",
                "code": "EMP999",
                "mobile": "9876543299",
                "password": "whatever",
                "designation": "None"
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(create.status(), StatusCode::FORBIDDEN);

    let overview = app.get("/api/admin/overview", Some(&token)).await?;
    assert_eq!(overview.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn bulk_import_reports_per_row_failures() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let admin_token = app.admin_token().await?;

    app.insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;

    let import = app
        .post_json(
            "/api/employees/import",
            &json!({
                "employees": [
                    {
                        "name": "Ravi Iyer",
                        "code": "MGR001",
                        "mobile": "9876500001",
                        "password": "manager-pass",
                        "designation": "Manager"
                    },
                    {
                        "name": "Duplicate",
                        "code": "EMP001",
                        "mobile": "9876500002",
                        "password": "other-pass",
                        "designation": "Clerk"
                    }
                ]
            }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(import.status(), StatusCode::OK);
    let body = body_to_vec(import.into_body()).await?;
    let parsed: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(parsed["imported"], 1);
    assert_eq!(parsed["failed"], 1);
    assert!(parsed["errors"][0].as_str().unwrap().starts_with("EMP001"));

    app.cleanup().await?;
    Ok(())
}
