mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};

#[tokio::test]
async fn employee_login_and_me() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;
    let token = app.login_token("9876543210", "field-pass").await?;

    let me = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(me.status(), StatusCode::OK);
    let body = body_to_vec(me.into_body()).await?;
    let parsed: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(parsed["role"], "employee");
    assert_eq!(parsed["name"], "Asha Verma");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;

    let response = app
        .post_json(
            "/api/auth/login",
            &serde_json::json!({
                "identifier": "9876543210",
                "password": "not-the-password"
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn admin_logs_in_with_email() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let token = app.login_token(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let me = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(me.status(), StatusCode::OK);
    let body = body_to_vec(me.into_body()).await?;
    let parsed: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(parsed["role"], "admin");

    // The admin email with the wrong password must not get in.
    let bad = app
        .post_json(
            "/api/auth/login",
            &serde_json::json!({
                "identifier": ADMIN_EMAIL,
                "password": "wrong"
            }),
            None,
        )
        .await?;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app.get("/api/employees", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}
