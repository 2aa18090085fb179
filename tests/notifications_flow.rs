mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde_json::json;
use uuid::Uuid;

async fn inbox(app: &TestApp, token: &str) -> Result<Vec<serde_json::Value>> {
    let response = app.get("/api/notifications", Some(token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn unread_count(app: &TestApp, token: &str) -> Result<i64> {
    let response = app.get("/api/notifications/unread-count", Some(token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let parsed: serde_json::Value = serde_json::from_slice(&body)?;
    Ok(parsed["count"].as_i64().unwrap())
}

#[tokio::test]
async fn inboxes_are_scoped_per_recipient() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;
    let manager = app
        .insert_employee("Ravi Iyer", "MGR001", "9876500001", "manager-pass")
        .await?;

    let employee_token = app.login_token("9876543210", "field-pass").await?;
    let manager_token = app.login_token("9876500001", "manager-pass").await?;
    let admin_token = app.admin_token().await?;

    let apply = app
        .post_json(
            "/api/leaves",
            &json!({
                "leave_type": "Earned Leave",
                "from_date": "2026-03-10",
                "to_date": "2026-03-11",
                "reason": "Trip",
                "managers": [manager],
            }),
            Some(&employee_token),
        )
        .await?;
    assert_eq!(apply.status(), StatusCode::CREATED);
    let body = body_to_vec(apply.into_body()).await?;
    let leave: serde_json::Value = serde_json::from_slice(&body)?;
    let leave_id: Uuid = serde_json::from_value(leave["id"].clone())?;

    // The manager and the admin each see the request; the employee must not
    // see their own leave_request copy.
    let manager_inbox = inbox(&app, &manager_token).await?;
    assert_eq!(manager_inbox.len(), 1);
    assert_eq!(manager_inbox[0]["kind"], "leave_request");

    let admin_inbox = inbox(&app, &admin_token).await?;
    assert_eq!(admin_inbox.len(), 1);

    let employee_inbox = inbox(&app, &employee_token).await?;
    assert!(employee_inbox.is_empty());

    assert_eq!(unread_count(&app, &manager_token).await?, 1);
    assert_eq!(unread_count(&app, &employee_token).await?, 0);

    // Approval flips the request copies to read and lands a decision
    // notification in the employee inbox.
    let approve = app
        .post_json(
            &format!("/api/leaves/{leave_id}/approve"),
            &json!({}),
            Some(&manager_token),
        )
        .await?;
    assert_eq!(approve.status(), StatusCode::OK);

    assert_eq!(unread_count(&app, &manager_token).await?, 0);
    let employee_inbox = inbox(&app, &employee_token).await?;
    assert_eq!(employee_inbox.len(), 1);
    assert_eq!(employee_inbox[0]["kind"], "leave_approved");
    assert_eq!(unread_count(&app, &employee_token).await?, 1);

    // Marking read is limited to the recipient.
    let notification_id = employee_inbox[0]["id"].as_str().unwrap().to_string();
    let not_mine = app
        .post_json(
            &format!("/api/notifications/{notification_id}/read"),
            &json!({}),
            Some(&manager_token),
        )
        .await?;
    assert_eq!(not_mine.status(), StatusCode::FORBIDDEN);

    let mark = app
        .post_json(
            &format!("/api/notifications/{notification_id}/read"),
            &json!({}),
            Some(&employee_token),
        )
        .await?;
    assert_eq!(mark.status(), StatusCode::NO_CONTENT);
    assert_eq!(unread_count(&app, &employee_token).await?, 0);

    app.cleanup().await?;
    Ok(())
}
