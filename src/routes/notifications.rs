use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::{AuthenticatedUser, ADMIN_SUBJECT},
    error::{AppError, AppResult},
    leave::KIND_LEAVE_REQUEST,
    models::Notification,
    schema::notifications,
    state::AppState,
};

#[derive(Serialize)]
pub struct NotificationOut {
    pub id: Uuid,
    pub kind: String,
    pub leave_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub message: String,
    pub payload: Value,
    pub status: Option<String>,
    pub action_by: Option<String>,
    pub action_at: Option<chrono::NaiveDateTime>,
    pub read: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<Notification> for NotificationOut {
    fn from(row: Notification) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            leave_id: row.leave_id,
            employee_id: row.employee_id,
            message: row.message,
            payload: row.payload,
            status: row.status,
            action_by: row.action_by,
            action_at: row.action_at,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

/// The caller's inbox, newest first. Admins additionally see every row
/// addressed to the `admin` recipient; employees never see the
/// `leave_request` copies spawned by their own application.
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<NotificationOut>>> {
    let mut conn = state.db()?;
    let rows = inbox_rows(&mut conn, &user)?;
    Ok(Json(rows.into_iter().map(NotificationOut::from).collect()))
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// Server half of the badge counter the client polls.
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let mut conn = state.db()?;
    let count = inbox_rows(&mut conn, &user)?
        .iter()
        .filter(|row| !row.read)
        .count() as i64;
    Ok(Json(UnreadCountResponse { count }))
}

fn inbox_rows(
    conn: &mut diesel::pg::PgConnection,
    user: &AuthenticatedUser,
) -> AppResult<Vec<Notification>> {
    let rows: Vec<Notification> = if user.is_admin() {
        notifications::table
            .filter(notifications::recipient_id.eq(ADMIN_SUBJECT))
            .order(notifications::created_at.desc())
            .load(conn)?
    } else {
        let employee_id = user.employee_id()?;
        notifications::table
            .filter(notifications::recipient_id.eq(employee_id.to_string()))
            .filter(
                notifications::kind
                    .ne(KIND_LEAVE_REQUEST)
                    .or(notifications::employee_id.ne(employee_id)),
            )
            .order(notifications::created_at.desc())
            .load(conn)?
    };
    Ok(rows)
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let notification: Notification = notifications::table
        .find(notification_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let allowed = if user.is_admin() {
        notification.recipient_id == ADMIN_SUBJECT
    } else {
        notification.recipient_id == user.subject
    };
    if !allowed {
        return Err(AppError::forbidden("not the recipient of this notification"));
    }

    diesel::update(notifications::table.find(notification_id))
        .set(notifications::read.eq(true))
        .execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}
