use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    leave::{self, LeaveError, LeaveSubmission},
    models::{Employee, Leave, LeaveApprover},
    schema::{employees, leave_approvers, leaves},
    state::AppState,
};

#[derive(Serialize)]
pub struct LeaveOut {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub days: i32,
    pub reason: String,
    pub status: String,
    pub applied_at: NaiveDateTime,
    pub decided_by: Option<String>,
    pub decided_role: Option<String>,
    pub decided_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub managers: Vec<ManagerOut>,
}

#[derive(Serialize)]
pub struct ManagerOut {
    pub id: Uuid,
    pub name: String,
}

fn leave_out(leave: Leave, approvers: Vec<LeaveApprover>) -> LeaveOut {
    LeaveOut {
        id: leave.id,
        employee_id: leave.employee_id,
        leave_type: leave.leave_type,
        from_date: leave.from_date,
        to_date: leave.to_date,
        days: leave.days,
        reason: leave.reason,
        status: leave.status,
        applied_at: leave.applied_at,
        decided_by: leave.decided_by,
        decided_role: leave.decided_role,
        decided_at: leave.decided_at,
        rejection_reason: leave.rejection_reason,
        managers: approvers
            .into_iter()
            .map(|approver| ManagerOut {
                id: approver.manager_id,
                name: approver.manager_name,
            })
            .collect(),
    }
}

#[derive(Deserialize)]
pub struct ApplyLeaveRequest {
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
    pub managers: Vec<Uuid>,
}

pub async fn apply_leave(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ApplyLeaveRequest>,
) -> AppResult<(StatusCode, Json<LeaveOut>)> {
    let employee_id = user.employee_id()?;

    if payload.reason.trim().is_empty() {
        return Err(AppError::bad_request("please enter a reason for leave"));
    }
    if payload.from_date > payload.to_date {
        return Err(AppError::bad_request("from date cannot be after to date"));
    }
    if payload.managers.is_empty() {
        return Err(AppError::bad_request("please select at least one manager"));
    }
    if payload.managers.contains(&employee_id) {
        return Err(AppError::bad_request(
            "you cannot select yourself as a manager for your own leave request",
        ));
    }

    let mut conn = state.db()?;
    let employee: Employee = employees::table.find(employee_id).first(&mut conn)?;

    let manager_rows: Vec<Employee> = employees::table
        .filter(employees::id.eq_any(&payload.managers))
        .filter(employees::active.eq(true))
        .load(&mut conn)?;
    if manager_rows.len() != payload.managers.len() {
        return Err(AppError::bad_request("one or more managers were not found"));
    }

    let submission = LeaveSubmission {
        leave_type: payload.leave_type,
        from_date: payload.from_date,
        to_date: payload.to_date,
        reason: payload.reason.trim().to_string(),
        managers: manager_rows
            .into_iter()
            .map(|manager| (manager.id, manager.name))
            .collect(),
    };

    let now = state.clock.now().naive_utc();
    let created = leave::submit(&mut conn, &employee, submission, now).map_err(map_leave_error)?;
    let approvers = approvers_for(&mut conn, created.id)?;
    Ok((StatusCode::CREATED, Json(leave_out(created, approvers))))
}

pub async fn list_all_leaves(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<LeaveOut>>> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let rows: Vec<Leave> = leaves::table
        .order(leaves::applied_at.desc())
        .load(&mut conn)?;
    collect_with_approvers(&mut conn, rows)
}

pub async fn list_my_leaves(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<LeaveOut>>> {
    let employee_id = user.employee_id()?;
    let mut conn = state.db()?;
    let rows: Vec<Leave> = leaves::table
        .filter(leaves::employee_id.eq(employee_id))
        .order(leaves::applied_at.desc())
        .load(&mut conn)?;
    collect_with_approvers(&mut conn, rows)
}

fn collect_with_approvers(
    conn: &mut PgConnection,
    rows: Vec<Leave>,
) -> AppResult<Json<Vec<LeaveOut>>> {
    let all_approvers: Vec<LeaveApprover> = LeaveApprover::belonging_to(&rows).load(conn)?;
    let grouped = all_approvers.grouped_by(&rows);
    Ok(Json(
        rows.into_iter()
            .zip(grouped)
            .map(|(leave, approvers)| leave_out(leave, approvers))
            .collect(),
    ))
}

fn approvers_for(conn: &mut PgConnection, leave_id: Uuid) -> AppResult<Vec<LeaveApprover>> {
    Ok(leave_approvers::table
        .filter(leave_approvers::leave_id.eq(leave_id))
        .load(conn)?)
}

#[derive(Deserialize, Default)]
pub struct RejectLeaveRequest {
    pub reason: Option<String>,
}

pub async fn approve_leave(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(leave_id): Path<Uuid>,
) -> AppResult<Json<LeaveOut>> {
    let actor_role = authorize_decision(&state, &user, leave_id)?;
    let now = state.clock.now().naive_utc();

    let mut conn = state.db()?;
    let leave = leave::approve(&mut conn, leave_id, &user.name, actor_role, now)
        .map_err(map_leave_error)?;
    let approvers = approvers_for(&mut conn, leave.id)?;
    Ok(Json(leave_out(leave, approvers)))
}

pub async fn reject_leave(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(leave_id): Path<Uuid>,
    payload: Option<Json<RejectLeaveRequest>>,
) -> AppResult<Json<LeaveOut>> {
    let actor_role = authorize_decision(&state, &user, leave_id)?;
    let now = state.clock.now().naive_utc();
    let reason = payload.and_then(|Json(body)| body.reason);

    let mut conn = state.db()?;
    let leave = leave::reject(&mut conn, leave_id, &user.name, actor_role, reason, now)
        .map_err(map_leave_error)?;
    let approvers = approvers_for(&mut conn, leave.id)?;
    Ok(Json(leave_out(leave, approvers)))
}

/// Only the admin or one of the selected managers may decide a request.
fn authorize_decision(
    state: &AppState,
    user: &AuthenticatedUser,
    leave_id: Uuid,
) -> AppResult<&'static str> {
    if user.is_admin() {
        return Ok("Admin");
    }
    let manager_id = user.employee_id()?;
    let mut conn = state.db()?;
    let selected: i64 = leave_approvers::table
        .filter(leave_approvers::leave_id.eq(leave_id))
        .filter(leave_approvers::manager_id.eq(manager_id))
        .count()
        .get_result(&mut conn)?;
    if selected == 0 {
        return Err(AppError::forbidden(
            "only a selected manager can act on this leave request",
        ));
    }
    Ok("Manager")
}

fn map_leave_error(err: LeaveError) -> AppError {
    match err {
        LeaveError::NotFound => AppError::not_found(),
        LeaveError::AlreadyDecided(status) => {
            AppError::conflict(format!("leave request is already {status}"))
        }
        LeaveError::UnknownLeaveType(leave_type) => {
            AppError::bad_request(format!("unknown leave type: {leave_type}"))
        }
        LeaveError::Database(err) => AppError::from(err),
    }
}
