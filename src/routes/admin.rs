use axum::{extract::State, Json};
use chrono::Duration as ChronoDuration;
use diesel::prelude::*;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::{
    auth::{AuthenticatedUser, ADMIN_SUBJECT},
    error::AppResult,
    jobs::{self, JOB_SWEEP_LOCATION_HISTORY},
    leave::STATUS_PENDING,
    schema::{employees, leaves, location_history, notifications},
    state::AppState,
};

#[derive(Serialize)]
pub struct OverviewResponse {
    pub active_employees: i64,
    pub pending_leaves: i64,
    pub unread_notifications: i64,
    pub history_rows: i64,
}

/// Dashboard aggregates. Loading the overview also enqueues a deferred
/// history sweep (unless one is already active) so routine admin visits
/// keep the history table within the retention horizon.
pub async fn overview(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<OverviewResponse>> {
    user.require_admin()?;
    let mut conn = state.db()?;

    let active_employees: i64 = employees::table
        .filter(employees::active.eq(true))
        .count()
        .get_result(&mut conn)?;
    let pending_leaves: i64 = leaves::table
        .filter(leaves::status.eq(STATUS_PENDING))
        .count()
        .get_result(&mut conn)?;
    let unread_notifications: i64 = notifications::table
        .filter(notifications::recipient_id.eq(ADMIN_SUBJECT))
        .filter(notifications::read.eq(false))
        .count()
        .get_result(&mut conn)?;
    let history_rows: i64 = location_history::table.count().get_result(&mut conn)?;

    schedule_sweep(&state, &mut conn);

    Ok(Json(OverviewResponse {
        active_employees,
        pending_leaves,
        unread_notifications,
        history_rows,
    }))
}

/// Best-effort: a failed enqueue must not break the dashboard.
fn schedule_sweep(state: &AppState, conn: &mut diesel::pg::PgConnection) {
    let run_after =
        (state.clock.now() + ChronoDuration::seconds(state.config.sweep_defer_seconds)).naive_utc();
    match jobs::has_active_job(conn, JOB_SWEEP_LOCATION_HISTORY) {
        Ok(true) => {}
        Ok(false) => {
            if let Err(err) =
                jobs::enqueue_job(conn, JOB_SWEEP_LOCATION_HISTORY, json!({}), Some(run_after))
            {
                warn!(error = %err, "failed to enqueue location history sweep");
            }
        }
        Err(err) => warn!(error = %err, "failed to check for active sweep job"),
    }
}
