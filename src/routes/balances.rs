use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    leave::{self, BUCKET_CASUAL_SICK, BUCKET_COMPENSATORY_OFF, BUCKET_EARNED_LEAVE},
    models::LeaveBalance,
    schema::leave_balances,
    state::AppState,
};

#[derive(Serialize)]
pub struct BalanceOut {
    pub bucket: String,
    pub total: i32,
    pub used: i32,
    pub balance: i32,
}

impl From<LeaveBalance> for BalanceOut {
    fn from(row: LeaveBalance) -> Self {
        Self {
            bucket: row.bucket,
            total: row.total,
            used: row.used,
            balance: row.balance,
        }
    }
}

/// An employee's ledger, seeded with the policy defaults on first read.
pub async fn get_balances(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Vec<BalanceOut>>> {
    if !user.is_admin() && user.employee_id()? != employee_id {
        return Err(AppError::forbidden("cannot view another employee's balance"));
    }
    let mut conn = state.db()?;
    let rows = leave::ensure_balances(&mut conn, employee_id)?;
    Ok(Json(rows.into_iter().map(BalanceOut::from).collect()))
}

#[derive(Deserialize)]
pub struct UpdateBalanceRequest {
    pub total: Option<i32>,
    pub used: Option<i32>,
}

/// Admin direct edit of one bucket. `balance` is never accepted from the
/// client; it is always recomputed from total and used.
pub async fn update_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((employee_id, bucket)): Path<(Uuid, String)>,
    Json(payload): Json<UpdateBalanceRequest>,
) -> AppResult<Json<BalanceOut>> {
    user.require_admin()?;
    if ![BUCKET_CASUAL_SICK, BUCKET_EARNED_LEAVE, BUCKET_COMPENSATORY_OFF]
        .contains(&bucket.as_str())
    {
        return Err(AppError::bad_request(format!("unknown balance bucket: {bucket}")));
    }
    if payload.total.is_none() && payload.used.is_none() {
        return Err(AppError::bad_request("nothing to update"));
    }

    let mut conn = state.db()?;
    leave::ensure_balances(&mut conn, employee_id)?;

    let existing: LeaveBalance = leave_balances::table
        .find((employee_id, &bucket))
        .first(&mut conn)?;

    let total = payload.total.unwrap_or(existing.total);
    let used = payload.used.unwrap_or(existing.used);
    if total < 0 || used < 0 {
        return Err(AppError::bad_request("total and used must not be negative"));
    }
    let balance = total - used;

    diesel::update(leave_balances::table.find((employee_id, &bucket)))
        .set((
            leave_balances::total.eq(total),
            leave_balances::used.eq(used),
            leave_balances::balance.eq(balance),
            leave_balances::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: LeaveBalance = leave_balances::table
        .find((employee_id, &bucket))
        .first(&mut conn)?;
    Ok(Json(BalanceOut::from(updated)))
}
