use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{Employee, NewSalarySlip, SalarySlip},
    schema::{employees, salary_slips},
    state::AppState,
};

#[derive(Serialize)]
pub struct SalarySlipOut {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_code: String,
    pub month: String,
    pub year: i32,
    pub file_name: String,
    pub uploaded_at: NaiveDateTime,
}

impl From<SalarySlip> for SalarySlipOut {
    fn from(slip: SalarySlip) -> Self {
        Self {
            id: slip.id,
            employee_id: slip.employee_id,
            employee_name: slip.employee_name,
            employee_code: slip.employee_code,
            month: slip.month,
            year: slip.year,
            file_name: slip.file_name,
            uploaded_at: slip.uploaded_at,
        }
    }
}

#[derive(Deserialize)]
pub struct UploadSlipRequest {
    pub month: String,
    pub year: i32,
    pub file_name: String,
    /// Base64-encoded PDF, stored inline like the rest of the record.
    pub file_data: String,
}

pub async fn upload_slip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
    Json(payload): Json<UploadSlipRequest>,
) -> AppResult<(StatusCode, Json<SalarySlipOut>)> {
    user.require_admin()?;
    if payload.month.trim().is_empty() {
        return Err(AppError::bad_request("month is required"));
    }
    if payload.file_name.trim().is_empty() || payload.file_data.is_empty() {
        return Err(AppError::bad_request("slip file is required"));
    }

    let mut conn = state.db()?;
    let employee: Employee = employees::table
        .find(employee_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let slip = NewSalarySlip {
        id: Uuid::new_v4(),
        employee_id,
        month: payload.month.trim().to_string(),
        year: payload.year,
        file_name: payload.file_name.trim().to_string(),
        file_data: payload.file_data,
        employee_name: employee.name,
        employee_code: employee.code,
        uploaded_at: state.clock.now().naive_utc(),
    };
    diesel::insert_into(salary_slips::table)
        .values(&slip)
        .execute(&mut conn)?;

    let created: SalarySlip = salary_slips::table.find(slip.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(SalarySlipOut::from(created))))
}

pub async fn list_slips_for(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Vec<SalarySlipOut>>> {
    if !user.is_admin() && user.employee_id()? != employee_id {
        return Err(AppError::forbidden("cannot view another employee's slips"));
    }
    let mut conn = state.db()?;
    let rows: Vec<SalarySlip> = salary_slips::table
        .filter(salary_slips::employee_id.eq(employee_id))
        .order(salary_slips::uploaded_at.desc())
        .load(&mut conn)?;
    Ok(Json(rows.into_iter().map(SalarySlipOut::from).collect()))
}

pub async fn list_all_slips(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<SalarySlipOut>>> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let rows: Vec<SalarySlip> = salary_slips::table
        .order(salary_slips::uploaded_at.desc())
        .load(&mut conn)?;
    Ok(Json(rows.into_iter().map(SalarySlipOut::from).collect()))
}

#[derive(Serialize)]
pub struct SlipFileResponse {
    pub file_name: String,
    pub file_data: String,
}

/// The inline file payload, fetched separately so list responses stay small.
pub async fn download_slip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slip_id): Path<Uuid>,
) -> AppResult<Json<SlipFileResponse>> {
    let mut conn = state.db()?;
    let slip: SalarySlip = salary_slips::table
        .find(slip_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    if !user.is_admin() && user.employee_id()? != slip.employee_id {
        return Err(AppError::forbidden("cannot download another employee's slip"));
    }
    Ok(Json(SlipFileResponse {
        file_name: slip.file_name,
        file_data: slip.file_data,
    }))
}

pub async fn delete_slip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slip_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let deleted = diesel::delete(salary_slips::table.find(slip_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
