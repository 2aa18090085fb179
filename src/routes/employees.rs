use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    models::{Employee, NewEmployee},
    schema::employees,
    state::AppState,
};

#[derive(Serialize)]
pub struct EmployeeOut {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub mobile: String,
    pub designation: String,
    pub department: String,
    pub active: bool,
    pub profile_image: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Employee> for EmployeeOut {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            code: employee.code,
            mobile: employee.mobile,
            designation: employee.designation,
            department: employee.department,
            active: employee.active,
            profile_image: employee.profile_image,
            created_at: employee.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub code: String,
    pub mobile: String,
    pub password: String,
    pub designation: String,
    #[serde(default)]
    pub department: String,
}

fn validate_new_employee(payload: &CreateEmployeeRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    if payload.code.trim().is_empty() {
        return Err(AppError::bad_request("employee code is required"));
    }
    validate_mobile(&payload.mobile)?;
    validate_password(&payload.password)?;
    if payload.designation.trim().is_empty() {
        return Err(AppError::bad_request("designation is required"));
    }
    Ok(())
}

fn validate_mobile(mobile: &str) -> Result<(), AppError> {
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::bad_request("mobile number must be 10 digits"));
    }
    Ok(())
}

fn validate_password(password_input: &str) -> Result<(), AppError> {
    if password_input.len() < 6 {
        return Err(AppError::bad_request(
            "password must be at least 6 characters",
        ));
    }
    Ok(())
}

// Every signed-in user may read the directory; the leave form needs it for
// manager selection.
pub async fn list_employees(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<EmployeeOut>>> {
    let mut conn = state.db()?;
    let rows: Vec<Employee> = employees::table
        .filter(employees::active.eq(true))
        .order(employees::name.asc())
        .load(&mut conn)?;
    Ok(Json(rows.into_iter().map(EmployeeOut::from).collect()))
}

pub async fn create_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<EmployeeOut>)> {
    user.require_admin()?;
    validate_new_employee(&payload)?;

    let mut conn = state.db()?;
    ensure_unique(&mut conn, &payload.code, &payload.mobile, None)?;

    let password_hash = password::hash_password(&payload.password)?;
    let new_employee = NewEmployee {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        code: payload.code.trim().to_string(),
        mobile: payload.mobile.clone(),
        password_hash,
        designation: payload.designation.trim().to_string(),
        department: payload.department.trim().to_string(),
        active: true,
        profile_image: None,
    };

    match diesel::insert_into(employees::table)
        .values(&new_employee)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::bad_request(
                "employee code or mobile number already exists",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let employee: Employee = employees::table.find(new_employee.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(EmployeeOut::from(employee))))
}

fn ensure_unique(
    conn: &mut PgConnection,
    code: &str,
    mobile: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut code_query = employees::table
        .filter(employees::code.eq(code))
        .into_boxed();
    let mut mobile_query = employees::table
        .filter(employees::mobile.eq(mobile))
        .into_boxed();
    if let Some(id) = exclude {
        code_query = code_query.filter(employees::id.ne(id));
        mobile_query = mobile_query.filter(employees::id.ne(id));
    }

    if code_query.first::<Employee>(conn).optional()?.is_some() {
        return Err(AppError::bad_request("employee code already exists"));
    }
    if mobile_query.first::<Employee>(conn).optional()?.is_some() {
        return Err(AppError::bad_request("mobile number already exists"));
    }
    Ok(())
}

pub async fn get_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<EmployeeOut>> {
    if !user.is_admin() && user.employee_id()? != employee_id {
        return Err(AppError::forbidden("cannot view another employee"));
    }
    let mut conn = state.db()?;
    let employee: Employee = employees::table.find(employee_id).first(&mut conn)?;
    Ok(Json(EmployeeOut::from(employee)))
}

#[derive(Deserialize)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub active: Option<bool>,
    pub profile_image: Option<String>,
}

pub async fn update_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> AppResult<Json<EmployeeOut>> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let existing: Employee = employees::table.find(employee_id).first(&mut conn)?;

    let name = match payload.name {
        Some(value) if value.trim().is_empty() => {
            return Err(AppError::bad_request("name must not be empty"))
        }
        Some(value) => value.trim().to_string(),
        None => existing.name.clone(),
    };
    let mobile = match payload.mobile {
        Some(value) => {
            validate_mobile(&value)?;
            if value != existing.mobile {
                ensure_unique(&mut conn, &existing.code, &value, Some(employee_id))?;
            }
            value
        }
        None => existing.mobile.clone(),
    };

    let now = Utc::now().naive_utc();
    diesel::update(employees::table.find(employee_id))
        .set((
            employees::name.eq(name),
            employees::mobile.eq(mobile),
            employees::designation
                .eq(payload.designation.unwrap_or_else(|| existing.designation.clone())),
            employees::department
                .eq(payload.department.unwrap_or_else(|| existing.department.clone())),
            employees::active.eq(payload.active.unwrap_or(existing.active)),
            employees::profile_image
                .eq(payload.profile_image.or_else(|| existing.profile_image.clone())),
            employees::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let updated: Employee = employees::table.find(employee_id).first(&mut conn)?;
    Ok(Json(EmployeeOut::from(updated)))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let deleted = diesel::delete(employees::table.find(employee_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    if !user.is_admin() && user.employee_id()? != employee_id {
        return Err(AppError::forbidden("cannot change another employee's password"));
    }
    validate_password(&payload.password)?;

    let mut conn = state.db()?;
    let password_hash = password::hash_password(&payload.password)?;
    let updated = diesel::update(employees::table.find(employee_id))
        .set((
            employees::password_hash.eq(password_hash),
            employees::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;
    if updated == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ImportEmployeesRequest {
    pub employees: Vec<CreateEmployeeRequest>,
}

#[derive(Serialize)]
pub struct ImportEmployeesResponse {
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Bulk import: each row is validated and inserted independently, so one
/// duplicate code does not sink the whole batch.
pub async fn import_employees(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ImportEmployeesRequest>,
) -> AppResult<Json<ImportEmployeesResponse>> {
    user.require_admin()?;
    let mut conn = state.db()?;

    let mut imported = 0;
    let mut errors = Vec::new();
    for row in payload.employees {
        let code = row.code.clone();
        match import_one(&mut conn, row) {
            Ok(()) => imported += 1,
            Err(err) => errors.push(format!("{code}: {err}")),
        }
    }

    Ok(Json(ImportEmployeesResponse {
        imported,
        failed: errors.len(),
        errors,
    }))
}

fn import_one(conn: &mut PgConnection, row: CreateEmployeeRequest) -> anyhow::Result<()> {
    validate_new_employee(&row).map_err(|err| anyhow::anyhow!("{}", err.message()))?;
    let exists: i64 = employees::table
        .filter(
            employees::code
                .eq(row.code.trim())
                .or(employees::mobile.eq(&row.mobile)),
        )
        .count()
        .get_result(conn)?;
    if exists > 0 {
        anyhow::bail!("code or mobile already exists");
    }

    let new_employee = NewEmployee {
        id: Uuid::new_v4(),
        name: row.name.trim().to_string(),
        code: row.code.trim().to_string(),
        mobile: row.mobile,
        password_hash: password::hash_password(&row.password)?,
        designation: row.designation.trim().to_string(),
        department: row.department.trim().to_string(),
        active: true,
        profile_image: None,
    };
    diesel::insert_into(employees::table)
        .values(&new_employee)
        .execute(conn)?;
    Ok(())
}
