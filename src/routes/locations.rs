use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::{AuthenticatedUser, ADMIN_SUBJECT},
    error::{AppError, AppResult},
    models::{Employee, EmployeeLocation, LocationHistoryRecord, NewNotification},
    schema::{employee_locations, employees, location_history, notifications},
    state::AppState,
    tracking::{reporter, Fix, SessionView, ToggleError, ToggleOutcome},
};

pub const KIND_LOCATION_OFF: &str = "location_off";

/// Raw device coordinates pushed by the mobile client. Absent coordinates
/// (permission denied on the device) are allowed; the reporter substitutes
/// the demo location.
#[derive(Deserialize)]
pub struct FixRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub async fn push_fix(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<FixRequest>,
) -> AppResult<Json<SessionView>> {
    let employee_id = user.employee_id()?;
    let now = state.clock.now();
    let fix = match (payload.lat, payload.lon) {
        (Some(lat), Some(lon)) => Some(Fix { lat, lon }),
        _ => None,
    };
    Ok(Json(state.tracker.record_fix(employee_id, fix, now)))
}

/// The employee's own tracking state, including any pending notice (for
/// example the forced disable at the end of office hours).
pub async fn session_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<SessionView>> {
    let employee_id = user.employee_id()?;
    Ok(Json(
        state.tracker.session_view(employee_id, state.clock.now()),
    ))
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub sharing: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<reporter::SampleRecord>,
}

/// Manual sharing toggle. Turning on records a sample in the same request;
/// turning off notifies the admin before the response is sent.
pub async fn toggle_sharing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<Json<ToggleResponse>> {
    let employee_id = user.employee_id()?;
    let now = state.clock.now();

    let outcome = state
        .tracker
        .toggle(employee_id, payload.enabled, now)
        .map_err(|err| match err {
            ToggleError::OutsideOfficeHours { .. } => AppError::bad_request(err.to_string()),
        })?;

    match outcome {
        ToggleOutcome::Enabled => {
            let fix = state.tracker.last_fix(employee_id);
            let sample = reporter::record_sample(&state, employee_id, fix)
                .await
                .map_err(AppError::from)?;
            Ok(Json(ToggleResponse {
                sharing: true,
                message: "Location sharing enabled".to_string(),
                sample: Some(sample),
            }))
        }
        ToggleOutcome::Disabled => {
            notify_admin_location_off(&state, employee_id)?;
            Ok(Json(ToggleResponse {
                sharing: false,
                message: "Location sharing disabled. Admin has been notified.".to_string(),
                sample: None,
            }))
        }
    }
}

fn notify_admin_location_off(state: &AppState, employee_id: Uuid) -> AppResult<()> {
    let mut conn = state.db()?;
    let employee: Employee = employees::table.find(employee_id).first(&mut conn)?;

    let notification = NewNotification {
        id: Uuid::new_v4(),
        recipient_id: ADMIN_SUBJECT.to_string(),
        recipient_name: "HR Department".to_string(),
        kind: KIND_LOCATION_OFF.to_string(),
        leave_id: None,
        employee_id: Some(employee.id),
        message: format!(
            "{} ({}) turned off location sharing",
            employee.name, employee.code
        ),
        payload: json!({
            "employeeName": employee.name,
            "employeeCode": employee.code,
            "employeeMobile": employee.mobile,
        }),
        status: None,
        read: false,
    };
    diesel::insert_into(notifications::table)
        .values(&notification)
        .execute(&mut conn)?;
    Ok(())
}

#[derive(Serialize)]
pub struct CurrentLocationOut {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_code: String,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub recorded_at: chrono::NaiveDateTime,
}

/// Latest known position for one employee (admin map view).
pub async fn current_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<CurrentLocationOut>> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let (location, employee): (EmployeeLocation, Employee) = employee_locations::table
        .inner_join(employees::table)
        .filter(employee_locations::employee_id.eq(employee_id))
        .first(&mut conn)?;

    Ok(Json(CurrentLocationOut {
        employee_id: location.employee_id,
        employee_name: employee.name,
        employee_code: employee.code,
        lat: location.lat,
        lon: location.lon,
        address: location.address,
        recorded_at: location.recorded_at,
    }))
}

/// Latest known positions for every active employee (admin tracking board).
pub async fn all_current_locations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<CurrentLocationOut>>> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let rows: Vec<(EmployeeLocation, Employee)> = employee_locations::table
        .inner_join(employees::table)
        .filter(employees::active.eq(true))
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|(location, employee)| CurrentLocationOut {
                employee_id: location.employee_id,
                employee_name: employee.name,
                employee_code: employee.code,
                lat: location.lat,
                lon: location.lon,
                address: location.address,
                recorded_at: location.recorded_at,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct HistoryRecordOut {
    pub id: Uuid,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub recorded_at: chrono::NaiveDateTime,
}

/// One employee's history, optionally narrowed to a single day (the admin
/// movement report).
pub async fn location_history_for(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<HistoryRecordOut>>> {
    user.require_admin()?;
    let mut conn = state.db()?;

    let mut statement = location_history::table
        .filter(location_history::employee_id.eq(employee_id))
        .order(location_history::recorded_at.asc())
        .into_boxed();
    if let Some(date) = query.date {
        let start = date.and_hms_opt(0, 0, 0).expect("valid midnight");
        let end = start + chrono::Duration::days(1);
        statement = statement
            .filter(location_history::recorded_at.ge(start))
            .filter(location_history::recorded_at.lt(end));
    }

    let rows: Vec<LocationHistoryRecord> = statement.load(&mut conn)?;
    Ok(Json(
        rows.into_iter()
            .map(|record| HistoryRecordOut {
                id: record.id,
                lat: record.lat,
                lon: record.lon,
                address: record.address,
                recorded_at: record.recorded_at,
            })
            .collect(),
    ))
}
