use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{Holiday, NewHoliday},
    schema::holidays,
    state::AppState,
};

#[derive(Serialize)]
pub struct HolidayOut {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
}

impl From<Holiday> for HolidayOut {
    fn from(holiday: Holiday) -> Self {
        Self {
            id: holiday.id,
            name: holiday.name,
            date: holiday.date,
        }
    }
}

pub async fn list_holidays(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<HolidayOut>>> {
    let mut conn = state.db()?;
    let rows: Vec<Holiday> = holidays::table.order(holidays::date.asc()).load(&mut conn)?;
    Ok(Json(rows.into_iter().map(HolidayOut::from).collect()))
}

#[derive(Deserialize)]
pub struct CreateHolidayRequest {
    pub name: String,
    pub date: NaiveDate,
}

pub async fn create_holiday(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateHolidayRequest>,
) -> AppResult<(StatusCode, Json<HolidayOut>)> {
    user.require_admin()?;
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("holiday name is required"));
    }

    let mut conn = state.db()?;
    let new_holiday = NewHoliday {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        date: payload.date,
    };
    diesel::insert_into(holidays::table)
        .values(&new_holiday)
        .execute(&mut conn)?;

    let created: Holiday = holidays::table.find(new_holiday.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(HolidayOut::from(created))))
}

pub async fn delete_holiday(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(holiday_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    let mut conn = state.db()?;
    let deleted = diesel::delete(holidays::table.find(holiday_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
