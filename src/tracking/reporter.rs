use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    geo,
    models::{Employee, NewEmployeeLocation, NewLocationHistoryRecord},
    schema::{employee_locations, employees, location_history},
    state::AppState,
};

use super::tracker::Fix;

/// What a single reporting tick wrote.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub recorded_at: NaiveDateTime,
}

/// One sample: resolve coordinates (demo fallback when the device never
/// produced a fix), reverse-geocode best-effort, then overwrite the current
/// location and append a history row carrying the same timestamp.
pub async fn record_sample(
    state: &AppState,
    employee_id: Uuid,
    fix: Option<Fix>,
) -> Result<SampleRecord> {
    let (lat, lon, address) = match fix {
        Some(fix) => {
            let address = match state.geocoder.reverse(fix.lat, fix.lon).await {
                Ok(address) => address,
                Err(err) => {
                    tracing::debug!(%employee_id, error = %err, "reverse geocode failed, using coordinate address");
                    geo::coordinate_address(fix.lat, fix.lon)
                }
            };
            (fix.lat, fix.lon, address)
        }
        None => (
            state.config.fallback_lat,
            state.config.fallback_lon,
            state.config.fallback_address.clone(),
        ),
    };

    let recorded_at = state.clock.now().naive_utc();
    let mut conn = state
        .db()
        .map_err(|err| anyhow!("database pool error: {err:?}"))?;

    let employee: Employee = employees::table
        .find(employee_id)
        .first(&mut conn)
        .context("employee not found for location sample")?;

    let current = NewEmployeeLocation {
        employee_id,
        lat,
        lon,
        address: address.clone(),
        recorded_at,
    };
    diesel::insert_into(employee_locations::table)
        .values(&current)
        .on_conflict(employee_locations::employee_id)
        .do_update()
        .set((
            employee_locations::lat.eq(lat),
            employee_locations::lon.eq(lon),
            employee_locations::address.eq(&address),
            employee_locations::recorded_at.eq(recorded_at),
        ))
        .execute(&mut conn)
        .context("failed to write current location")?;

    let history = NewLocationHistoryRecord {
        id: Uuid::new_v4(),
        employee_id,
        lat,
        lon,
        address: address.clone(),
        recorded_at,
        employee_name: employee.name,
        employee_code: employee.code,
        employee_mobile: employee.mobile,
    };
    diesel::insert_into(location_history::table)
        .values(&history)
        .execute(&mut conn)
        .context("failed to append location history")?;

    Ok(SampleRecord {
        lat,
        lon,
        address,
        recorded_at,
    })
}
