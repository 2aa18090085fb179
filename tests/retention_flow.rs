mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Duration as ChronoDuration;
use common::{acquire_db_lock, kolkata, TestApp};
use diesel::prelude::*;
use hrtrack::jobs::{self, JOB_SWEEP_LOCATION_HISTORY};
use hrtrack::models::{LocationHistoryRecord, NewLocationHistoryRecord};
use hrtrack::schema::location_history;
use hrtrack::workers::retention::{self, SweepLocationHistoryJob};
use hrtrack::workers::{JobExecution, JobHandler};
use uuid::Uuid;

async fn insert_history_row(
    app: &TestApp,
    employee_id: Uuid,
    age_days: i64,
) -> Result<Uuid> {
    let recorded_at = (app.state.clock.now() - ChronoDuration::days(age_days)).naive_utc();
    app.with_conn(move |conn| {
        let record = NewLocationHistoryRecord {
            id: Uuid::new_v4(),
            employee_id,
            lat: 28.4595,
            lon: 77.0266,
            address: "Sector 51, Gurugram".to_string(),
            recorded_at,
            employee_name: "Asha Verma".to_string(),
            employee_code: "EMP001".to_string(),
            employee_mobile: "9876543210".to_string(),
        };
        diesel::insert_into(location_history::table)
            .values(&record)
            .execute(conn)?;
        Ok(record.id)
    })
    .await
}

async fn remaining_history(app: &TestApp) -> Result<Vec<LocationHistoryRecord>> {
    app.with_conn(|conn| Ok(location_history::table.load::<LocationHistoryRecord>(conn)?))
        .await
}

#[tokio::test]
async fn sweep_deletes_only_rows_past_the_horizon() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    app.clock.set(kolkata(11, 0));

    let employee_id = app
        .insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;

    let stale = insert_history_row(&app, employee_id, 11).await?;
    let boundary = insert_history_row(&app, employee_id, 9).await?;
    let fresh = insert_history_row(&app, employee_id, 1).await?;

    let cutoff = (app.state.clock.now() - ChronoDuration::days(10)).naive_utc();
    let deleted = app
        .with_conn(move |conn| Ok(retention::sweep_history(conn, cutoff)?))
        .await?;
    assert_eq!(deleted, 1);

    let remaining = remaining_history(&app).await?;
    let ids: Vec<Uuid> = remaining.iter().map(|row| row.id).collect();
    assert!(!ids.contains(&stale));
    assert!(ids.contains(&boundary));
    assert!(ids.contains(&fresh));

    // Running the sweep again deletes nothing.
    let deleted = app
        .with_conn(move |conn| Ok(retention::sweep_history(conn, cutoff)?))
        .await?;
    assert_eq!(deleted, 0);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn admin_overview_enqueues_one_deferred_sweep() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    app.clock.set(kolkata(11, 0));

    let admin_token = app.admin_token().await?;
    let overview = app.get("/api/admin/overview", Some(&admin_token)).await?;
    assert_eq!(overview.status(), StatusCode::OK);

    let queued = app.jobs_by_type(JOB_SWEEP_LOCATION_HISTORY).await?;
    assert_eq!(queued.len(), 1);
    // Deferred by the configured five seconds so it stays out of the way of
    // the dashboard load.
    let expected = (app.state.clock.now() + ChronoDuration::seconds(5)).naive_utc();
    assert_eq!(queued[0].run_after, expected);

    // A second dashboard load does not pile up another sweep.
    let again = app.get("/api/admin/overview", Some(&admin_token)).await?;
    assert_eq!(again.status(), StatusCode::OK);
    let queued = app.jobs_by_type(JOB_SWEEP_LOCATION_HISTORY).await?;
    assert_eq!(queued.len(), 1);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn sweep_job_handler_deletes_stale_rows() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    app.clock.set(kolkata(11, 0));

    let employee_id = app
        .insert_employee("Asha Verma", "EMP001", "9876543210", "field-pass")
        .await?;
    insert_history_row(&app, employee_id, 12).await?;
    insert_history_row(&app, employee_id, 2).await?;

    let job = app
        .with_conn(|conn| {
            Ok(jobs::enqueue_job(
                conn,
                JOB_SWEEP_LOCATION_HISTORY,
                serde_json::json!({}),
                None,
            )?)
        })
        .await?;

    let handler = SweepLocationHistoryJob::new();
    let outcome = handler.handle(Arc::new(app.state.clone()), job).await;
    assert!(matches!(outcome, JobExecution::Success));

    let remaining = remaining_history(&app).await?;
    assert_eq!(remaining.len(), 1);

    app.cleanup().await?;
    Ok(())
}
