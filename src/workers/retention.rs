use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::info;

use crate::{
    jobs::JOB_SWEEP_LOCATION_HISTORY,
    schema::location_history,
    state::AppState,
};

use super::{JobExecution, JobHandler};

/// Delete every history row older than the cutoff. One statement, safe to
/// re-run; a concurrent append can never be younger than the horizon and
/// older than the cutoff at the same time.
pub fn sweep_history(
    conn: &mut PgConnection,
    cutoff: NaiveDateTime,
) -> Result<usize, diesel::result::Error> {
    diesel::delete(location_history::table.filter(location_history::recorded_at.lt(cutoff)))
        .execute(conn)
}

pub struct SweepLocationHistoryJob;

impl SweepLocationHistoryJob {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobHandler for SweepLocationHistoryJob {
    fn job_type(&self) -> &'static str {
        JOB_SWEEP_LOCATION_HISTORY
    }

    async fn handle(&self, state: Arc<AppState>, job: crate::models::Job) -> JobExecution {
        let cutoff = (state.clock.now()
            - ChronoDuration::days(state.config.history_retention_days))
        .naive_utc();

        let mut conn = match state.db() {
            Ok(conn) => conn,
            Err(err) => {
                return JobExecution::Retry {
                    delay: Duration::from_secs(30),
                    error: format!("database pool error: {err:?}"),
                }
            }
        };

        match sweep_history(&mut conn, cutoff) {
            Ok(deleted) => {
                info!(job_id = %job.id, deleted, %cutoff, "location history sweep finished");
                JobExecution::Success
            }
            Err(err) => JobExecution::Retry {
                delay: Duration::from_secs(30),
                error: format!("sweep failed: {err}"),
            },
        }
    }
}
