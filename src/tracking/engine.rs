use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};

use crate::state::AppState;

use super::reporter;
use super::tracker::GateEvent;

/// Background half of the tracking subsystem: a 60-second office-hours poll
/// and a 30-second reporting tick over every live session. Failures are
/// logged and the next tick proceeds; this is telemetry, not a delivery
/// pipeline.
pub async fn run(state: AppState) {
    info!(
        gate_poll_seconds = state.config.gate_poll_seconds,
        sample_interval_seconds = state.config.sample_interval_seconds,
        "tracking engine started"
    );

    let mut gate_timer = interval(Duration::from_secs(state.config.gate_poll_seconds));
    let mut sample_timer = interval(Duration::from_secs(state.config.sample_interval_seconds));

    loop {
        tokio::select! {
            _ = gate_timer.tick() => gate_pass(&state).await,
            _ = sample_timer.tick() => sample_pass(&state).await,
        }
    }
}

async fn gate_pass(state: &AppState) {
    let events = state.tracker.gate_tick(state.clock.now());
    for event in events {
        match event {
            GateEvent::AutoEnabled { employee_id } => {
                info!(%employee_id, "office hours opened, sharing auto-enabled");
                let fix = state.tracker.last_fix(employee_id);
                if let Err(err) = reporter::record_sample(state, employee_id, fix).await {
                    warn!(%employee_id, error = %err, "initial sample after auto-enable failed");
                }
            }
            GateEvent::ForceDisabled { employee_id } => {
                info!(%employee_id, "office hours closed, sharing force-disabled");
            }
        }
    }
}

async fn sample_pass(state: &AppState) {
    for (employee_id, fix) in state.tracker.sampling_candidates() {
        if let Err(err) = reporter::record_sample(state, employee_id, fix).await {
            warn!(%employee_id, error = %err, "location sample failed, will retry next tick");
        }
    }
}
