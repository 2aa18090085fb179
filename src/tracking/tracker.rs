use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::gate::{GateState, OfficeHours};

/// A raw device position pushed by the mobile client.
#[derive(Debug, Clone, Copy)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
}

/// Per-employee tracking state. Lives in process memory for the lifetime of
/// the server, mirroring the session state the mobile app kept on screen.
#[derive(Debug)]
struct Session {
    sharing: bool,
    gate: GateState,
    last_fix: Option<Fix>,
    notice: Option<String>,
}

impl Session {
    fn new(gate: GateState) -> Self {
        Self {
            // Sharing starts enabled when the session is first seen inside
            // office hours, matching the auto-enable-on-login behavior.
            sharing: gate == GateState::Inside,
            gate,
            last_fix: None,
            notice: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub sharing: bool,
    pub in_office_hours: bool,
    pub notice: Option<String>,
}

/// Outcome of a manual sharing toggle.
#[derive(Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Sharing turned on; the caller must record a sample immediately.
    Enabled,
    /// Sharing turned off; the caller must notify the admin.
    Disabled,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToggleError {
    #[error("Location sharing is only available during office hours ({window})")]
    OutsideOfficeHours { window: String },
}

/// Gate transition effects the engine must act on.
#[derive(Debug, PartialEq, Eq)]
pub enum GateEvent {
    /// Outside → Inside: sharing was auto-enabled; sample immediately.
    AutoEnabled { employee_id: Uuid },
    /// Inside → Outside: sharing was force-disabled; a notice was queued
    /// for the employee.
    ForceDisabled { employee_id: Uuid },
}

pub struct Tracker {
    hours: OfficeHours,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl Tracker {
    pub fn new(hours: OfficeHours) -> Self {
        Self {
            hours,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn office_hours(&self) -> &OfficeHours {
        &self.hours
    }

    /// Current view of an employee's session, creating it on first contact.
    /// Any pending notice is consumed by this read.
    pub fn session_view(&self, employee_id: Uuid, now: DateTime<Utc>) -> SessionView {
        let gate = self.hours.state_at(now);
        let mut sessions = self.sessions.lock().expect("tracker lock poisoned");
        let session = sessions
            .entry(employee_id)
            .or_insert_with(|| Session::new(gate));
        SessionView {
            sharing: session.sharing,
            in_office_hours: session.gate == GateState::Inside,
            notice: session.notice.take(),
        }
    }

    /// Store the freshest device position. `None` (permission denied on the
    /// device) leaves the previous fix in place. Returns the sharing flag so
    /// the caller can tell the client whether the fix will be reported.
    pub fn record_fix(
        &self,
        employee_id: Uuid,
        fix: Option<Fix>,
        now: DateTime<Utc>,
    ) -> SessionView {
        let gate = self.hours.state_at(now);
        let mut sessions = self.sessions.lock().expect("tracker lock poisoned");
        let session = sessions
            .entry(employee_id)
            .or_insert_with(|| Session::new(gate));
        if let Some(fix) = fix {
            session.last_fix = Some(fix);
        }
        SessionView {
            sharing: session.sharing,
            in_office_hours: session.gate == GateState::Inside,
            notice: None,
        }
    }

    /// Manual sharing toggle. Both directions are rejected outside office
    /// hours; turning off inside hours is allowed (approved leave) and must
    /// be followed by an admin notification.
    pub fn toggle(
        &self,
        employee_id: Uuid,
        enable: bool,
        now: DateTime<Utc>,
    ) -> Result<ToggleOutcome, ToggleError> {
        let gate = self.hours.state_at(now);
        let mut sessions = self.sessions.lock().expect("tracker lock poisoned");
        let session = sessions
            .entry(employee_id)
            .or_insert_with(|| Session::new(gate));
        session.gate = gate;

        if gate == GateState::Outside {
            return Err(ToggleError::OutsideOfficeHours {
                window: self.hours.describe(),
            });
        }

        session.sharing = enable;
        if enable {
            Ok(ToggleOutcome::Enabled)
        } else {
            Ok(ToggleOutcome::Disabled)
        }
    }

    /// One gate poll over every live session. Auto-enables sharing when the
    /// window opens and force-disables it when the window closes; the manual
    /// off state survives until the next Outside → Inside transition.
    pub fn gate_tick(&self, now: DateTime<Utc>) -> Vec<GateEvent> {
        let gate = self.hours.state_at(now);
        let mut events = Vec::new();
        let mut sessions = self.sessions.lock().expect("tracker lock poisoned");
        for (employee_id, session) in sessions.iter_mut() {
            let previous = session.gate;
            session.gate = gate;
            match (previous, gate) {
                (GateState::Outside, GateState::Inside) => {
                    session.sharing = true;
                    events.push(GateEvent::AutoEnabled {
                        employee_id: *employee_id,
                    });
                }
                (GateState::Inside, GateState::Outside) => {
                    if session.sharing {
                        session.sharing = false;
                        session.notice =
                            Some("Location sharing disabled outside office hours".to_string());
                        events.push(GateEvent::ForceDisabled {
                            employee_id: *employee_id,
                        });
                    }
                }
                _ => {}
            }
        }
        events
    }

    /// Sessions due for a reporting tick: sharing enabled and inside the
    /// window. The fix is `None` when the device never delivered one; the
    /// reporter substitutes the demo coordinates.
    pub fn sampling_candidates(&self) -> Vec<(Uuid, Option<Fix>)> {
        let sessions = self.sessions.lock().expect("tracker lock poisoned");
        sessions
            .iter()
            .filter(|(_, session)| session.sharing && session.gate == GateState::Inside)
            .map(|(employee_id, session)| (*employee_id, session.last_fix))
            .collect()
    }

    pub fn last_fix(&self, employee_id: Uuid) -> Option<Fix> {
        let sessions = self.sessions.lock().expect("tracker lock poisoned");
        sessions.get(&employee_id).and_then(|s| s.last_fix)
    }
}
