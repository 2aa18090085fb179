use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::AppConfig;

/// Whether the wall clock currently falls inside the tracking window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Outside,
    Inside,
}

/// The office-hours window, evaluated in the company's local timezone.
/// Both boundaries are inclusive.
#[derive(Debug, Clone)]
pub struct OfficeHours {
    timezone: Tz,
    start_minutes: u32,
    end_minutes: u32,
}

impl OfficeHours {
    pub fn new(timezone: Tz, start_minutes: u32, end_minutes: u32) -> Self {
        Self {
            timezone,
            start_minutes,
            end_minutes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.office_timezone,
            config.office_start_minutes,
            config.office_end_minutes,
        )
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> GateState {
        let local = now.with_timezone(&self.timezone);
        let minutes = local.hour() * 60 + local.minute();
        if minutes >= self.start_minutes && minutes <= self.end_minutes {
            GateState::Inside
        } else {
            GateState::Outside
        }
    }

    /// Human-readable window, e.g. "10:30 AM - 6:30 PM", for rejection
    /// messages shown to the employee.
    pub fn describe(&self) -> String {
        format!(
            "{} - {}",
            format_minutes(self.start_minutes),
            format_minutes(self.end_minutes)
        )
    }
}

fn format_minutes(minutes: u32) -> String {
    let hour24 = minutes / 60;
    let minute = minutes % 60;
    let (hour12, meridiem) = match hour24 {
        0 => (12, "AM"),
        1..=11 => (hour24, "AM"),
        12 => (12, "PM"),
        _ => (hour24 - 12, "PM"),
    };
    format!("{hour12}:{minute:02} {meridiem}")
}
