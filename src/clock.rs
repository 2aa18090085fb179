use chrono::{DateTime, Utc};

/// Time source for everything policy-related (office-hours gate, retention
/// cutoff, sample timestamps). Swapped for a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
