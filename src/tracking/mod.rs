pub mod engine;
pub mod gate;
pub mod reporter;
pub mod tracker;

pub use gate::{GateState, OfficeHours};
pub use tracker::{Fix, GateEvent, SessionView, ToggleError, ToggleOutcome, Tracker};
