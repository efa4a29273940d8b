pub mod reminders;
pub mod service;
pub mod snapshot;

pub use crate::reminders::{Reminder, ReminderRequest, ReminderSink};
pub use crate::service::{HabitService, HabitServiceBuilder, ToggleOutcome};
pub use crate::snapshot::Snapshot;
