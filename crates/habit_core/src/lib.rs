pub mod calendar;
pub mod error;
pub mod habit;
pub mod recurrence;
pub mod status;
pub mod streak;

pub use crate::error::{HabitError, HabitResult};
pub use crate::habit::{
    Completion, CompletionId, Habit, HabitId, Recurrence, RecurrenceKind, TrackedHabit,
    WeekdaySet,
};
pub use crate::status::{dashboard, habit_status, DashboardSummary, HabitStatus};
pub use crate::streak::{calculate_streaks, Streaks};
