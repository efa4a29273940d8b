use thiserror::Error;

use crate::habit::RecurrenceKind;

pub type HabitResult<T> = Result<T, HabitError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HabitError {
    #[error("weekday index {0} is out of range, expected 0 (Sunday) through 6 (Saturday)")]
    InvalidWeekday(u8),

    #[error("target count must be at least 1, got {0}")]
    InvalidTarget(u32),

    #[error("{kind:?} streak walk visited {visited} periods but only {recorded} have completions")]
    PeriodWalkOverrun {
        kind: RecurrenceKind,
        visited: usize,
        recorded: usize,
    },
}
