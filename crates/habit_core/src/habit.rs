use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HabitError, HabitResult};

pub type HabitId = String;
pub type CompletionId = String;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const DAY_ABBREVIATIONS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Fieldless discriminant of [`Recurrence`], used where only the period shape matters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
    #[serde(rename = "SPECIFIC_DAYS")]
    SpecificWeekdays,
}

impl RecurrenceKind {
    pub fn label(self) -> &'static str {
        match self {
            RecurrenceKind::Daily => "Daily",
            RecurrenceKind::Weekly => "Weekly",
            RecurrenceKind::Monthly => "Monthly",
            RecurrenceKind::SpecificWeekdays => "Specific Days",
        }
    }
}

/// Set of scheduled weekdays, indexed from Sunday = 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(BTreeSet<u8>);

impl WeekdaySet {
    pub fn from_indices(indices: &[u8]) -> HabitResult<Self> {
        let mut days = BTreeSet::new();
        for &index in indices {
            if index > 6 {
                return Err(HabitError::InvalidWeekday(index));
            }
            days.insert(index);
        }
        Ok(Self(days))
    }

    pub fn from_weekdays(weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        Self(
            weekdays
                .into_iter()
                .map(|day| day.num_days_from_sunday() as u8)
                .collect(),
        )
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0.contains(&(weekday.num_days_from_sunday() as u8))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Indices in ascending order, Sunday first.
    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = HabitError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_indices(&value)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(value: WeekdaySet) -> Self {
        value.0.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    Daily,
    Weekly {
        target: NonZeroU32,
    },
    Monthly {
        target: NonZeroU32,
    },
    #[serde(rename = "SPECIFIC_DAYS")]
    SpecificWeekdays {
        days: WeekdaySet,
    },
}

impl Recurrence {
    pub fn weekly(target: u32) -> HabitResult<Self> {
        Ok(Recurrence::Weekly {
            target: non_zero_target(target)?,
        })
    }

    pub fn monthly(target: u32) -> HabitResult<Self> {
        Ok(Recurrence::Monthly {
            target: non_zero_target(target)?,
        })
    }

    pub fn specific_days(indices: &[u8]) -> HabitResult<Self> {
        Ok(Recurrence::SpecificWeekdays {
            days: WeekdaySet::from_indices(indices)?,
        })
    }

    pub fn kind(&self) -> RecurrenceKind {
        match self {
            Recurrence::Daily => RecurrenceKind::Daily,
            Recurrence::Weekly { .. } => RecurrenceKind::Weekly,
            Recurrence::Monthly { .. } => RecurrenceKind::Monthly,
            Recurrence::SpecificWeekdays { .. } => RecurrenceKind::SpecificWeekdays,
        }
    }

    /// Completions needed within one period for it to count. Day kinds need one.
    pub fn target(&self) -> u32 {
        match self {
            Recurrence::Daily | Recurrence::SpecificWeekdays { .. } => 1,
            Recurrence::Weekly { target } | Recurrence::Monthly { target } => target.get(),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Daily => f.write_str("Every day"),
            Recurrence::Weekly { target } if target.get() == 1 => f.write_str("Once a week"),
            Recurrence::Weekly { target } => write!(f, "{}x per week", target),
            Recurrence::Monthly { target } if target.get() == 1 => f.write_str("Once a month"),
            Recurrence::Monthly { target } => write!(f, "{}x per month", target),
            Recurrence::SpecificWeekdays { days } => {
                let names = days
                    .indices()
                    .map(|index| DAY_ABBREVIATIONS[usize::from(index)])
                    .collect::<Vec<_>>();
                f.write_str(&names.join(", "))
            }
        }
    }
}

fn non_zero_target(target: u32) -> HabitResult<NonZeroU32> {
    NonZeroU32::new(target).ok_or(HabitError::InvalidTarget(target))
}

fn default_emoji() -> String {
    "⭐".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    pub recurrence: Recurrence,
    /// Archived habits keep their history but drop out of dashboards and reminders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<NaiveDateTime>,
}

impl Habit {
    pub fn new(id: impl Into<HabitId>, name: impl Into<String>, recurrence: Recurrence) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            emoji: default_emoji(),
            recurrence,
            archived_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> RecurrenceKind {
        self.recurrence.kind()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub id: CompletionId,
    pub habit_id: HabitId,
    /// Local wall-clock time; only the calendar day is significant.
    pub completed_at: NaiveDateTime,
    #[serde(default)]
    pub note: Option<String>,
}

impl Completion {
    pub fn new(
        id: impl Into<CompletionId>,
        habit_id: impl Into<HabitId>,
        completed_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            habit_id: habit_id.into(),
            completed_at,
            note: None,
        }
    }
}

/// A habit together with every completion recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedHabit {
    pub habit: Habit,
    #[serde(default)]
    pub completions: Vec<Completion>,
}

impl TrackedHabit {
    pub fn new(habit: Habit, completions: Vec<Completion>) -> Self {
        Self { habit, completions }
    }
}
