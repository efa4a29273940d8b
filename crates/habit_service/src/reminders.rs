use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use habit_core::{Habit, HabitId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub habit_id: HabitId,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Reminder {
    pub fn new(habit_id: impl Into<HabitId>, time: NaiveTime) -> Self {
        Self {
            habit_id: habit_id.into(),
            time,
            enabled: true,
        }
    }

    /// Reminders fire once per hour slot, on the hour they are set for.
    pub fn fires_during(&self, now: NaiveDateTime) -> bool {
        self.enabled && self.time.hour() == now.hour()
    }
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderRequest {
    pub habit_id: HabitId,
    pub title: String,
    pub body: String,
    pub scheduled_for: NaiveDateTime,
}

impl ReminderRequest {
    pub fn for_habit(habit: &Habit, scheduled_for: NaiveDateTime) -> Self {
        let body = habit
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or("Don't forget to complete your habit!")
            .to_string();
        Self {
            habit_id: habit.id.clone(),
            title: format!("{} Time for: {}", habit.emoji, habit.name),
            body,
            scheduled_for,
        }
    }
}

/// Delivery adapters (push, email, desktop) implement this trait.
pub trait ReminderSink: Send + Sync {
    fn schedule(&self, reminder: ReminderRequest);
}

mod hour_minute {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
