use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::HabitResult;
use crate::habit::{Completion, HabitId, TrackedHabit};
use crate::recurrence;
use crate::streak::calculate_streaks;

/// Everything the dashboard needs to know about one habit on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitStatus {
    pub habit_id: HabitId,
    pub due_today: bool,
    pub completions_this_period: u32,
    pub target_this_period: u32,
    pub completed_this_period: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completed_today: bool,
    pub today_completion: Option<Completion>,
}

impl HabitStatus {
    /// Due today and the period target is still open.
    pub fn needs_attention(&self) -> bool {
        self.due_today && !self.completed_this_period
    }
}

pub fn habit_status(tracked: &TrackedHabit, today: NaiveDate) -> HabitResult<HabitStatus> {
    let habit = &tracked.habit;
    let completions = tracked.completions.as_slice();
    let streaks = calculate_streaks(habit, completions, today)?;
    let completions_this_period = recurrence::completions_in_period(habit, completions, today);
    let target_this_period = habit.recurrence.target();
    let today_completion = recurrence::completion_on_day(completions, today).cloned();

    Ok(HabitStatus {
        habit_id: habit.id.clone(),
        due_today: recurrence::is_due_on(habit, today),
        completions_this_period,
        target_this_period,
        completed_this_period: completions_this_period >= target_this_period,
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        completed_today: today_completion.is_some(),
        today_completion,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Due today with the period target still open, in input order.
    pub due: Vec<HabitStatus>,
    /// Not scheduled today, or already complete for the period.
    pub not_due: Vec<HabitStatus>,
    pub completed_today: usize,
    pub total_due_today: usize,
    /// `total_due_today - completed_today`. Negative when habits were completed on
    /// days they are not scheduled.
    pub remaining_today: i64,
}

impl DashboardSummary {
    pub fn statuses(&self) -> impl Iterator<Item = &HabitStatus> {
        self.due.iter().chain(self.not_due.iter())
    }

    pub fn highest_streak(&self) -> u32 {
        self.statuses()
            .map(|status| status.current_streak)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty() && self.not_due.is_empty()
    }
}

pub fn dashboard(habits: &[TrackedHabit], today: NaiveDate) -> HabitResult<DashboardSummary> {
    let mut summary = DashboardSummary::default();
    for tracked in habits {
        let status = habit_status(tracked, today)?;
        if status.completed_today {
            summary.completed_today += 1;
        }
        if status.due_today {
            summary.total_due_today += 1;
        }
        if status.needs_attention() {
            summary.due.push(status);
        } else {
            summary.not_due.push(status);
        }
    }
    summary.remaining_today =
        to_signed(summary.total_due_today) - to_signed(summary.completed_today);
    Ok(summary)
}

fn to_signed(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
