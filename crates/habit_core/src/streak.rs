//! Current and longest streak calculation.
//!
//! Day kinds walk calendar days, weekly and monthly habits walk periods.
//! An unfinished "today" (or current period) never breaks a streak that was
//! still alive at the end of the previous day or period; it simply does not
//! count yet.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar;
use crate::error::{HabitError, HabitResult};
use crate::habit::{Completion, Habit, Recurrence, RecurrenceKind, WeekdaySet};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

pub fn calculate_streaks(
    habit: &Habit,
    completions: &[Completion],
    today: NaiveDate,
) -> HabitResult<Streaks> {
    if completions.is_empty() {
        return Ok(Streaks::default());
    }

    let streaks = match &habit.recurrence {
        Recurrence::Daily => daily_streaks(completions, today)?,
        Recurrence::Weekly { target } | Recurrence::Monthly { target } => {
            period_streaks(habit.kind(), target.get(), completions, today)?
        }
        Recurrence::SpecificWeekdays { days } => weekday_streaks(days, completions, today)?,
    };

    debug!(
        habit = %habit.id,
        kind = ?habit.kind(),
        %today,
        current = streaks.current,
        longest = streaks.longest,
        "computed streaks"
    );
    Ok(streaks)
}

fn completed_days(completions: &[Completion]) -> BTreeSet<NaiveDate> {
    completions
        .iter()
        .map(|completion| completion.completed_at.date())
        .collect()
}

fn daily_streaks(completions: &[Completion], today: NaiveDate) -> HabitResult<Streaks> {
    let days = completed_days(completions);

    let mut cursor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };
    let mut current = 0usize;
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        current += 1;
        guard_walk(RecurrenceKind::Daily, current, days.len())?;
        cursor = day.pred_opt();
    }

    let mut longest = 0usize;
    let mut run = 0usize;
    let mut previous: Option<NaiveDate> = None;
    for &day in &days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    Ok(Streaks {
        current: to_count(current),
        longest: to_count(longest),
    })
}

fn period_streaks(
    kind: RecurrenceKind,
    target: u32,
    completions: &[Completion],
    today: NaiveDate,
) -> HabitResult<Streaks> {
    let mut counts: BTreeMap<NaiveDateTime, u32> = BTreeMap::new();
    for completion in completions {
        let start = calendar::period_boundary(kind, completion.completed_at).start;
        *counts.entry(start).or_default() += 1;
    }
    let met = |start: &NaiveDateTime| counts.get(start).copied().unwrap_or(0) >= target;

    let mut cursor = calendar::period_boundary(kind, today.and_time(NaiveTime::MIN)).start;
    if !met(&cursor) {
        cursor = calendar::previous_period_start(kind, cursor);
    }
    let mut current = 0usize;
    while met(&cursor) {
        current += 1;
        guard_walk(kind, current, counts.len())?;
        cursor = calendar::previous_period_start(kind, cursor);
    }

    let mut longest = 0usize;
    if let (Some(&first), Some(&last)) = (counts.keys().next(), counts.keys().next_back()) {
        let mut run = 0usize;
        let mut cursor = first;
        while cursor <= last {
            if met(&cursor) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
            let next = calendar::next_period_start(kind, cursor);
            if next <= cursor {
                break;
            }
            cursor = next;
        }
    }

    Ok(Streaks {
        current: to_count(current),
        longest: to_count(longest),
    })
}

/// Most recent scheduled day strictly before `date`.
fn previous_scheduled(days: &WeekdaySet, date: NaiveDate) -> Option<NaiveDate> {
    let mut cursor = date;
    for _ in 0..7 {
        cursor = cursor.pred_opt()?;
        if days.contains(cursor.weekday()) {
            return Some(cursor);
        }
    }
    None
}

fn weekday_streaks(
    scheduled: &WeekdaySet,
    completions: &[Completion],
    today: NaiveDate,
) -> HabitResult<Streaks> {
    if scheduled.is_empty() {
        return Ok(Streaks::default());
    }
    let days = completed_days(completions);

    let mut cursor = if scheduled.contains(today.weekday()) && days.contains(&today) {
        Some(today)
    } else {
        previous_scheduled(scheduled, today)
    };
    let mut current = 0usize;
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        current += 1;
        guard_walk(RecurrenceKind::SpecificWeekdays, current, days.len())?;
        cursor = previous_scheduled(scheduled, day);
    }

    let mut longest = 0usize;
    if let (Some(&first), Some(&last)) = (days.first(), days.last()) {
        let mut run = 0usize;
        let mut cursor = Some(first);
        while let Some(day) = cursor.filter(|day| *day <= last) {
            if scheduled.contains(day.weekday()) {
                if days.contains(&day) {
                    run += 1;
                    longest = longest.max(run);
                } else {
                    run = 0;
                }
            }
            cursor = day.succ_opt();
        }
    }

    Ok(Streaks {
        current: to_count(current),
        longest: to_count(longest),
    })
}

/// Every step of a current-streak walk consumes a distinct recorded period, so the
/// walk can never be longer than the number of recorded periods.
fn guard_walk(kind: RecurrenceKind, visited: usize, recorded: usize) -> HabitResult<()> {
    if visited > recorded {
        return Err(HabitError::PeriodWalkOverrun {
            kind,
            visited,
            recorded,
        });
    }
    Ok(())
}

fn to_count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
