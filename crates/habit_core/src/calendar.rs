//! Period boundary arithmetic on local wall-clock timestamps.
//!
//! Weeks start on Sunday. Every function is total: stepping past the range
//! chrono can represent saturates at `NaiveDate::MIN` / `NaiveDate::MAX`.

use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::habit::RecurrenceKind;

/// Inclusive `[start, end]` window of one accounting period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeriodBoundary {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PeriodBoundary {
    /// Periods are whole days, so membership is decided by calendar day. This also
    /// catches sub-millisecond timestamps after `23:59:59.999`.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let day = timestamp.date();
        self.start.date() <= day && day <= self.end.date()
    }
}

fn last_millisecond() -> NaiveTime {
    NaiveTime::MIN - Duration::milliseconds(1)
}

fn back_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

fn forward_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

fn sunday_of_week(date: NaiveDate) -> NaiveDate {
    back_days(date, u64::from(date.weekday().num_days_from_sunday()))
}

pub fn start_of_day(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.date().and_time(NaiveTime::MIN)
}

pub fn end_of_day(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.date().and_time(last_millisecond())
}

pub fn start_of_week(timestamp: NaiveDateTime) -> NaiveDateTime {
    sunday_of_week(timestamp.date()).and_time(NaiveTime::MIN)
}

pub fn end_of_week(timestamp: NaiveDateTime) -> NaiveDateTime {
    forward_days(sunday_of_week(timestamp.date()), 6).and_time(last_millisecond())
}

pub fn start_of_month(timestamp: NaiveDateTime) -> NaiveDateTime {
    first_of_month(timestamp.date()).and_time(NaiveTime::MIN)
}

pub fn end_of_month(timestamp: NaiveDateTime) -> NaiveDateTime {
    let last_day = first_of_month(timestamp.date())
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    last_day.and_time(last_millisecond())
}

pub fn period_boundary(kind: RecurrenceKind, timestamp: NaiveDateTime) -> PeriodBoundary {
    match kind {
        RecurrenceKind::Daily | RecurrenceKind::SpecificWeekdays => PeriodBoundary {
            start: start_of_day(timestamp),
            end: end_of_day(timestamp),
        },
        RecurrenceKind::Weekly => PeriodBoundary {
            start: start_of_week(timestamp),
            end: end_of_week(timestamp),
        },
        RecurrenceKind::Monthly => PeriodBoundary {
            start: start_of_month(timestamp),
            end: end_of_month(timestamp),
        },
    }
}

/// Start of the period immediately before the one containing `period_start`.
pub fn previous_period_start(kind: RecurrenceKind, period_start: NaiveDateTime) -> NaiveDateTime {
    let date = period_start.date();
    let previous = match kind {
        RecurrenceKind::Daily | RecurrenceKind::SpecificWeekdays => back_days(date, 1),
        RecurrenceKind::Weekly => back_days(sunday_of_week(date), 7),
        RecurrenceKind::Monthly => first_of_month(date)
            .checked_sub_months(Months::new(1))
            .unwrap_or(NaiveDate::MIN),
    };
    previous.and_time(NaiveTime::MIN)
}

/// Start of the period immediately after the one containing `period_start`.
pub fn next_period_start(kind: RecurrenceKind, period_start: NaiveDateTime) -> NaiveDateTime {
    let date = period_start.date();
    let next = match kind {
        RecurrenceKind::Daily | RecurrenceKind::SpecificWeekdays => forward_days(date, 1),
        RecurrenceKind::Weekly => forward_days(sunday_of_week(date), 7),
        RecurrenceKind::Monthly => first_of_month(date)
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX),
    };
    next.and_time(NaiveTime::MIN)
}
