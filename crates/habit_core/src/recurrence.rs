use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::calendar::{self, PeriodBoundary};
use crate::habit::{Completion, Habit, Recurrence};

/// Weekly and monthly habits are always due; whether the period target is met
/// is reported separately.
pub fn is_due_on(habit: &Habit, date: NaiveDate) -> bool {
    match &habit.recurrence {
        Recurrence::Daily | Recurrence::Weekly { .. } | Recurrence::Monthly { .. } => true,
        Recurrence::SpecificWeekdays { days } => days.contains(date.weekday()),
    }
}

pub fn period_for(habit: &Habit, date: NaiveDate) -> PeriodBoundary {
    calendar::period_boundary(habit.kind(), date.and_time(NaiveTime::MIN))
}

pub fn completions_in_period(habit: &Habit, completions: &[Completion], date: NaiveDate) -> u32 {
    let period = period_for(habit, date);
    let count = completions
        .iter()
        .filter(|completion| period.contains(completion.completed_at))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

pub fn is_period_complete(habit: &Habit, completions: &[Completion], date: NaiveDate) -> bool {
    completions_in_period(habit, completions, date) >= habit.recurrence.target()
}

/// First completion recorded on `date`, if any. Takes only the completion list: the
/// habit's recurrence plays no part in finding a same-day completion.
pub fn completion_on_day<'a>(
    completions: &'a [Completion],
    date: NaiveDate,
) -> Option<&'a Completion> {
    completions
        .iter()
        .find(|completion| completion.completed_at.date() == date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Recurrence;
    use chrono::NaiveDateTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn done(id: &str, when: NaiveDateTime) -> Completion {
        Completion::new(id, "habit", when)
    }

    #[test]
    fn daily_weekly_and_monthly_are_always_due() {
        for recurrence in [
            Recurrence::Daily,
            Recurrence::weekly(3).unwrap(),
            Recurrence::monthly(2).unwrap(),
        ] {
            let habit = Habit::new("habit", "Read", recurrence);
            for offset in 0..7 {
                assert!(is_due_on(&habit, date(2024, 3, 10 + offset)));
            }
        }
    }

    #[test]
    fn specific_days_are_due_only_on_scheduled_weekdays() {
        // Mon, Wed, Fri
        let habit = Habit::new("habit", "Gym", Recurrence::specific_days(&[1, 3, 5]).unwrap());
        assert!(is_due_on(&habit, date(2024, 3, 11)));
        assert!(!is_due_on(&habit, date(2024, 3, 12)));
        assert!(is_due_on(&habit, date(2024, 3, 13)));
        assert!(!is_due_on(&habit, date(2024, 3, 10)));

        let never = Habit::new("habit", "Never", Recurrence::specific_days(&[]).unwrap());
        assert!((10..17).all(|day| !is_due_on(&never, date(2024, 3, day))));
    }

    #[test]
    fn counts_completions_within_the_current_period() {
        let habit = Habit::new("habit", "Run", Recurrence::weekly(2).unwrap());
        let completions = vec![
            done("a", at(2024, 3, 9, 18)),  // previous Saturday
            done("b", at(2024, 3, 10, 7)),  // Sunday
            done("c", at(2024, 3, 12, 7)),
            done("d", at(2024, 3, 17, 7)),  // next Sunday
        ];
        assert_eq!(completions_in_period(&habit, &completions, date(2024, 3, 13)), 2);
        assert!(is_period_complete(&habit, &completions, date(2024, 3, 13)));
        assert!(!is_period_complete(&habit, &completions, date(2024, 3, 17)));
    }

    #[test]
    fn monthly_counts_raw_completions_including_same_day_repeats() {
        let habit = Habit::new("habit", "Budget", Recurrence::monthly(3).unwrap());
        let completions = vec![
            done("a", at(2024, 2, 1, 8)),
            done("b", at(2024, 2, 29, 8)),
            done("c", at(2024, 2, 29, 20)),
            done("d", at(2024, 3, 1, 8)),
        ];
        assert_eq!(completions_in_period(&habit, &completions, date(2024, 2, 15)), 3);
        assert!(is_period_complete(&habit, &completions, date(2024, 2, 15)));
    }

    #[test]
    fn daily_target_is_one_completion() {
        let habit = Habit::new("habit", "Floss", Recurrence::Daily);
        let completions = vec![done("a", at(2024, 3, 13, 22))];
        assert!(is_period_complete(&habit, &completions, date(2024, 3, 13)));
        assert!(!is_period_complete(&habit, &completions, date(2024, 3, 14)));
    }

    #[test]
    fn finds_completion_on_a_given_day() {
        let completions = vec![
            done("a", at(2024, 3, 12, 7)),
            done("b", at(2024, 3, 13, 7)),
            done("c", at(2024, 3, 13, 19)),
        ];
        let found = completion_on_day(&completions, date(2024, 3, 13)).expect("completion");
        assert_eq!(found.id, "b");
        assert!(completion_on_day(&completions, date(2024, 3, 14)).is_none());
    }
}
