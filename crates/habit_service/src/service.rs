use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use habit_core::{
    recurrence, status, Completion, DashboardSummary, Habit, HabitStatus, TrackedHabit,
};

use crate::reminders::{Reminder, ReminderRequest, ReminderSink};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Completed(Completion),
    Undone(Completion),
}

impl ToggleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ToggleOutcome::Completed(_))
    }
}

/// In-memory owner of habit snapshots. Every query hands the core an immutable
/// copy taken under the read lock.
pub struct HabitService {
    habits: RwLock<Vec<TrackedHabit>>,
    reminders: RwLock<Vec<Reminder>>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
}

pub struct HabitServiceBuilder {
    habits: Vec<TrackedHabit>,
    reminders: Vec<Reminder>,
    snapshots: Vec<PathBuf>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            habits: Vec::new(),
            reminders: Vec::new(),
            snapshots: Vec::new(),
            reminder_sink: None,
        }
    }

    pub fn add_habit(mut self, tracked: TrackedHabit) -> Self {
        self.habits.push(tracked);
        self
    }

    pub fn add_reminder(mut self, reminder: Reminder) -> Self {
        self.reminders.push(reminder);
        self
    }

    pub fn with_snapshot(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if !self.snapshots.contains(&path) {
            self.snapshots.push(path);
        }
        self
    }

    pub fn with_reminder_sink(mut self, sink: Box<dyn ReminderSink>) -> Self {
        self.reminder_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<HabitService> {
        let mut merged = Snapshot {
            habits: self.habits,
            reminders: self.reminders,
        };
        for path in &self.snapshots {
            let loaded = Snapshot::load(path)?;
            info!(
                path = %path.display(),
                habits = loaded.habits.len(),
                reminders = loaded.reminders.len(),
                "loaded snapshot"
            );
            merged.habits.extend(loaded.habits);
            merged.reminders.extend(loaded.reminders);
        }
        merged.validate()?;
        Ok(HabitService {
            habits: RwLock::new(merged.habits),
            reminders: RwLock::new(merged.reminders),
            reminder_sink: self.reminder_sink,
        })
    }
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn habits(&self) -> Vec<TrackedHabit> {
        self.habits.read().clone()
    }

    /// Habits that have not been archived, in insertion order.
    pub fn active_habits(&self) -> Vec<TrackedHabit> {
        self.habits
            .read()
            .iter()
            .filter(|tracked| !tracked.habit.is_archived())
            .cloned()
            .collect()
    }

    pub fn get(&self, habit_id: &str) -> Result<TrackedHabit> {
        self.habits
            .read()
            .iter()
            .find(|tracked| tracked.habit.id == habit_id)
            .cloned()
            .ok_or_else(|| anyhow!("habit `{habit_id}` not found"))
    }

    /// Inserts a new habit or replaces the metadata of an existing one, keeping its history.
    pub fn upsert_habit(&self, habit: Habit) {
        let mut habits = self.habits.write();
        match habits.iter_mut().find(|tracked| tracked.habit.id == habit.id) {
            Some(existing) => {
                info!(habit = %habit.id, "updated habit");
                existing.habit = habit;
            }
            None => {
                info!(habit = %habit.id, "added habit");
                habits.push(TrackedHabit::new(habit, Vec::new()));
            }
        }
    }

    /// Retires a habit without deleting its completions. Archiving twice keeps the
    /// first timestamp.
    pub fn archive_habit(&self, habit_id: &str, at: NaiveDateTime) -> Result<()> {
        let mut habits = self.habits.write();
        let tracked = habits
            .iter_mut()
            .find(|tracked| tracked.habit.id == habit_id)
            .ok_or_else(|| anyhow!("habit `{habit_id}` not found"))?;
        if tracked.habit.archived_at.is_none() {
            tracked.habit.archived_at = Some(at);
            info!(habit = %habit_id, %at, "archived habit");
        }
        Ok(())
    }

    pub fn remove_habit(&self, habit_id: &str) -> Result<TrackedHabit> {
        let removed = {
            let mut habits = self.habits.write();
            let idx = habits
                .iter()
                .position(|tracked| tracked.habit.id == habit_id)
                .ok_or_else(|| anyhow!("habit `{habit_id}` not found"))?;
            habits.remove(idx)
        };
        self.reminders
            .write()
            .retain(|reminder| reminder.habit_id != habit_id);
        info!(habit = %habit_id, "removed habit");
        Ok(removed)
    }

    pub fn record_completion(
        &self,
        habit_id: &str,
        at: NaiveDateTime,
        note: Option<String>,
    ) -> Result<Completion> {
        let mut habits = self.habits.write();
        let tracked = habits
            .iter_mut()
            .find(|tracked| tracked.habit.id == habit_id)
            .ok_or_else(|| anyhow!("habit `{habit_id}` not found"))?;
        let completion = Completion {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.to_string(),
            completed_at: at,
            note,
        };
        tracked.completions.push(completion.clone());
        info!(habit = %habit_id, completion = %completion.id, %at, "recorded completion");
        Ok(completion)
    }

    /// Undoes the completion already logged on `now`'s day, or logs a new one.
    pub fn toggle_completion(
        &self,
        habit_id: &str,
        now: NaiveDateTime,
        note: Option<String>,
    ) -> Result<ToggleOutcome> {
        let mut habits = self.habits.write();
        let tracked = habits
            .iter_mut()
            .find(|tracked| tracked.habit.id == habit_id)
            .ok_or_else(|| anyhow!("habit `{habit_id}` not found"))?;

        let existing = recurrence::completion_on_day(&tracked.completions, now.date())
            .map(|completion| completion.id.clone());
        if let Some(completion_id) = existing {
            let idx = tracked
                .completions
                .iter()
                .position(|completion| completion.id == completion_id)
                .ok_or_else(|| anyhow!("completion `{completion_id}` vanished"))?;
            let removed = tracked.completions.remove(idx);
            info!(habit = %habit_id, completion = %removed.id, "undid completion");
            return Ok(ToggleOutcome::Undone(removed));
        }

        let completion = Completion {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.to_string(),
            completed_at: now,
            note,
        };
        tracked.completions.push(completion.clone());
        info!(habit = %habit_id, completion = %completion.id, "completed habit");
        Ok(ToggleOutcome::Completed(completion))
    }

    pub fn status(&self, habit_id: &str, today: NaiveDate) -> Result<HabitStatus> {
        let tracked = self.get(habit_id)?;
        Ok(status::habit_status(&tracked, today)?)
    }

    /// Whether the habit has met its target for the period containing `today`.
    pub fn is_complete_for_period(&self, habit_id: &str, today: NaiveDate) -> Result<bool> {
        let tracked = self.get(habit_id)?;
        Ok(recurrence::is_period_complete(
            &tracked.habit,
            &tracked.completions,
            today,
        ))
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary> {
        let habits = self.active_habits();
        let summary = status::dashboard(&habits, today)?;
        debug!(
            %today,
            due = summary.due.len(),
            completed = summary.completed_today,
            remaining = summary.remaining_today,
            "built dashboard"
        );
        Ok(summary)
    }

    pub fn highest_streak(&self, today: NaiveDate) -> Result<u32> {
        Ok(self.dashboard(today)?.highest_streak())
    }

    pub fn reminders(&self) -> Vec<Reminder> {
        self.reminders.read().clone()
    }

    /// Adds a reminder, replacing any existing one for the same habit and time.
    pub fn set_reminder(&self, reminder: Reminder) -> Result<()> {
        self.get(&reminder.habit_id)?;
        let mut reminders = self.reminders.write();
        reminders.retain(|existing| {
            !(existing.habit_id == reminder.habit_id && existing.time == reminder.time)
        });
        reminders.push(reminder);
        Ok(())
    }

    /// Hands every reminder due in `now`'s hour to the sink, skipping habits that are
    /// archived, not scheduled today or already met their period target. A habit that
    /// fails to evaluate is logged and skipped. Returns how many were sent.
    pub fn dispatch_reminders(&self, now: NaiveDateTime) -> Result<usize> {
        let Some(sink) = &self.reminder_sink else {
            warn!("no reminder sink configured, skipping dispatch");
            return Ok(0);
        };
        let today = now.date();
        let firing: Vec<Reminder> = self
            .reminders
            .read()
            .iter()
            .filter(|reminder| reminder.fires_during(now))
            .cloned()
            .collect();

        let mut sent = 0;
        for reminder in firing {
            let tracked = match self.get(&reminder.habit_id) {
                Ok(tracked) => tracked,
                Err(err) => {
                    warn!(habit = %reminder.habit_id, %err, "reminder for missing habit");
                    continue;
                }
            };
            if tracked.habit.is_archived() {
                debug!(habit = %reminder.habit_id, "habit archived, reminder skipped");
                continue;
            }
            let snapshot = match status::habit_status(&tracked, today) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(habit = %reminder.habit_id, %err, "unable to evaluate habit for reminder");
                    continue;
                }
            };
            if !snapshot.needs_attention() {
                debug!(habit = %reminder.habit_id, "habit not pending, reminder skipped");
                continue;
            }
            sink.schedule(ReminderRequest::for_habit(&tracked.habit, now));
            sent += 1;
        }
        info!(%now, sent, "dispatched reminders");
        Ok(sent)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            habits: self.habits(),
            reminders: self.reminders(),
        }
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        self.snapshot().save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habit_core::Recurrence;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn service_with(habits: Vec<Habit>) -> HabitService {
        habits
            .into_iter()
            .fold(HabitService::builder(), |builder, habit| {
                builder.add_habit(TrackedHabit::new(habit, Vec::new()))
            })
            .build()
            .expect("build service")
    }

    #[derive(Clone, Default)]
    struct CollectingSink(Arc<Mutex<Vec<ReminderRequest>>>);

    impl ReminderSink for CollectingSink {
        fn schedule(&self, reminder: ReminderRequest) {
            self.0.lock().push(reminder);
        }
    }

    #[test]
    fn toggle_creates_then_undoes_same_day_completion() {
        let service = service_with(vec![Habit::new("read", "Read", Recurrence::Daily)]);

        let first = service
            .toggle_completion("read", at(18, 8), Some("chapter 3".into()))
            .unwrap();
        assert!(first.is_completed());
        assert!(service.status("read", at(18, 0).date()).unwrap().completed_today);

        let second = service.toggle_completion("read", at(18, 21), None).unwrap();
        match (first, second) {
            (ToggleOutcome::Completed(made), ToggleOutcome::Undone(removed)) => {
                assert_eq!(made.id, removed.id);
                assert_eq!(removed.note.as_deref(), Some("chapter 3"));
            }
            other => panic!("unexpected toggle sequence: {other:?}"),
        }
        assert!(service.get("read").unwrap().completions.is_empty());
    }

    #[test]
    fn toggle_on_a_new_day_adds_another_completion() {
        let service = service_with(vec![Habit::new("read", "Read", Recurrence::Daily)]);
        service.toggle_completion("read", at(17, 8), None).unwrap();
        service.toggle_completion("read", at(18, 8), None).unwrap();
        let status = service.status("read", at(18, 9).date()).unwrap();
        assert_eq!(status.current_streak, 2);
    }

    #[test]
    fn unknown_habit_is_an_error() {
        let service = service_with(vec![]);
        assert!(service.toggle_completion("nope", at(18, 8), None).is_err());
        assert!(service.status("nope", at(18, 8).date()).is_err());
        assert!(service.remove_habit("nope").is_err());
    }

    #[test]
    fn upsert_keeps_history_and_remove_drops_reminders() {
        let service = service_with(vec![Habit::new("run", "Run", Recurrence::weekly(1).unwrap())]);
        service.record_completion("run", at(16, 7), None).unwrap();
        service
            .set_reminder(Reminder::new("run", at(1, 7).time()))
            .unwrap();

        service.upsert_habit(Habit::new("run", "Run far", Recurrence::weekly(2).unwrap()));
        let tracked = service.get("run").unwrap();
        assert_eq!(tracked.habit.name, "Run far");
        assert_eq!(tracked.completions.len(), 1);
        assert!(!service.is_complete_for_period("run", at(18, 0).date()).unwrap());

        service.remove_habit("run").unwrap();
        assert!(service.reminders().is_empty());
        assert!(service.habits().is_empty());
    }

    #[test]
    fn dispatches_only_pending_reminders_for_the_current_hour() {
        let sink = CollectingSink::default();
        let service = HabitService::builder()
            .add_habit(TrackedHabit::new(
                Habit::new("read", "Read", Recurrence::Daily),
                Vec::new(),
            ))
            .add_habit(TrackedHabit::new(
                Habit::new("gym", "Gym", Recurrence::specific_days(&[1, 5]).unwrap()),
                Vec::new(),
            ))
            .add_habit(TrackedHabit::new(
                Habit::new("floss", "Floss", Recurrence::Daily),
                vec![Completion::new("f1", "floss", at(18, 6))],
            ))
            .add_reminder(Reminder::new("read", at(1, 7).time()))
            .add_reminder(Reminder::new("gym", at(1, 7).time()))
            .add_reminder(Reminder::new("floss", at(1, 7).time()))
            .add_reminder(Reminder::new("read", at(1, 20).time()))
            .with_reminder_sink(Box::new(sink.clone()))
            .build()
            .unwrap();

        // Wednesday 07:00: gym is not scheduled and floss is done already.
        let sent = service.dispatch_reminders(at(18, 7)).unwrap();
        assert_eq!(sent, 1);
        let delivered = sink.0.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].habit_id, "read");
        assert_eq!(delivered[0].title, "⭐ Time for: Read");
    }

    #[test]
    fn archived_habits_leave_dashboard_and_reminders_but_keep_history() {
        let sink = CollectingSink::default();
        let service = HabitService::builder()
            .add_habit(TrackedHabit::new(
                Habit::new("read", "Read", Recurrence::Daily),
                vec![Completion::new("r1", "read", at(17, 8))],
            ))
            .add_habit(TrackedHabit::new(
                Habit::new("run", "Run", Recurrence::Daily),
                vec![
                    Completion::new("u1", "run", at(15, 8)),
                    Completion::new("u2", "run", at(16, 8)),
                    Completion::new("u3", "run", at(17, 8)),
                ],
            ))
            .add_reminder(Reminder::new("read", at(1, 7).time()))
            .add_reminder(Reminder::new("run", at(1, 7).time()))
            .with_reminder_sink(Box::new(sink.clone()))
            .build()
            .unwrap();
        assert_eq!(service.highest_streak(at(18, 0).date()).unwrap(), 3);

        service.archive_habit("run", at(18, 6)).unwrap();
        service.archive_habit("run", at(19, 6)).unwrap();

        let summary = service.dashboard(at(18, 0).date()).unwrap();
        let ids: Vec<_> = summary.statuses().map(|s| s.habit_id.as_str()).collect();
        assert_eq!(ids, vec!["read"]);
        assert_eq!(summary.total_due_today, 1);
        assert_eq!(service.highest_streak(at(18, 0).date()).unwrap(), 1);

        assert_eq!(service.dispatch_reminders(at(18, 7)).unwrap(), 1);
        assert_eq!(sink.0.lock()[0].habit_id, "read");

        let archived = service.get("run").unwrap();
        assert_eq!(archived.habit.archived_at, Some(at(18, 6)));
        assert_eq!(archived.completions.len(), 3);
        assert_eq!(service.active_habits().len(), 1);
        assert_eq!(service.habits().len(), 2);
        assert!(service.archive_habit("ghost", at(18, 6)).is_err());
    }

    #[test]
    fn dispatch_without_sink_sends_nothing() {
        let service = service_with(vec![Habit::new("read", "Read", Recurrence::Daily)]);
        service
            .set_reminder(Reminder::new("read", at(1, 7).time()))
            .unwrap();
        assert_eq!(service.dispatch_reminders(at(18, 7)).unwrap(), 0);
    }

    #[test]
    fn builder_rejects_duplicate_habits() {
        let result = HabitService::builder()
            .add_habit(TrackedHabit::new(Habit::new("a", "A", Recurrence::Daily), vec![]))
            .add_habit(TrackedHabit::new(Habit::new("a", "A", Recurrence::Daily), vec![]))
            .build();
        assert!(result.is_err());
    }
}
