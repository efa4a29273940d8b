use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use habit_core::TrackedHabit;

use crate::reminders::Reminder;

/// On-disk JSON form of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub habits: Vec<TrackedHabit>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Snapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload).with_context(|| format!("writing snapshot {}", path.display()))?;
        Ok(())
    }

    /// Habit ids are unique, and completions and reminders point at habits in this snapshot.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for tracked in &self.habits {
            if !seen.insert(tracked.habit.id.as_str()) {
                bail!("duplicate habit id `{}`", tracked.habit.id);
            }
            if let Some(stray) = tracked
                .completions
                .iter()
                .find(|completion| completion.habit_id != tracked.habit.id)
            {
                bail!(
                    "completion `{}` belongs to `{}` but is listed under `{}`",
                    stray.id,
                    stray.habit_id,
                    tracked.habit.id
                );
            }
        }
        if let Some(orphan) = self
            .reminders
            .iter()
            .find(|reminder| !seen.contains(reminder.habit_id.as_str()))
        {
            bail!("reminder refers to unknown habit `{}`", orphan.habit_id);
        }
        Ok(())
    }
}
