use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use habit_core::{DashboardSummary, Habit, HabitStatus, RecurrenceKind, TrackedHabit};
use habit_service::HabitService;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub(crate) snapshots: Vec<PathBuf>,
    pub(crate) now: Option<NaiveDateTime>,
    pub(crate) format: OutputFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = lookup("HABITS_SNAPSHOT") {
            config.push_snapshot(PathBuf::from(path));
        }
        if let Some(raw) = lookup("HABITS_TODAY") {
            config.now = Some(parse_now(raw.trim())?);
        }
        if let Some(raw) = lookup("HABITS_FORMAT") {
            config.format = match raw.trim().to_ascii_lowercase().as_str() {
                "text" | "" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                other => bail!("unsupported HABITS_FORMAT `{other}`, expected text or json"),
            };
        }
        Ok(config)
    }

    pub(crate) fn push_snapshot(&mut self, path: PathBuf) {
        if !path.as_os_str().is_empty() && !self.snapshots.contains(&path) {
            info!(path = %path.display(), "registering snapshot");
            self.snapshots.push(path);
        }
    }

    fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            now: None,
            format: OutputFormat::Text,
        }
    }
}

fn parse_now(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(at);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("HABITS_TODAY `{raw}` is not YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"))?;
    Ok(date.and_time(Local::now().naive_local().time()))
}

pub fn run(config: AppConfig) -> Result<String> {
    if config.snapshots.is_empty() {
        bail!("no snapshot configured, set HABITS_SNAPSHOT");
    }
    let service = config
        .snapshots
        .iter()
        .fold(HabitService::builder(), |builder, path| builder.with_snapshot(path))
        .build()?;

    let today = config.now().date();
    debug!(%today, "rendering dashboard");
    let summary = service.dashboard(today)?;
    match config.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => Ok(render_text(&service.habits(), &summary, today)),
    }
}

fn render_text(habits: &[TrackedHabit], summary: &DashboardSummary, today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {}/{} done, {} remaining",
        today.format("%a %Y-%m-%d"),
        summary.completed_today,
        summary.total_due_today,
        summary.remaining_today
    );
    if !summary.due.is_empty() {
        let _ = writeln!(out, "\nTo do");
        for status in &summary.due {
            render_line(&mut out, habits, status);
        }
    }
    if !summary.not_due.is_empty() {
        let _ = writeln!(out, "\nDone or not scheduled");
        for status in &summary.not_due {
            render_line(&mut out, habits, status);
        }
    }
    out
}

fn render_line(out: &mut String, habits: &[TrackedHabit], status: &HabitStatus) {
    let Some(tracked) = habits
        .iter()
        .find(|tracked| tracked.habit.id == status.habit_id)
    else {
        return;
    };
    let habit = &tracked.habit;
    let mark = if status.completed_this_period { "x" } else { " " };
    let _ = writeln!(
        out,
        "[{mark}] {} {} ({}) {}/{} this {}, streak {} (best {})",
        habit.emoji,
        habit.name,
        habit.recurrence,
        status.completions_this_period,
        status.target_this_period,
        period_noun(habit),
        status.current_streak,
        status.longest_streak
    );
}

fn period_noun(habit: &Habit) -> &'static str {
    match habit.kind() {
        RecurrenceKind::Daily | RecurrenceKind::SpecificWeekdays => "day",
        RecurrenceKind::Weekly => "week",
        RecurrenceKind::Monthly => "month",
    }
}
