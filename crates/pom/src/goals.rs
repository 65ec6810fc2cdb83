//! Daily goals and streaks
//!
//! `goals.json` holds the targets, `progress.json` the running counters.
//! Counters roll over on the first update of a new day: the streak grows
//! only when the previous update was yesterday and that day met the goal.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::outcome::SessionOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default)]
    pub daily_session_target: u32,
    #[serde(default)]
    pub daily_minutes: u64,
}

impl Goals {
    pub fn is_set(&self) -> bool {
        self.daily_session_target > 0 || self.daily_minutes > 0
    }

    /// An unset goal is never met
    pub fn met_by(&self, sessions: u32, minutes: u64) -> bool {
        self.is_set() && sessions >= self.daily_session_target && minutes >= self.daily_minutes
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub sessions_today: u32,
    #[serde(default)]
    pub minutes_today: u64,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub last_update: Option<NaiveDate>,
}

impl Progress {
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }

    /// Move the counters to `today`, settling the streak for the day left behind
    pub fn roll_over(&mut self, today: NaiveDate, goals: &Goals) {
        let Some(last) = self.last_update else {
            self.last_update = Some(today);
            return;
        };
        if last >= today {
            return;
        }

        let yesterday = today.pred_opt();
        if Some(last) == yesterday && goals.met_by(self.sessions_today, self.minutes_today) {
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }

        self.sessions_today = 0;
        self.minutes_today = 0;
        self.last_update = Some(today);
    }

    pub fn add(&mut self, today: NaiveDate, goals: &Goals, sessions: u32, minutes: u64) {
        self.roll_over(today, goals);
        self.sessions_today += sessions;
        self.minutes_today += minutes;
    }
}

/// Reads and updates goal progress on disk
pub struct GoalTracker {
    goals_file: PathBuf,
    progress_file: PathBuf,
}

impl GoalTracker {
    pub fn new(goals_file: &Path, progress_file: &Path) -> Self {
        Self {
            goals_file: goals_file.to_path_buf(),
            progress_file: progress_file.to_path_buf(),
        }
    }

    pub fn goals(&self) -> Result<Goals> {
        Goals::load(&self.goals_file)
    }

    pub fn set_goals(&self, goals: &Goals) -> Result<()> {
        goals.save(&self.goals_file)
    }

    /// Progress as of `today`, without writing anything
    pub fn progress_on(&self, today: NaiveDate) -> Result<Progress> {
        let mut progress: Progress = load_json(&self.progress_file)?;
        progress.roll_over(today, &self.goals()?);
        Ok(progress)
    }

    pub fn add_on(&self, today: NaiveDate, sessions: u32, minutes: u64) -> Result<Progress> {
        let goals = self.goals()?;
        let mut progress: Progress = load_json(&self.progress_file)?;
        progress.add(today, &goals, sessions, minutes);
        save_json(&self.progress_file, &progress)?;
        Ok(progress)
    }

    /// Credit the work sessions a run finished, aborted or not
    pub fn record(&self, outcome: &SessionOutcome) -> Result<()> {
        if outcome.sessions_completed == 0 {
            return Ok(());
        }
        self.add_on(
            outcome.ended_at.date_naive(),
            outcome.sessions_completed,
            outcome.total_work_minutes(),
        )?;
        Ok(())
    }

    pub fn today(&self) -> Result<Progress> {
        self.progress_on(Utc::now().date_naive())
    }
}

fn load_json<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    const GOALS: Goals = Goals {
        daily_session_target: 4,
        daily_minutes: 100,
    };

    #[test]
    fn test_unset_goal_never_met() {
        assert!(!Goals::default().met_by(10, 1000));
        assert!(GOALS.met_by(4, 100));
        assert!(!GOALS.met_by(4, 99));
    }

    #[test]
    fn test_same_day_accumulates() {
        let mut progress = Progress::default();
        progress.add(day(1), &GOALS, 2, 50);
        progress.add(day(1), &GOALS, 1, 25);
        assert_eq!(progress.sessions_today, 3);
        assert_eq!(progress.minutes_today, 75);
        assert_eq!(progress.current_streak, 0);
    }

    #[test]
    fn test_streak_grows_after_met_day() {
        let mut progress = Progress::default();
        progress.add(day(1), &GOALS, 4, 100);
        progress.add(day(2), &GOALS, 4, 100);
        progress.add(day(3), &GOALS, 1, 25);
        assert_eq!(progress.current_streak, 2);
        assert_eq!(progress.longest_streak, 2);
        assert_eq!(progress.sessions_today, 1);

        progress.add(day(4), &GOALS, 1, 25);
        assert_eq!(progress.current_streak, 0);
        assert_eq!(progress.longest_streak, 2);
    }

    #[test]
    fn test_gap_day_resets_streak() {
        let mut progress = Progress::default();
        progress.add(day(1), &GOALS, 4, 100);
        progress.add(day(2), &GOALS, 4, 100);
        progress.add(day(5), &GOALS, 1, 25);
        assert_eq!(progress.current_streak, 0);
        assert_eq!(progress.longest_streak, 1);
    }

    #[test]
    fn test_tracker_persists() {
        let dir = TempDir::new().unwrap();
        let tracker = GoalTracker::new(&dir.path().join("goals.json"), &dir.path().join("progress.json"));
        tracker.set_goals(&GOALS).unwrap();

        tracker.add_on(day(1), 4, 100).unwrap();
        tracker.add_on(day(1), 1, 25).unwrap();

        let progress = tracker.progress_on(day(1)).unwrap();
        assert_eq!(progress.sessions_today, 5);

        let next = tracker.progress_on(day(2)).unwrap();
        assert_eq!(next.sessions_today, 0);
        assert_eq!(next.current_streak, 1);
        // Reading does not write
        assert_eq!(tracker.progress_on(day(1)).unwrap().sessions_today, 5);
    }
}
