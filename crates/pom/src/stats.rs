//! Run statistics
//!
//! Aggregates logged runs over a window of days:
//! - Runs started and runs finished
//! - Completion rate
//! - Focus time and average per run

use chrono::NaiveDate;

use crate::outcome::SessionOutcome;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Runs started
    pub total_runs: u32,
    /// Runs that finished every planned session
    pub completed_runs: u32,
    /// Work sessions finished across all runs
    pub sessions: u32,
    /// Completed focus time in minutes
    pub total_minutes: u64,
    /// Percentage of runs completed (0-100)
    pub completion_rate: u32,
    /// Focus minutes per run
    pub average_minutes: u64,
    /// Work sessions finished on the reference day
    pub sessions_today: u32,
}

impl RunStats {
    pub fn from_runs(runs: &[SessionOutcome], today: NaiveDate) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let total_runs = runs.len() as u32;
        let completed_runs = runs.iter().filter(|r| r.completed).count() as u32;
        let sessions = runs.iter().map(|r| r.sessions_completed).sum();
        let total_minutes = runs.iter().map(|r| r.total_work_seconds).sum::<u64>() / 60;
        let sessions_today = runs
            .iter()
            .filter(|r| r.started_at.date_naive() == today)
            .map(|r| r.sessions_completed)
            .sum();

        Self {
            total_runs,
            completed_runs,
            sessions,
            total_minutes,
            completion_rate: completed_runs * 100 / total_runs,
            average_minutes: total_minutes / total_runs as u64,
            sessions_today,
        }
    }

    /// Total focus time as (hours, minutes)
    pub fn total_time(&self) -> (u64, u64) {
        (self.total_minutes / 60, self.total_minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::testing::outcome;
    use chrono::{Duration, Utc};

    #[test]
    fn test_empty_stats() {
        let stats = RunStats::from_runs(&[], Utc::now().date_naive());
        assert_eq!(stats, RunStats::default());
    }

    #[test]
    fn test_stats_calculation() {
        let today = Utc::now().date_naive();
        let mut old = outcome(4, 4, 45);
        old.started_at -= Duration::days(2);

        let runs = vec![outcome(4, 4, 25), outcome(1, 4, 25), outcome(0, 2, 25), old];
        let stats = RunStats::from_runs(&runs, today);

        assert_eq!(stats.total_runs, 4);
        assert_eq!(stats.completed_runs, 2);
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.sessions, 9);
        assert_eq!(stats.total_minutes, 100 + 25 + 180);
        assert_eq!(stats.average_minutes, 305 / 4);
        assert_eq!(stats.sessions_today, 5);
        assert_eq!(stats.total_time(), (5, 5));
    }
}
