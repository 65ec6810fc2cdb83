//! Session log storage
//!
//! One JSON line per run, appended to `sessions-YYYY-MM-DD.jsonl` under the
//! sessions directory. The file is chosen by the run's start date (UTC).

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::outcome::{OutcomeReporter, SessionOutcome};

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create sessions directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("sessions-{}.jsonl", date))
    }

    /// Dates that have a log file, oldest first
    fn logged_dates(&self) -> Result<Vec<NaiveDate>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list sessions directory: {}", self.dir.display()))?;

        let mut dates: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let date = name.strip_prefix("sessions-")?.strip_suffix(".jsonl")?;
                NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort();
        Ok(dates)
    }

    /// Append one run to its day's log
    pub fn record(&self, outcome: &SessionOutcome) -> Result<()> {
        let path = self.log_path(outcome.started_at.date_naive());
        let line = serde_json::to_string(outcome).context("Failed to serialize session outcome")?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open session log: {}", path.display()))?;

        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write to session log: {}", path.display()))
    }

    /// Runs started on `date`; unreadable lines are skipped
    pub fn for_date(&self, date: NaiveDate) -> Result<Vec<SessionOutcome>> {
        let path = self.log_path(date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)
            .with_context(|| format!("Failed to open session log: {}", path.display()))?;

        let mut runs = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {} of {}", n + 1, path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionOutcome>(&line) {
                Ok(run) => runs.push(run),
                Err(e) => warn!("Skipping line {} of {}: {}", n + 1, path.display(), e),
            }
        }
        Ok(runs)
    }

    /// Runs of the last `days` days including today, oldest first
    pub fn for_days(&self, days: u32) -> Result<Vec<SessionOutcome>> {
        self.for_days_until(Utc::now().date_naive(), days)
    }

    pub fn for_days_until(&self, today: NaiveDate, days: u32) -> Result<Vec<SessionOutcome>> {
        let mut runs = Vec::new();
        for i in 0..days {
            runs.extend(self.for_date(today - Duration::days(i as i64))?);
        }
        runs.sort_by_key(|r| r.started_at);
        Ok(runs)
    }

    /// Every logged run, oldest first
    pub fn all(&self) -> Result<Vec<SessionOutcome>> {
        let mut runs = Vec::new();
        for date in self.logged_dates()? {
            runs.extend(self.for_date(date)?);
        }
        runs.sort_by_key(|r| r.started_at);
        Ok(runs)
    }

    /// Log runs that are not there yet (same start time); returns how many were added
    pub fn merge(&self, runs: &[SessionOutcome]) -> Result<usize> {
        let mut added = 0;
        for run in runs {
            let known = self.for_date(run.started_at.date_naive())?;
            if known.iter().any(|r| r.started_at == run.started_at) {
                continue;
            }
            self.record(run)?;
            added += 1;
        }
        Ok(added)
    }

    /// Delete every log file; returns the removed paths
    pub fn clear(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for date in self.logged_dates()? {
            let path = self.log_path(date);
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
            removed.push(path);
        }
        Ok(removed)
    }
}

impl OutcomeReporter for SessionStore {
    fn report(&self, outcome: &SessionOutcome) -> Result<()> {
        self.record(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::testing::outcome;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_day() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        assert!(store.for_date(at(1, 0).date_naive()).unwrap().is_empty());
    }

    #[test]
    fn test_record_goes_to_start_date() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();

        let mut run = outcome(2, 4, 25);
        run.started_at = at(5, 23);
        run.ended_at = at(6, 1);
        store.record(&run).unwrap();

        assert!(dir.path().join("sessions-2024-03-05.jsonl").exists());
        assert_eq!(store.for_date(at(5, 0).date_naive()).unwrap(), vec![run]);
        assert!(store.for_date(at(6, 0).date_naive()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();

        let mut run = outcome(1, 1, 25);
        run.started_at = at(7, 9);
        store.record(&run).unwrap();

        let path = dir.path().join("sessions-2024-03-07.jsonl");
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        writeln!(file).unwrap();

        assert_eq!(store.for_date(at(7, 0).date_naive()).unwrap().len(), 1);
    }

    #[test]
    fn test_for_days_sorted_oldest_first() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();

        for (day, hour) in [(10, 15), (8, 9), (10, 8), (2, 12)] {
            let mut run = outcome(1, 1, 25);
            run.started_at = at(day, hour);
            store.record(&run).unwrap();
        }

        let runs = store.for_days_until(at(10, 0).date_naive(), 3).unwrap();
        let starts: Vec<_> = runs.iter().map(|r| r.started_at).collect();
        assert_eq!(starts, vec![at(8, 9), at(10, 8), at(10, 15)]);
    }

    #[test]
    fn test_all_merge_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a log").unwrap();

        let mut first = outcome(1, 1, 25);
        first.started_at = at(3, 9);
        let mut second = outcome(2, 4, 25);
        second.started_at = at(1, 9);
        store.record(&first).unwrap();

        assert_eq!(store.merge(&[first.clone(), second.clone()]).unwrap(), 1);
        assert_eq!(store.all().unwrap(), vec![second, first]);

        assert_eq!(store.clear().unwrap().len(), 2);
        assert!(store.all().unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }
}
