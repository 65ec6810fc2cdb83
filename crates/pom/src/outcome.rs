//! Run outcomes and the reporters that book them

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::goals::GoalTracker;
use crate::store::SessionStore;
use crate::tasks::TaskList;

/// Final accounting of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub sessions_planned: u32,
    pub sessions_completed: u32,
    /// Seconds of fully completed work intervals
    pub total_work_seconds: u64,
    pub work_seconds: u64,
    pub break_seconds: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl SessionOutcome {
    pub fn total_work_minutes(&self) -> u64 {
        self.total_work_seconds / 60
    }
}

/// Receives the outcome once per run
pub trait OutcomeReporter: Send + Sync {
    fn report(&self, outcome: &SessionOutcome) -> Result<()>;
}

/// Reporter that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReport;

impl OutcomeReporter for NoReport {
    fn report(&self, _outcome: &SessionOutcome) -> Result<()> {
        Ok(())
    }
}

/// Logs the run, then credits goals and the active task
///
/// Each step is independent: a failure in one is logged and the others still
/// run. The first error is returned so the caller can log it as well. In
/// privacy mode the run is not written to the session log.
pub struct Bookkeeper {
    store: SessionStore,
    goals: GoalTracker,
    tasks_file: Option<std::path::PathBuf>,
    private: bool,
}

impl Bookkeeper {
    pub fn new(store: SessionStore, goals: GoalTracker) -> Self {
        Self {
            store,
            goals,
            tasks_file: None,
            private: false,
        }
    }

    pub fn with_privacy(mut self, enabled: bool) -> Self {
        self.private = enabled;
        self
    }

    fn log(&self, outcome: &SessionOutcome) -> Result<()> {
        if self.private {
            debug!("Privacy mode, run not logged");
            return Ok(());
        }
        self.store.record(outcome)
    }

    /// Credit completed sessions to tasks stored in `path`
    pub fn with_tasks(mut self, path: &Path) -> Self {
        self.tasks_file = Some(path.to_path_buf());
        self
    }

    fn credit_task(&self, outcome: &SessionOutcome) -> Result<()> {
        let (Some(path), Some(id)) = (&self.tasks_file, &outcome.task_id) else {
            return Ok(());
        };
        if outcome.sessions_completed == 0 {
            return Ok(());
        }
        let mut tasks = TaskList::load(path)?;
        tasks.credit(id, outcome.sessions_completed, outcome.total_work_minutes())?;
        tasks.save(path)
    }
}

impl OutcomeReporter for Bookkeeper {
    fn report(&self, outcome: &SessionOutcome) -> Result<()> {
        let steps: [(&str, Result<()>); 3] = [
            ("session log", self.log(outcome)),
            ("goal progress", self.goals.record(outcome)),
            ("task credit", self.credit_task(outcome)),
        ];

        let mut first = None;
        for (what, result) in steps {
            if let Err(e) = result {
                warn!("Failed to update {}: {:#}", what, e);
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    pub struct RecordingReporter {
        reports: Arc<Mutex<Vec<SessionOutcome>>>,
        pub fail: bool,
    }

    impl RecordingReporter {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn reports(&self) -> Vec<SessionOutcome> {
            self.reports.lock().unwrap().clone()
        }
    }

    impl OutcomeReporter for RecordingReporter {
        fn report(&self, outcome: &SessionOutcome) -> Result<()> {
            self.reports.lock().unwrap().push(outcome.clone());
            if self.fail {
                anyhow::bail!("disk full");
            }
            Ok(())
        }
    }

    pub fn outcome(completed: u32, planned: u32, work_minutes: u64) -> SessionOutcome {
        let started_at = Utc::now();
        SessionOutcome {
            sessions_planned: planned,
            sessions_completed: completed,
            total_work_seconds: completed as u64 * work_minutes * 60,
            work_seconds: work_minutes * 60,
            break_seconds: 300,
            started_at,
            ended_at: started_at,
            completed: completed == planned,
            task_id: None,
        }
    }
}
