//! Export, import and removal of stored data
//!
//! A JSON backup carries everything pom keeps: logged runs, tasks, goals and
//! progress, config and profiles. The CSV export covers the session log only.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pom_core::{Config, Paths, Profile, ProfileSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::goals::{Goals, Progress};
use crate::outcome::SessionOutcome;
use crate::store::SessionStore;
use crate::tasks::{Task, TaskList};

const CSV_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Contents of a JSON backup; every section is optional on import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sessions: Vec<SessionOutcome>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Goals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// What a restore wrote
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Restored {
    /// Runs added to the session log (already logged runs are skipped)
    pub sessions: usize,
    pub tasks: usize,
    pub profiles: usize,
}

impl Backup {
    /// Gather everything stored under `paths`
    pub fn collect(paths: &Paths) -> Result<Self> {
        Ok(Self {
            exported_at: Some(Utc::now()),
            sessions: SessionStore::new(&paths.sessions_dir())?.all()?,
            tasks: TaskList::load(&paths.tasks_file())?.tasks,
            goals: Some(Goals::load(&paths.goals_file())?),
            progress: Some(Progress::load(&paths.progress_file())?),
            config: Some(Config::load(&paths.config_file())?),
            profiles: ProfileSet::load(&paths.profiles_file())?.profiles,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read backup: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse backup: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write backup: {}", path.display()))
    }

    /// Write the backup's contents under `paths`
    ///
    /// Runs are merged into the session log. Tasks and profiles replace the
    /// stored lists when the backup has any; goals, progress and config
    /// replace the stored files when present.
    pub fn restore(&self, paths: &Paths) -> Result<Restored> {
        let mut restored = Restored {
            sessions: SessionStore::new(&paths.sessions_dir())?.merge(&self.sessions)?,
            ..Default::default()
        };

        if !self.tasks.is_empty() {
            TaskList {
                tasks: self.tasks.clone(),
            }
            .save(&paths.tasks_file())
            .context("Failed to import tasks")?;
            restored.tasks = self.tasks.len();
        }
        if !self.profiles.is_empty() {
            ProfileSet {
                profiles: self.profiles.clone(),
            }
            .save(&paths.profiles_file())
            .context("Failed to import profiles")?;
            restored.profiles = self.profiles.len();
        }
        if let Some(goals) = &self.goals {
            goals.save(&paths.goals_file()).context("Failed to import goals")?;
        }
        if let Some(progress) = &self.progress {
            progress.save(&paths.progress_file()).context("Failed to import goal progress")?;
        }
        if let Some(config) = &self.config {
            config.save(&paths.config_file()).context("Failed to import config")?;
        }

        debug!("Restored {:?}", restored);
        Ok(restored)
    }
}

/// Session log as CSV, one row per run
pub fn write_csv<W: Write>(runs: &[SessionOutcome], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "Started",
        "Ended",
        "Work Minutes",
        "Break Minutes",
        "Sessions Planned",
        "Sessions Completed",
        "Focus Minutes",
        "Completed",
        "Task",
    ])?;

    for run in runs {
        writer.write_record([
            run.started_at.format(CSV_TIME_FORMAT).to_string(),
            run.ended_at.format(CSV_TIME_FORMAT).to_string(),
            (run.work_seconds / 60).to_string(),
            (run.break_seconds / 60).to_string(),
            run.sessions_planned.to_string(),
            run.sessions_completed.to_string(),
            run.total_work_minutes().to_string(),
            run.completed.to_string(),
            run.task_id.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush().context("Failed to write CSV")?;
    Ok(())
}

pub fn save_csv(runs: &[SessionOutcome], path: &Path) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(runs, file)
}

/// Delete logged runs, tasks, goals, profiles and plugins, then reset the
/// config to defaults while keeping its privacy setting
pub fn wipe(paths: &Paths) -> Result<Vec<PathBuf>> {
    let privacy_mode = Config::load(&paths.config_file())?.privacy_mode;

    let mut removed = SessionStore::new(&paths.sessions_dir())?.clear()?;
    for path in [
        paths.tasks_file(),
        paths.goals_file(),
        paths.progress_file(),
        paths.profiles_file(),
        paths.plugins_file(),
    ] {
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
            removed.push(path);
        }
    }

    Config {
        privacy_mode,
        ..Config::default()
    }
    .save(&paths.config_file())?;

    info!("Removed {} file(s)", removed.len());
    Ok(removed)
}
