//! Task list that runs can be booked against

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task title cannot be empty")]
    EmptyTitle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub sessions: u32,
    #[serde(default)]
    pub minutes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Short random id, easy to type on the command line
fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

impl TaskList {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tasks: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse tasks: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write tasks: {}", path.display()))
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look up a task, failing with [`TaskError::NotFound`]
    pub fn require(&self, id: &str) -> Result<&Task> {
        match self.get(id) {
            Some(task) => Ok(task),
            None => bail!(TaskError::NotFound(id.to_string())),
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => Ok(task),
            None => bail!(TaskError::NotFound(id.to_string())),
        }
    }

    pub fn add(&mut self, title: &str, description: &str, tags: Vec<String>) -> &Task {
        self.tasks.push(Task {
            id: new_id(),
            title: title.trim().to_string(),
            description: description.to_string(),
            tags,
            completed: false,
            sessions: 0,
            minutes: 0,
            created_at: Utc::now(),
            completed_at: None,
        });
        &self.tasks[self.tasks.len() - 1]
    }

    pub fn complete(&mut self, id: &str) -> Result<()> {
        let task = self.get_mut(id)?;
        task.completed = true;
        task.completed_at.get_or_insert_with(Utc::now);
        Ok(())
    }

    pub fn credit(&mut self, id: &str, sessions: u32, minutes: u64) -> Result<()> {
        let task = self.get_mut(id)?;
        task.sessions += sessions;
        task.minutes += minutes;
        Ok(())
    }

    /// Open tasks first, each group in creation order
    pub fn listing(&self, include_completed: bool) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| include_completed || !t.completed)
            .collect();
        tasks.sort_by_key(|t| (t.completed, t.created_at));
        tasks
    }
}

/// Validate a title before adding it
pub fn check_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        bail!(TaskError::EmptyTitle);
    }
    Ok(())
}
