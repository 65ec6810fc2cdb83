//! Standard paths used by pom

use std::path::{Path, PathBuf};

/// Environment variable that relocates every pom file under one root
pub const HOME_ENV: &str = "POM_HOME";

/// Standard pom paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/pom): session logs, goal progress
    pub data: PathBuf,
    /// Config directory (~/.config/pom): config, profiles, plugins, tasks
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        if let Some(root) = std::env::var_os(HOME_ENV) {
            return Self::with_root(Path::new(&root));
        }

        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("pom");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pom");

        Self { data, config }
    }

    /// Place both directories under a single root
    pub fn with_root(root: &Path) -> Self {
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }

    pub fn profiles_file(&self) -> PathBuf {
        self.config.join("profiles.json")
    }

    pub fn plugins_file(&self) -> PathBuf {
        self.config.join("plugins.json")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.config.join("tasks.json")
    }

    pub fn goals_file(&self) -> PathBuf {
        self.config.join("goals.json")
    }

    /// Goal progress lives with the data, not the settings
    pub fn progress_file(&self) -> PathBuf {
        self.data.join("progress.json")
    }

    /// Directory holding the daily session logs
    pub fn sessions_dir(&self) -> PathBuf {
        self.data.join("sessions")
    }
}
