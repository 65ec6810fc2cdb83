//! Configuration management for pom
//!
//! `config.json` holds the default cadence plus the selected profile and
//! theme. `profiles.json` holds named cadence presets. Both files are
//! optional: a missing file means built-in defaults.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors surfaced to the CLI
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown config key: {0} (expected work, break, sessions, profile, theme or privacy)")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Profile already exists: {0}")]
    ProfileExists(String),
}

/// Global pom configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Focus interval length in minutes
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,

    /// Break interval length in minutes
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,

    /// Work/break pairs per run
    #[serde(default = "default_num_sessions")]
    pub num_sessions: u32,

    /// Profile applied when `start` gets no `--profile`
    #[serde(default = "default_profile")]
    pub current_profile: String,

    /// Theme name used for terminal output
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Keep finished runs out of the session log
    #[serde(default)]
    pub privacy_mode: bool,
}

fn default_work_minutes() -> u32 {
    25
}

fn default_break_minutes() -> u32 {
    5
}

fn default_num_sessions() -> u32 {
    4
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_theme() -> String {
    "default".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            num_sessions: default_num_sessions(),
            current_profile: default_profile(),
            theme: default_theme(),
            privacy_mode: false,
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Set a single value by its CLI key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "work" | "work_minutes" => self.work_minutes = parse_positive(key, value)?,
            "break" | "break_minutes" => self.break_minutes = parse_minutes(key, value)?,
            "sessions" | "num_sessions" => self.num_sessions = parse_positive(key, value)?,
            "profile" | "current_profile" => self.current_profile = value.to_string(),
            "theme" => self.theme = value.to_string(),
            "privacy" | "privacy_mode" => self.privacy_mode = parse_flag(key, value)?,
            _ => bail!(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_minutes(key: &str, value: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    match parse_minutes(key, value)? {
        0 => bail!(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
        n => Ok(n),
    }
}

/// A named cadence preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub num_sessions: u32,
    #[serde(default)]
    pub description: String,
}

impl Profile {
    pub fn new(name: &str, work: u32, brk: u32, sessions: u32, description: &str) -> Self {
        Self {
            name: name.to_string(),
            work_minutes: work,
            break_minutes: brk,
            num_sessions: sessions,
            description: description.to_string(),
        }
    }
}

/// Contents of `profiles.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSet {
    pub profiles: Vec<Profile>,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self {
            profiles: vec![
                Profile::new("default", 25, 5, 4, "Standard Pomodoro"),
                Profile::new("work", 45, 10, 3, "Deep work sessions"),
                Profile::new("study", 30, 5, 4, "Study sessions"),
                Profile::new("quick", 15, 3, 6, "Quick tasks"),
            ],
        }
    }
}

impl ProfileSet {
    /// Load profiles, falling back to the built-in presets
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profiles: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse profiles: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn add(&mut self, profile: Profile) -> Result<()> {
        if self.get(&profile.name).is_some() {
            bail!(ConfigError::ProfileExists(profile.name));
        }
        self.profiles.push(profile);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Profile> {
        match self.profiles.iter().position(|p| p.name == name) {
            Some(idx) => Ok(self.profiles.remove(idx)),
            None => bail!(ConfigError::ProfileNotFound(name.to_string())),
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.work_minutes, 25);
        assert_eq!(config.num_sessions, 4);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"work_minutes": 50}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.work_minutes, 50);
        assert_eq!(config.break_minutes, 5);
        assert_eq!(config.theme, "default");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set("work", "40").unwrap();
        config.set("theme", "vibrant").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.work_minutes, 40);
        assert_eq!(loaded.theme, "vibrant");
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set("work", "0").is_err());
        assert!(config.set("sessions", "many").is_err());
        assert!(config.set("colour", "red").is_err());
        assert!(config.set("privacy", "maybe").is_err());
        // A zero-minute break is allowed
        config.set("break", "0").unwrap();
        assert_eq!(config.break_minutes, 0);
    }

    #[test]
    fn test_privacy_flag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"work_minutes": 30}"#).unwrap();
        assert!(!Config::load(&path).unwrap().privacy_mode);

        let mut config = Config::default();
        config.set("privacy", "on").unwrap();
        config.save(&path).unwrap();
        assert!(Config::load(&path).unwrap().privacy_mode);
    }

    #[test]
    fn test_builtin_profiles() {
        let set = ProfileSet::default();
        let work = set.get("work").unwrap();
        assert_eq!((work.work_minutes, work.break_minutes, work.num_sessions), (45, 10, 3));
        assert!(set.get("missing").is_none());
    }

    #[test]
    fn test_add_and_remove_profile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiles.json");

        let mut set = ProfileSet::load(&path).unwrap();
        set.add(Profile::new("sprint", 10, 2, 8, "Sprints")).unwrap();
        assert!(set.add(Profile::new("sprint", 1, 1, 1, "")).is_err());
        set.save(&path).unwrap();

        let mut loaded = ProfileSet::load(&path).unwrap();
        assert_eq!(loaded.get("sprint").unwrap().num_sessions, 8);
        loaded.remove("sprint").unwrap();
        assert!(loaded.remove("sprint").is_err());
    }
}
