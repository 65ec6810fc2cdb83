//! pom-core - Shared functionality for the pom focus timer
//!
//! Paths, the JSON configuration file with its profiles, and the small
//! formatting helpers every pom command prints with.

pub mod config;
pub mod format;
pub mod paths;

pub use config::{Config, ConfigError, Profile, ProfileSet};
pub use paths::Paths;
