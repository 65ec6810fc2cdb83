//! Desktop notifications at interval boundaries

use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Shows a short message outside the terminal
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Discards notifications (`--quiet`)
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// macOS osascript
    Osascript,
    /// Linux notify-send
    NotifySend,
    /// Terminal bell only
    Bell,
}

impl Backend {
    /// Pick the best backend for this platform
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            return Self::Osascript;
        }
        if cfg!(target_os = "linux") && command_exists("notify-send") {
            return Self::NotifySend;
        }
        Self::Bell
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Osascript => "osascript",
            Self::NotifySend => "notify-send",
            Self::Bell => "bell",
        }
    }
}

fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Notifier backed by the platform's notification command
///
/// Notification commands are reaped on a tokio task, so `notify` needs a
/// runtime unless the backend is the bell.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    backend: Backend,
}

impl DesktopNotifier {
    pub fn detect() -> Self {
        let backend = Backend::detect();
        debug!("Notification backend: {}", backend.name());
        Self { backend }
    }

    pub fn with_backend(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        match self.backend {
            Backend::Osascript => {
                let script = format!(
                    r#"display notification "{}" with title "{}" sound name "default""#,
                    body.replace('"', r#"\""#),
                    title.replace('"', r#"\""#)
                );
                spawn(tokio::process::Command::new("osascript").args(["-e", &script])).map(drop)
            }
            Backend::NotifySend => {
                spawn(tokio::process::Command::new("notify-send").args([title, body])).map(drop)
            }
            Backend::Bell => {
                // stderr, so the bell never lands inside the progress line
                let mut out = std::io::stderr();
                out.write_all(b"\x07")?;
                out.flush()?;
                Ok(())
            }
        }
    }
}

/// Start the command and reap it on a background task
fn spawn(cmd: &mut tokio::process::Command) -> Result<JoinHandle<()>> {
    tokio::runtime::Handle::try_current().context("Notifications need a tokio runtime")?;
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to run notifier")?;

    Ok(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => debug!("Notifier exited with {}", status),
            Err(e) => warn!("Notifier could not be awaited: {}", e),
        }
    }))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) -> Result<()> {
            self.sent.lock().unwrap().push((title.to_string(), body.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::NotifySend.name(), "notify-send");
        assert_eq!(DesktopNotifier::with_backend(Backend::Bell).backend(), Backend::Bell);
    }

    #[test]
    fn test_silent_never_fails() {
        assert!(Silent.notify("pom", "hello").is_ok());
    }

    #[tokio::test]
    async fn test_missing_command_is_an_error() {
        let err = spawn(&mut tokio::process::Command::new("pom-no-such-notifier-binary")).unwrap_err();
        assert!(err.to_string().contains("Failed to run notifier"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_notifier_child_is_reaped() {
        let reaper = spawn(&mut tokio::process::Command::new("true")).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), reaper)
            .await
            .expect("notifier child was not reaped")
            .unwrap();
    }

    #[test]
    fn test_spawn_needs_a_runtime() {
        let err = spawn(&mut tokio::process::Command::new("true")).unwrap_err();
        assert!(err.to_string().contains("tokio runtime"));
    }
}
