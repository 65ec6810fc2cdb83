//! Lifecycle hooks and the plugin runner behind them
//!
//! The orchestrator fires four triggers with a string payload. Sinks are
//! best-effort: a failing sink is logged by the caller and the run goes on.
//!
//! Plugins are shell snippets from `plugins.json`. `$KEY` placeholders are
//! replaced with payload values, payload entries are exported as `POM_<KEY>`
//! and any plugin `args` become the script's positional parameters.

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    SessionStart,
    SessionEnd,
    BreakStart,
    BreakEnd,
}

impl Trigger {
    pub const ALL: [Trigger; 4] = [
        Trigger::SessionStart,
        Trigger::SessionEnd,
        Trigger::BreakStart,
        Trigger::BreakEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::SessionStart => "session_start",
            Trigger::SessionEnd => "session_end",
            Trigger::BreakStart => "break_start",
            Trigger::BreakEnd => "break_end",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Payload of a hook, keyed by upper-case names such as `DURATION`
pub type Payload = BTreeMap<String, String>;

/// A trigger together with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    pub trigger: Trigger,
    pub payload: Payload,
}

impl HookEvent {
    pub fn new(trigger: Trigger, payload: Payload) -> Self {
        Self { trigger, payload }
    }
}

/// Receives lifecycle events
pub trait HookSink: Send + Sync {
    fn fire(&self, event: &HookEvent) -> Result<()>;
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl HookSink for NoHooks {
    fn fire(&self, _event: &HookEvent) -> Result<()> {
        Ok(())
    }
}

/// A user plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub script: String,
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Plugin {
    pub fn runs_on(&self, trigger: Trigger) -> bool {
        self.enabled && self.triggers.contains(&trigger)
    }
}

/// Contents of `plugins.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSet {
    pub plugins: Vec<Plugin>,
}

impl Default for PluginSet {
    /// Disabled examples shipped on first run
    fn default() -> Self {
        Self {
            plugins: vec![
                Plugin {
                    name: "slack-notify".to_string(),
                    description: "Post to Slack when a run finishes".to_string(),
                    script: r#"curl -s -X POST -H 'Content-type: application/json' --data '{"text":"Finished $SESSIONS focus sessions ($TOTAL_MINUTES min)"}' "$SLACK_WEBHOOK_URL""#.to_string(),
                    triggers: vec![Trigger::SessionEnd],
                    enabled: false,
                    args: Vec::new(),
                },
                Plugin {
                    name: "break-reminder".to_string(),
                    description: "Desktop notification when a break starts".to_string(),
                    script: "notify-send 'pom' 'Break time: $DURATION minutes'".to_string(),
                    triggers: vec![Trigger::BreakStart],
                    enabled: false,
                    args: Vec::new(),
                },
                Plugin {
                    name: "focus-log".to_string(),
                    description: "Append session starts to a text file".to_string(),
                    script: "echo \"$DATE start $DURATION/$BREAK_DURATION x$SESSIONS\" >> \"$HOME/pom-focus.log\"".to_string(),
                    triggers: vec![Trigger::SessionStart],
                    enabled: false,
                    args: Vec::new(),
                },
            ],
        }
    }
}

impl PluginSet {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plugins: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse plugins: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write plugins: {}", path.display()))
    }

    pub fn add(&mut self, plugin: Plugin) -> Result<()> {
        if self.plugins.iter().any(|p| p.name == plugin.name) {
            bail!("Plugin already exists: {}", plugin.name);
        }
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        match self.plugins.iter_mut().find(|p| p.name == name) {
            Some(plugin) => {
                plugin.enabled = enabled;
                Ok(())
            }
            None => bail!("Plugin not found: {}", name),
        }
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$([A-Z_][A-Z0-9_]*)").expect("placeholder pattern is valid"))
}

/// Replace `$KEY` with payload values, leaving unknown names for the shell
pub fn expand(script: &str, payload: &Payload) -> String {
    placeholder()
        .replace_all(script, |caps: &Captures| match payload.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Runs enabled plugins for each trigger
///
/// Must be used inside a tokio runtime: scripts are spawned without blocking
/// the timer and reaped on background tasks that log failures. Clones share
/// the set of running plugins; call [`PluginHooks::drain`] before the runtime
/// goes away so late plugins such as `session_end` get to finish.
#[derive(Debug, Clone)]
pub struct PluginHooks {
    plugins: PluginSet,
    running: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl PluginHooks {
    pub fn new(plugins: PluginSet) -> Self {
        Self {
            plugins,
            running: Arc::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(PluginSet::load(path)?))
    }

    fn running(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start every plugin for `event`, returning how many were started
    pub fn launch(&self, event: &HookEvent) -> Result<usize> {
        let mut reapers = Vec::new();
        let mut failed = Vec::new();

        for plugin in self.plugins.plugins.iter().filter(|p| p.runs_on(event.trigger)) {
            match spawn_plugin(plugin, &event.payload) {
                Ok(reaper) => reapers.push(reaper),
                Err(e) => {
                    warn!("Plugin '{}' failed to start: {:#}", plugin.name, e);
                    failed.push(plugin.name.clone());
                }
            }
        }

        let started = reapers.len();
        {
            let mut running = self.running();
            running.retain(|reaper| !reaper.is_finished());
            running.extend(reapers);
        }

        if !failed.is_empty() {
            bail!("{} plugin(s) failed to start: {}", failed.len(), failed.join(", "));
        }
        Ok(started)
    }

    /// Wait up to `timeout` for running plugins; returns how many are still running
    pub async fn drain(&self, timeout: Duration) -> usize {
        let pending = std::mem::take(&mut *self.running());
        if pending.is_empty() {
            return 0;
        }
        debug!("Waiting for {} plugin(s)", pending.len());

        let deadline = tokio::time::Instant::now() + timeout;
        let mut unfinished = 0;
        for reaper in pending {
            match tokio::time::timeout_at(deadline, reaper).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Plugin reaper failed: {}", e),
                Err(_) => unfinished += 1,
            }
        }
        if unfinished > 0 {
            warn!("{} plugin(s) still running after {:?}", unfinished, timeout);
        }
        unfinished
    }
}

impl HookSink for PluginHooks {
    fn fire(&self, event: &HookEvent) -> Result<()> {
        self.launch(event).map(|_| ())
    }
}

fn spawn_plugin(plugin: &Plugin, payload: &Payload) -> Result<JoinHandle<()>> {
    let script = expand(&plugin.script, payload);
    debug!("Running plugin '{}': {}", plugin.name, script);

    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(&script).arg(&plugin.name).args(&plugin.args);
    for (key, value) in payload {
        cmd.env(format!("POM_{}", key.to_uppercase()), value);
    }
    // Only stderr is kept, for the failure log
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn plugin '{}'", plugin.name))?;

    let name = plugin.name.clone();
    Ok(tokio::spawn(async move {
        match child.wait_with_output().await {
            Ok(output) if output.status.success() => debug!("Plugin '{}' finished", name),
            Ok(output) => warn!(
                "Plugin '{}' failed ({}): {}",
                name,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("Plugin '{}' could not be awaited: {}", name, e),
        }
    }))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records fired events; can be told to fail
    #[derive(Debug, Clone, Default)]
    pub struct RecordingHooks {
        events: Arc<Mutex<Vec<HookEvent>>>,
        pub fail: bool,
    }

    impl RecordingHooks {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn events(&self) -> Vec<HookEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn triggers(&self) -> Vec<Trigger> {
            self.events().iter().map(|e| e.trigger).collect()
        }
    }

    impl HookSink for RecordingHooks {
        fn fire(&self, event: &HookEvent) -> Result<()> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                bail!("hook sink unavailable");
            }
            Ok(())
        }
    }
}
