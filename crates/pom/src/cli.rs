//! CLI command definitions and handlers

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use pom_core::{format, Config, ConfigError, Paths, Profile, ProfileSet};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use pom::backup::{self, Backup};
use pom::goals::{GoalTracker, Goals};
use pom::hooks::{Payload, Plugin, PluginHooks, PluginSet, Trigger};
use pom::interrupt::Interrupt;
use pom::notify::{DesktopNotifier, Silent};
use pom::outcome::Bookkeeper;
use pom::render::{SharedRenderer, Style, TerminalRenderer, Theme};
use pom::session::{SessionRunner, TASK_ID_KEY};
use pom::stats::RunStats;
use pom::store::SessionStore;
use pom::tasks::{self, TaskList};

/// Exit status after an OS interrupt (128 + SIGINT)
const INTERRUPTED_EXIT: u8 = 130;

/// How long plugins still running at the end of a run get to finish
const PLUGIN_GRACE: Duration = Duration::from_secs(10);

/// pom - Pomodoro timer for the terminal
#[derive(Parser)]
#[command(name = "pom")]
#[command(version)]
#[command(about = "Pomodoro timer with pause/resume, plugins, goals and task tracking")]
#[command(after_help = r#"CONTROLS (while running):
    p + Enter   pause
    r + Enter   resume
    q + Enter   quit and save progress

EXAMPLES:
    pom start                       # Cadence from config (25/5 x4)
    pom start -p work               # Use the 'work' profile
    pom start -w 50 -b 10 -s 2      # Explicit cadence
    pom start -t 1a2b3c4d           # Book the run against a task
    pom stats 30                    # Last 30 days
    pom goal set --sessions 8       # Daily target
    pom export json backup.json     # Everything, for backup
    pom export csv                  # Session log for spreadsheets

FILES:
    Settings live in the config dir (config.json, profiles.json,
    plugins.json, tasks.json, goals.json); session logs and goal
    progress in the data dir. Set POM_HOME to keep both under one root.
    'pom privacy enable' stops run logging.
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a Pomodoro run
    #[command(alias = "s")]
    Start(StartArgs),

    /// Show statistics for recent runs
    Stats {
        /// Number of days to include
        #[arg(default_value = "7")]
        days: u32,
    },

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage cadence profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Choose the color theme
    #[command(subcommand)]
    Theme(ThemeCommand),

    /// Manage lifecycle plugins
    #[command(subcommand)]
    Plugin(PluginCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Daily goals and streaks
    #[command(subcommand)]
    Goal(GoalCommand),

    /// Export data as JSON or CSV
    #[command(subcommand)]
    Export(ExportCommand),

    /// Import data from a JSON backup
    Import {
        /// Backup written by 'pom export json'
        file: PathBuf,
    },

    /// Privacy mode and data removal
    #[command(subcommand)]
    Privacy(PrivacyCommand),
}

#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Work interval in minutes
    #[arg(short, long)]
    pub work: Option<u32>,

    /// Break interval in minutes
    #[arg(short = 'b', long = "break")]
    pub break_minutes: Option<u32>,

    /// Number of work sessions
    #[arg(short, long)]
    pub sessions: Option<u32>,

    /// Profile to take the cadence from
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Task ID to book the run against
    #[arg(short, long)]
    pub task: Option<String>,

    /// Store the resulting cadence as the new default
    #[arg(long)]
    pub save_config: bool,

    /// No desktop notifications
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the current settings
    Show,
    /// Set one value: work, break, sessions, profile, theme, privacy
    Set { key: String, value: String },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// List profiles
    List,
    /// Make a profile the default for `start`
    Use { name: String },
    /// Create a profile
    Add {
        name: String,
        #[arg(short, long)]
        work: u32,
        #[arg(short = 'b', long = "break")]
        break_minutes: u32,
        #[arg(short, long)]
        sessions: u32,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a profile
    Remove { name: String },
}

#[derive(Subcommand)]
pub enum ThemeCommand {
    /// List themes
    List,
    /// Select a theme
    Set { name: String },
}

#[derive(Subcommand)]
pub enum PluginCommand {
    /// List plugins
    List,
    /// Enable a plugin
    Enable { name: String },
    /// Disable a plugin
    Disable { name: String },
    /// Register a shell snippet as a plugin (disabled until enabled)
    Add {
        name: String,
        /// Shell script; $KEY placeholders are filled from the payload
        script: String,
        /// session_start, session_end, break_start or break_end
        #[arg(short, long = "trigger", required = true)]
        triggers: Vec<String>,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Positional arguments passed to the script
        #[arg(long = "arg")]
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Mark a task completed
    Done { id: String },
}

#[derive(Subcommand)]
pub enum GoalCommand {
    /// Set daily targets
    Set {
        /// Work sessions per day
        #[arg(short, long)]
        sessions: Option<u32>,
        /// Focus minutes per day
        #[arg(short, long)]
        minutes: Option<u64>,
    },
    /// Show today's progress
    Show,
}

#[derive(Subcommand)]
pub enum ExportCommand {
    /// Runs, tasks, goals, config and profiles (default: pom-backup-DATE.json)
    Json { file: Option<PathBuf> },
    /// Logged runs (default: pom-sessions-DATE.csv)
    Csv { file: Option<PathBuf> },
}

#[derive(Subcommand)]
pub enum PrivacyCommand {
    /// Stop logging runs
    Enable,
    /// Resume logging runs
    Disable,
    /// Delete runs, tasks, goals, profiles and plugins
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the privacy setting and where data lives
    Status,
}

/// Cadence a run will use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub sessions: u32,
}

/// Profile whose cadence is whatever config.json holds
const CONFIG_PROFILE: &str = "default";

/// Flags beat the selected profile, which beats the config defaults
pub fn resolve_plan(args: &StartArgs, config: &Config, profiles: &ProfileSet) -> Result<Plan> {
    let from_config = Plan {
        work_minutes: config.work_minutes,
        break_minutes: config.break_minutes,
        sessions: config.num_sessions,
    };
    let profile_name = args.profile.as_deref().unwrap_or(&config.current_profile);
    let base = match profiles.get(profile_name) {
        _ if profile_name == CONFIG_PROFILE => from_config,
        Some(profile) => Plan {
            work_minutes: profile.work_minutes,
            break_minutes: profile.break_minutes,
            sessions: profile.num_sessions,
        },
        // An explicit --profile must exist; a stale config entry falls back
        None if args.profile.is_some() => bail!(ConfigError::ProfileNotFound(profile_name.to_string())),
        None => {
            warn!("Profile '{}' not found, using config defaults", profile_name);
            from_config
        }
    };

    let plan = Plan {
        work_minutes: args.work.unwrap_or(base.work_minutes),
        break_minutes: args.break_minutes.unwrap_or(base.break_minutes),
        sessions: args.sessions.unwrap_or(base.sessions),
    };
    if plan.work_minutes == 0 {
        bail!(ConfigError::InvalidValue {
            key: "work".to_string(),
            value: "0".to_string(),
        });
    }
    Ok(plan)
}

/// Theme from config, or no colors when stdout is not a terminal
fn theme_for(config: &Config) -> Theme {
    if !std::io::stdout().is_terminal() {
        return Theme::plain();
    }
    Theme::by_name(&config.theme).unwrap_or_else(|| {
        warn!("Unknown theme '{}', using default", config.theme);
        Theme::default()
    })
}

pub fn execute(command: Commands, paths: &Paths) -> Result<ExitCode> {
    let config = Config::load(&paths.config_file())?;
    let theme = theme_for(&config);

    match command {
        Commands::Start(args) => return cmd_start(args, config, &theme, paths),
        Commands::Stats { days } => cmd_stats(days, config.privacy_mode, &theme, paths)?,
        Commands::Config(cmd) => cmd_config(cmd, config, &theme, paths)?,
        Commands::Profile(cmd) => cmd_profile(cmd, config, &theme, paths)?,
        Commands::Theme(cmd) => cmd_theme(cmd, config, &theme, paths)?,
        Commands::Plugin(cmd) => cmd_plugin(cmd, &theme, paths)?,
        Commands::Task(cmd) => cmd_task(cmd, &theme, paths)?,
        Commands::Goal(cmd) => cmd_goal(cmd, &theme, paths)?,
        Commands::Export(cmd) => cmd_export(cmd, &theme, paths)?,
        Commands::Import { file } => cmd_import(&file, &theme, paths)?,
        Commands::Privacy(cmd) => cmd_privacy(cmd, config, &theme, paths)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn ok(theme: &Theme, text: &str) {
    println!("{} {}", theme.paint(Style::Success, "[ok]"), text);
}

fn cmd_start(args: StartArgs, mut config: Config, theme: &Theme, paths: &Paths) -> Result<ExitCode> {
    let profiles = ProfileSet::load(&paths.profiles_file())?;
    let plan = resolve_plan(&args, &config, &profiles)?;

    if args.save_config {
        config.work_minutes = plan.work_minutes;
        config.break_minutes = plan.break_minutes;
        config.num_sessions = plan.sessions;
        if let Some(profile) = &args.profile {
            config.current_profile = profile.clone();
        }
        config.save(&paths.config_file())?;
        ok(theme, "Saved cadence as default");
    }

    let mut context = Payload::new();
    if let Some(id) = &args.task {
        let tasks = TaskList::load(&paths.tasks_file())?;
        let task = tasks.require(id)?;
        println!("{}", theme.paint(Style::Highlight, &format!("📎 Linked to task: {}", task.title)));
        context.insert(TASK_ID_KEY.to_string(), id.clone());
    }

    let hooks = PluginHooks::load(&paths.plugins_file()).unwrap_or_else(|e| {
        warn!("Plugins disabled: {:#}", e);
        PluginHooks::new(PluginSet { plugins: Vec::new() })
    });
    let reporter = Bookkeeper::new(
        SessionStore::new(&paths.sessions_dir())?,
        GoalTracker::new(&paths.goals_file(), &paths.progress_file()),
    )
    .with_tasks(&paths.tasks_file())
    .with_privacy(config.privacy_mode);
    if config.privacy_mode {
        info!("Privacy mode on, this run will not be logged");
    }

    let rt = tokio::runtime::Runtime::new()?;
    let (completed, interrupted) = rt.block_on(async {
        let interrupt = Interrupt::os();
        let runner = SessionRunner::new(SharedRenderer::new(TerminalRenderer::stdout(theme.clone())))
            .with_hooks(hooks.clone())
            .with_reporter(reporter)
            .with_interrupt(interrupt.clone())
            .with_input(tokio::io::stdin());
        let runner = if args.quiet {
            runner.with_notifier(Silent)
        } else {
            runner.with_notifier(DesktopNotifier::detect())
        };

        let completed = runner
            .run_session(
                plan.sessions,
                plan.work_minutes as u64 * 60,
                plan.break_minutes as u64 * 60,
                context,
            )
            .await;
        hooks.drain(PLUGIN_GRACE).await;
        (completed, interrupt.is_fired())
    });
    // The stdin reader sits in a blocking read that will never return
    rt.shutdown_background();

    info!("Run finished: completed={}, interrupted={}", completed, interrupted);
    Ok(exit_code(interrupted))
}

/// 130 after an OS interrupt; quitting and finishing both exit cleanly
fn exit_code(interrupted: bool) -> ExitCode {
    if interrupted {
        ExitCode::from(INTERRUPTED_EXIT)
    } else {
        ExitCode::SUCCESS
    }
}

fn cmd_stats(days: u32, private: bool, theme: &Theme, paths: &Paths) -> Result<()> {
    let store = SessionStore::new(&paths.sessions_dir())?;
    let runs = store.for_days(days)?;
    let stats = RunStats::from_runs(&runs, Utc::now().date_naive());
    let (hours, mins) = stats.total_time();
    let label = |text: &str| theme.paint(Style::Highlight, text);

    println!("{}", theme.paint(Style::Timer, &format!("Pomodoro Statistics (Last {} days)", days)));
    println!();
    println!("  {}        {}", label("Runs:"), stats.total_runs);
    println!(
        "  {}   {} ({}%)",
        label("Completed:"),
        stats.completed_runs,
        stats.completion_rate
    );
    println!("  {}    {}", label("Sessions:"), stats.sessions);
    println!("  {}  {}h {}m", label("Focus time:"), hours, mins);
    if stats.total_runs > 0 {
        println!("  {} {} minutes", label("Average run:"), stats.average_minutes);
    }
    println!("  {}       {}", label("Today:"), stats.sessions_today);
    if private {
        println!();
        println!("{}", theme.paint(Style::Warning, "Privacy mode is on: new runs are not logged"));
    }
    Ok(())
}

fn cmd_config(cmd: ConfigCommand, mut config: Config, theme: &Theme, paths: &Paths) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            println!("{}", theme.paint(Style::Timer, "Configuration"));
            println!();
            println!("  work:     {} min", config.work_minutes);
            println!("  break:    {} min", config.break_minutes);
            println!("  sessions: {}", config.num_sessions);
            println!("  profile:  {}", config.current_profile);
            println!("  theme:    {}", config.theme);
            println!("  privacy:  {}", if config.privacy_mode { "on" } else { "off" });
            println!();
            println!("  {}", paths.config_file().display());
        }
        ConfigCommand::Set { key, value } => {
            if key == "theme" && Theme::by_name(&value).is_none() {
                bail!(ConfigError::InvalidValue { key, value });
            }
            config.set(&key, &value)?;
            config.save(&paths.config_file())?;
            ok(theme, &format!("{} = {}", key, value));
        }
    }
    Ok(())
}

fn cmd_profile(cmd: ProfileCommand, mut config: Config, theme: &Theme, paths: &Paths) -> Result<()> {
    let path = paths.profiles_file();
    let mut profiles = ProfileSet::load(&path)?;

    match cmd {
        ProfileCommand::List => {
            for p in &profiles.profiles {
                let marker = if p.name == config.current_profile { "*" } else { " " };
                let (work, brk, sessions) = if p.name == CONFIG_PROFILE {
                    (config.work_minutes, config.break_minutes, config.num_sessions)
                } else {
                    (p.work_minutes, p.break_minutes, p.num_sessions)
                };
                println!(
                    "{} {:<12} {:>3}/{:<3} x{:<2} {}",
                    marker,
                    theme.paint(Style::Highlight, &p.name),
                    work,
                    brk,
                    sessions,
                    format::truncate(&p.description, 40)
                );
            }
        }
        ProfileCommand::Use { name } => {
            if profiles.get(&name).is_none() {
                bail!(ConfigError::ProfileNotFound(name));
            }
            config.current_profile = name.clone();
            config.save(&paths.config_file())?;
            ok(theme, &format!("Using profile '{}'", name));
        }
        ProfileCommand::Add {
            name,
            work,
            break_minutes,
            sessions,
            description,
        } => {
            if work == 0 || sessions == 0 {
                bail!("Work minutes and sessions must be positive");
            }
            profiles.add(Profile::new(&name, work, break_minutes, sessions, &description))?;
            profiles.save(&path)?;
            ok(theme, &format!("Added profile '{}'", name));
        }
        ProfileCommand::Remove { name } => {
            profiles.remove(&name)?;
            profiles.save(&path)?;
            ok(theme, &format!("Removed profile '{}'", name));
        }
    }
    Ok(())
}

fn cmd_theme(cmd: ThemeCommand, mut config: Config, theme: &Theme, paths: &Paths) -> Result<()> {
    match cmd {
        ThemeCommand::List => {
            for name in Theme::NAMES {
                let marker = if name == config.theme { "*" } else { " " };
                let sample = Theme::by_name(name).unwrap_or_default();
                println!("{} {}", marker, sample.paint(Style::Timer, name));
            }
        }
        ThemeCommand::Set { name } => {
            if Theme::by_name(&name).is_none() {
                bail!(
                    "Unknown theme: {} (available: {})",
                    name,
                    Theme::NAMES.join(", ")
                );
            }
            config.theme = name.clone();
            config.save(&paths.config_file())?;
            ok(theme, &format!("Theme set to '{}'", name));
        }
    }
    Ok(())
}

fn cmd_plugin(cmd: PluginCommand, theme: &Theme, paths: &Paths) -> Result<()> {
    let path = paths.plugins_file();
    let mut plugins = PluginSet::load(&path)?;

    match cmd {
        PluginCommand::List => {
            for p in &plugins.plugins {
                let state = if p.enabled {
                    theme.paint(Style::Success, "on ")
                } else {
                    theme.paint(Style::Warning, "off")
                };
                let triggers: Vec<&str> = p.triggers.iter().map(Trigger::as_str).collect();
                println!("[{}] {:<16} {:<28} {}", state, p.name, triggers.join(","), p.description);
            }
        }
        PluginCommand::Enable { name } => {
            plugins.set_enabled(&name, true)?;
            plugins.save(&path)?;
            ok(theme, &format!("Enabled plugin '{}'", name));
        }
        PluginCommand::Disable { name } => {
            plugins.set_enabled(&name, false)?;
            plugins.save(&path)?;
            ok(theme, &format!("Disabled plugin '{}'", name));
        }
        PluginCommand::Add {
            name,
            script,
            triggers,
            description,
            args,
        } => {
            let triggers = triggers
                .iter()
                .map(|t| Trigger::parse(t).with_context(|| format!("Unknown trigger: {}", t)))
                .collect::<Result<Vec<_>>>()?;
            plugins.add(Plugin {
                name: name.clone(),
                description,
                script,
                triggers,
                enabled: false,
                args,
            })?;
            plugins.save(&path)?;
            ok(theme, &format!("Added plugin '{}' (run 'pom plugin enable {}')", name, name));
        }
    }
    Ok(())
}

fn cmd_task(cmd: TaskCommand, theme: &Theme, paths: &Paths) -> Result<()> {
    let path = paths.tasks_file();
    let mut list = TaskList::load(&path)?;

    match cmd {
        TaskCommand::Add {
            title,
            description,
            tags,
        } => {
            tasks::check_title(&title)?;
            let id = list.add(&title, &description, tags).id.clone();
            list.save(&path)?;
            ok(theme, &format!("Added task {} ({})", title.trim(), id));
        }
        TaskCommand::List { all } => {
            let shown = list.listing(all);
            if shown.is_empty() {
                println!("No tasks. Add one with: pom task add \"TITLE\"");
            }
            for task in shown {
                let status = if task.completed { "[✓]" } else { "[ ]" };
                println!(
                    "{} {} {}",
                    status,
                    theme.paint(Style::Highlight, &task.id),
                    task.title
                );
                if !task.description.is_empty() {
                    println!("      {}", task.description);
                }
                if !task.tags.is_empty() {
                    println!("      tags: {}", task.tags.join(", "));
                }
                println!(
                    "      {} sessions, {}",
                    task.sessions,
                    format::duration(task.minutes * 60)
                );
            }
        }
        TaskCommand::Done { id } => {
            list.complete(&id)?;
            list.save(&path)?;
            ok(theme, &format!("Completed task {}", id));
        }
    }
    Ok(())
}

fn cmd_goal(cmd: GoalCommand, theme: &Theme, paths: &Paths) -> Result<()> {
    let tracker = GoalTracker::new(&paths.goals_file(), &paths.progress_file());

    match cmd {
        GoalCommand::Set { sessions, minutes } => {
            if sessions.is_none() && minutes.is_none() {
                bail!("Nothing to set: pass --sessions and/or --minutes");
            }
            let mut goals = tracker.goals()?;
            if let Some(sessions) = sessions {
                goals.daily_session_target = sessions;
            }
            if let Some(minutes) = minutes {
                goals.daily_minutes = minutes;
            }
            tracker.set_goals(&goals)?;
            ok(
                theme,
                &format!(
                    "Daily goal: {} sessions, {} minutes",
                    goals.daily_session_target, goals.daily_minutes
                ),
            );
        }
        GoalCommand::Show => {
            let goals: Goals = tracker.goals()?;
            let progress = tracker.today()?;
            println!("{}", theme.paint(Style::Timer, "Daily Goals Progress"));
            println!();
            println!("  Sessions: {}/{}", progress.sessions_today, goals.daily_session_target);
            println!("  Minutes:  {}/{}", progress.minutes_today, goals.daily_minutes);
            println!("  Current streak: {} days", progress.current_streak);
            println!("  Longest streak: {} days", progress.longest_streak);
            if goals.met_by(progress.sessions_today, progress.minutes_today) {
                println!();
                println!("{}", theme.paint(Style::Success, "🎉 Goal met for today!"));
            }
        }
    }
    Ok(())
}

/// `file`, or `STEM-DATE`, with `.ext` appended when it has another extension
fn export_path(file: Option<PathBuf>, stem: &str, ext: &str) -> PathBuf {
    let path = file.unwrap_or_else(|| PathBuf::from(format!("{}-{}", stem, Utc::now().format("%Y-%m-%d"))));
    if path.extension().is_some_and(|e| e == ext) {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn cmd_export(cmd: ExportCommand, theme: &Theme, paths: &Paths) -> Result<()> {
    match cmd {
        ExportCommand::Json { file } => {
            let path = export_path(file, "pom-backup", "json");
            let data = Backup::collect(paths)?;
            data.save(&path)?;
            ok(
                theme,
                &format!(
                    "Exported {} runs and {} tasks to {}",
                    data.sessions.len(),
                    data.tasks.len(),
                    path.display()
                ),
            );
        }
        ExportCommand::Csv { file } => {
            let path = export_path(file, "pom-sessions", "csv");
            let runs = SessionStore::new(&paths.sessions_dir())?.all()?;
            backup::save_csv(&runs, &path)?;
            ok(theme, &format!("Exported {} runs to {}", runs.len(), path.display()));
        }
    }
    Ok(())
}

fn cmd_import(file: &Path, theme: &Theme, paths: &Paths) -> Result<()> {
    let restored = Backup::load(file)?.restore(paths)?;
    ok(
        theme,
        &format!(
            "Imported {} runs, {} tasks and {} profiles from {}",
            restored.sessions,
            restored.tasks,
            restored.profiles,
            file.display()
        ),
    );
    Ok(())
}

fn cmd_privacy(cmd: PrivacyCommand, mut config: Config, theme: &Theme, paths: &Paths) -> Result<()> {
    match cmd {
        PrivacyCommand::Enable => {
            config.privacy_mode = true;
            config.save(&paths.config_file())?;
            ok(theme, "Privacy mode enabled: runs are no longer logged");
            println!("  Goals and task time are still updated");
        }
        PrivacyCommand::Disable => {
            config.privacy_mode = false;
            config.save(&paths.config_file())?;
            ok(theme, "Privacy mode disabled: runs are logged again");
        }
        PrivacyCommand::Clear { yes } => {
            if !yes {
                eprint!("Delete ALL pom data (runs, tasks, goals, profiles, plugins)? [y/N] ");
                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let removed = backup::wipe(paths)?;
            for path in &removed {
                println!("  removed {}", path.display());
            }
            ok(theme, &format!("Cleared {} file(s); config reset, privacy setting kept", removed.len()));
        }
        PrivacyCommand::Status => {
            println!("{}", theme.paint(Style::Timer, "Privacy Settings"));
            println!();
            if config.privacy_mode {
                println!("  Status: {}", theme.paint(Style::Warning, "privacy mode ON"));
                println!("  Runs are not logged; stats only show older runs");
            } else {
                println!("  Status: {}", theme.paint(Style::Success, "normal"));
                println!("  Runs are logged for statistics");
            }
            println!("  Settings: {}", paths.config.display());
            println!("  Data:     {}", paths.data.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_uses_current_profile() {
        let mut config = Config::default();
        config.current_profile = "work".to_string();
        let plan = resolve_plan(&StartArgs::default(), &config, &ProfileSet::default()).unwrap();
        assert_eq!(
            plan,
            Plan {
                work_minutes: 45,
                break_minutes: 10,
                sessions: 3
            }
        );
    }

    #[test]
    fn test_default_profile_reads_config() {
        let mut config = Config::default();
        config.set("work", "40").unwrap();
        config.set("sessions", "2").unwrap();
        let plan = resolve_plan(&StartArgs::default(), &config, &ProfileSet::default()).unwrap();
        assert_eq!((plan.work_minutes, plan.break_minutes, plan.sessions), (40, 5, 2));
    }

    #[test]
    fn test_flags_override_profile() {
        let args = StartArgs {
            profile: Some("quick".to_string()),
            sessions: Some(2),
            ..Default::default()
        };
        let plan = resolve_plan(&args, &Config::default(), &ProfileSet::default()).unwrap();
        assert_eq!((plan.work_minutes, plan.break_minutes, plan.sessions), (15, 3, 2));
    }

    #[test]
    fn test_missing_profile() {
        let args = StartArgs {
            profile: Some("marathon".to_string()),
            ..Default::default()
        };
        assert!(resolve_plan(&args, &Config::default(), &ProfileSet::default()).is_err());

        let mut config = Config::default();
        config.current_profile = "gone".to_string();
        config.work_minutes = 50;
        let plan = resolve_plan(&StartArgs::default(), &config, &ProfileSet::default()).unwrap();
        assert_eq!(plan.work_minutes, 50);
    }

    #[test]
    fn test_zero_work_rejected() {
        let args = StartArgs {
            work: Some(0),
            ..Default::default()
        };
        assert!(resolve_plan(&args, &Config::default(), &ProfileSet::default()).is_err());
    }

    #[test]
    fn test_export_path() {
        assert_eq!(
            export_path(Some(PathBuf::from("out/backup.json")), "pom-backup", "json"),
            PathBuf::from("out/backup.json")
        );
        assert_eq!(
            export_path(Some(PathBuf::from("sessions")), "pom-sessions", "csv"),
            PathBuf::from("sessions.csv")
        );
        assert_eq!(
            export_path(Some(PathBuf::from("backup.txt")), "pom-backup", "json"),
            PathBuf::from("backup.txt.json")
        );

        let dated = export_path(None, "pom-backup", "json");
        let name = dated.to_string_lossy();
        assert!(name.starts_with("pom-backup-"), "{}", name);
        assert!(name.ends_with(".json"), "{}", name);
    }

    #[test]
    fn test_parse_data_commands() {
        let cli = Cli::try_parse_from(["pom", "privacy", "clear", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Privacy(PrivacyCommand::Clear { yes: true })));

        let cli = Cli::try_parse_from(["pom", "export", "csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Export(ExportCommand::Csv { file: None })));

        assert!(Cli::try_parse_from(["pom", "import"]).is_err());
    }

    #[test]
    fn test_exit_code_after_interrupt() {
        assert_eq!(exit_code(true), ExitCode::from(130));
        assert_eq!(exit_code(false), ExitCode::SUCCESS);
    }

    #[test]
    fn test_parse_start_flags() {
        let cli = Cli::try_parse_from(["pom", "start", "-w", "50", "-b", "10", "-s", "2", "--quiet"]).unwrap();
        match cli.command {
            Commands::Start(args) => {
                assert_eq!(args.work, Some(50));
                assert_eq!(args.break_minutes, Some(10));
                assert_eq!(args.sessions, Some(2));
                assert!(args.quiet);
            }
            _ => panic!("expected start"),
        }
    }
}
