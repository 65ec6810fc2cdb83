//! pom - terminal Pomodoro timer
//!
//! Runs a cadence of focus sessions and breaks in the terminal:
//! - Live progress line with pause, resume and quit from the keyboard
//! - Lifecycle hooks that run user plugins
//! - Session log, daily goals with streaks, and per-task time tracking
//! - JSON backups, CSV export and a privacy mode that stops run logging
//!
//! The timer engine is [`session::SessionRunner`] driving
//! [`countdown::Countdown`] over a [`state::TimerStateMachine`] that the
//! [`input::InputListener`] mutates.

pub mod backup;
pub mod clock;
pub mod countdown;
pub mod goals;
pub mod hooks;
pub mod input;
pub mod interrupt;
pub mod notify;
pub mod outcome;
pub mod render;
pub mod session;
pub mod state;
pub mod stats;
pub mod store;
pub mod tasks;

pub use countdown::{Countdown, CountdownResult, IntervalKind, IntervalSpec};
pub use hooks::{HookEvent, HookSink, PluginHooks, Trigger};
pub use interrupt::Interrupt;
pub use outcome::{Bookkeeper, OutcomeReporter, SessionOutcome};
pub use render::{Renderer, SharedRenderer, TerminalRenderer, Theme};
pub use session::SessionRunner;
pub use state::{TimerState, TimerStateMachine};
pub use stats::RunStats;
pub use store::SessionStore;
