//! Countdown engine
//!
//! Drives a single interval to completion. Once per tick it checks the timer
//! state and redraws the progress line; between ticks it also wakes on state
//! changes and on the interrupt, so quitting and signals never wait for the
//! next tick.
//!
//! Pausing moves the deadline: the engine blocks on the state channel while
//! paused (no polling) and, when the resume arrives, pushes the deadline out
//! by exactly the time spent paused. Total unpaused running time therefore
//! always equals the interval's duration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::clock::Clock;
use crate::interrupt::Interrupt;
use crate::render::{self, ProgressLine, Renderer};
use crate::state::{StateWatch, TimerState};

/// Period between state checks and redraws
pub const TICK: Duration = Duration::from_secs(1);

/// Longer intervals are clamped to this (about 30 years)
const MAX_INTERVAL_SECS: u64 = 86400 * 365 * 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    Work,
    Break,
}

/// One work or break period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSpec {
    /// Planned length in seconds; zero or less completes immediately
    pub duration_secs: i64,
    pub label: &'static str,
    pub kind: IntervalKind,
}

impl IntervalSpec {
    pub fn work(duration_secs: i64) -> Self {
        Self {
            duration_secs,
            label: "Focus",
            kind: IntervalKind::Work,
        }
    }

    pub fn rest(duration_secs: i64) -> Self {
        Self {
            duration_secs,
            label: "Break",
            kind: IntervalKind::Break,
        }
    }
}

/// Why an interval stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The operator asked to quit
    Quit,
    /// The process received a termination signal
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownResult {
    Completed,
    Aborted(AbortReason),
}

impl CountdownResult {
    pub fn completed(&self) -> bool {
        matches!(self, CountdownResult::Completed)
    }
}

enum Wake {
    Interrupted,
    State(TimerState),
    Tick,
}

/// Runs intervals against one run's timer state
pub struct Countdown {
    clock: Arc<dyn Clock>,
    state: StateWatch,
    interrupt: Interrupt,
    tick: Duration,
    bar_width: Option<usize>,
}

impl Countdown {
    pub fn new(clock: Arc<dyn Clock>, state: StateWatch, interrupt: Interrupt) -> Self {
        Self {
            clock,
            state,
            interrupt,
            tick: TICK,
            bar_width: None,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Use a fixed bar width instead of asking the terminal
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = Some(width);
        self
    }

    /// Run one interval until it completes or is aborted
    pub async fn run(&mut self, spec: &IntervalSpec, renderer: &mut dyn Renderer) -> CountdownResult {
        if spec.duration_secs <= 0 {
            return CountdownResult::Completed;
        }

        let total_secs = (spec.duration_secs as u64).min(MAX_INTERVAL_SECS);
        let width = self.bar_width.unwrap_or_else(render::bar_width);
        let start = self.clock.now();
        let mut deadline = start + Duration::from_secs(total_secs);

        let mut ticker = tokio::time::interval_at(start + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("{} interval started: {}s", spec.label, total_secs);

        loop {
            if self.interrupt.is_fired() {
                return CountdownResult::Aborted(AbortReason::Interrupted);
            }

            let wake = tokio::select! {
                biased;
                _ = self.interrupt.fired() => Wake::Interrupted,
                state = self.state.changed() => Wake::State(state),
                _ = ticker.tick() => Wake::Tick,
            };

            let state = match wake {
                Wake::Interrupted => return CountdownResult::Aborted(AbortReason::Interrupted),
                Wake::State(state) => state,
                Wake::Tick => self.state.current(),
            };

            match state {
                TimerState::Quitting => return CountdownResult::Aborted(AbortReason::Quit),
                TimerState::Paused => {
                    if let Some(aborted) = self.hold(&mut deadline).await {
                        return aborted;
                    }
                    ticker.reset();
                    continue;
                }
                TimerState::Running => {}
            }

            // Only ticks redraw; a state wake-up just re-evaluates
            if !matches!(wake, Wake::Tick) {
                continue;
            }

            let now = self.clock.now();
            if now >= deadline {
                debug!("{} interval completed", spec.label);
                return CountdownResult::Completed;
            }

            let line = ProgressLine::compute(total_secs, deadline.saturating_duration_since(now), width);
            renderer.progress(spec, &line);
        }
    }

    /// Block while paused. Extends `deadline` by the paused span on resume.
    async fn hold(&mut self, deadline: &mut Instant) -> Option<CountdownResult> {
        let paused_at = self.clock.now();

        let state = tokio::select! {
            biased;
            _ = self.interrupt.fired() => return Some(CountdownResult::Aborted(AbortReason::Interrupted)),
            state = self.state.wait_unpaused() => state,
        };

        if state == TimerState::Quitting {
            return Some(CountdownResult::Aborted(AbortReason::Quit));
        }

        let paused_for = self.clock.now().saturating_duration_since(paused_at);
        *deadline = deadline.checked_add(paused_for).unwrap_or(*deadline);
        debug!("Resumed after {:?}, deadline extended", paused_for);
        None
    }
}
