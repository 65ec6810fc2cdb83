//! Session orchestration
//!
//! A run is `planned` sessions of one work interval each, with a break
//! between consecutive sessions. The runner owns the run's timer state,
//! starts the input listener once, sequences the intervals through the
//! countdown and fires lifecycle hooks in program order. Whatever happens,
//! the outcome is reported exactly once and the listener is stopped.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::countdown::{AbortReason, Countdown, CountdownResult, IntervalSpec, TICK};
use crate::hooks::{HookEvent, HookSink, NoHooks, Payload, Trigger};
use crate::input::InputListener;
use crate::interrupt::Interrupt;
use crate::notify::{Notifier, Silent};
use crate::outcome::{NoReport, OutcomeReporter, SessionOutcome};
use crate::render::{Renderer, Style};
use crate::state::TimerStateMachine;

/// Context key linking a run to a task
pub const TASK_ID_KEY: &str = "TASK_ID";

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const ENCOURAGEMENTS: [&str; 10] = [
    "🌟 Great work! Keep up the momentum!",
    "💪 You're making excellent progress!",
    "🎯 Stay focused, you're doing great!",
    "⭐ Well done on completing another session!",
    "🚀 You're crushing it! Keep going!",
    "✨ Fantastic work! Take a well-deserved break!",
    "🌈 You're getting closer to your goals!",
    "💫 Keep up the amazing work!",
    "🔥 You're on fire! Keep that focus!",
    "🌺 Excellent focus session!",
];

/// Encouragement shown after work session `n` (1-based)
pub fn encouragement(n: u32) -> &'static str {
    ENCOURAGEMENTS[(n.saturating_sub(1) as usize) % ENCOURAGEMENTS.len()]
}

/// Interval length for the countdown; out-of-range values saturate
fn seconds(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

fn stamp(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

type Input = Box<dyn AsyncRead + Unpin + Send>;

/// Runs one multi-session Pomodoro
pub struct SessionRunner<W> {
    clock: Arc<dyn Clock>,
    hooks: Box<dyn HookSink>,
    reporter: Box<dyn OutcomeReporter>,
    notifier: Box<dyn Notifier>,
    renderer: W,
    interrupt: Interrupt,
    input: Option<Input>,
    tick: Duration,
    bar_width: Option<usize>,
}

impl<W> SessionRunner<W>
where
    W: Renderer + Clone + 'static,
{
    /// A runner with no collaborators attached
    pub fn new(renderer: W) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            hooks: Box::new(NoHooks),
            reporter: Box::new(NoReport),
            notifier: Box::new(Silent),
            renderer,
            interrupt: Interrupt::never(),
            input: None,
            tick: TICK,
            bar_width: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hooks(mut self, hooks: impl HookSink + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_reporter(mut self, reporter: impl OutcomeReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Keyboard source for pause/resume/quit
    pub fn with_input(mut self, input: impl AsyncRead + Unpin + Send + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = Some(width);
        self
    }

    /// Run `planned` sessions. Returns true only if every interval completed.
    ///
    /// `context` is merged into the `session_start` and `session_end`
    /// payloads; a `TASK_ID` entry is also carried into the outcome.
    pub async fn run_session(mut self, planned: u32, work_secs: u64, break_secs: u64, context: Payload) -> bool {
        let machine = TimerStateMachine::new();
        let mut countdown =
            Countdown::new(Arc::clone(&self.clock), machine.subscribe(), self.interrupt.clone()).with_tick(self.tick);
        if let Some(width) = self.bar_width {
            countdown = countdown.with_bar_width(width);
        }

        self.renderer.message(Style::Highlight, "🎯 Starting Pomodoro Timer");
        self.renderer.message(
            Style::Text,
            &format!(
                "📚 Work: {} min | Break: {} min | Sessions: {}",
                work_secs / 60,
                break_secs / 60,
                planned
            ),
        );

        let listener = self
            .input
            .take()
            .map(|input| InputListener::new(input, machine.clone(), self.renderer.clone()).spawn());

        let started_at = self.clock.wall();
        info!("Run started: {} x {}s work, {}s break", planned, work_secs, break_secs);

        let mut payload = Payload::new();
        payload.insert("DURATION".to_string(), (work_secs / 60).to_string());
        payload.insert("BREAK_DURATION".to_string(), (break_secs / 60).to_string());
        payload.insert("SESSIONS".to_string(), planned.to_string());
        payload.insert("DATE".to_string(), stamp(started_at));
        payload.extend(context);
        let task_id = payload.get(TASK_ID_KEY).cloned();

        self.fire(Trigger::SessionStart, payload.clone());

        let (sessions_completed, result) = self
            .run_intervals(&mut countdown, planned, work_secs, break_secs)
            .await;
        let completed = result.completed();

        if let Some(listener) = listener {
            listener.stop().await;
        }

        let outcome = SessionOutcome {
            sessions_planned: planned,
            sessions_completed,
            total_work_seconds: u64::from(sessions_completed).saturating_mul(work_secs),
            work_seconds: work_secs,
            break_seconds: break_secs,
            started_at,
            ended_at: self.clock.wall(),
            completed,
            task_id,
        };

        if completed {
            payload.insert("COMPLETED".to_string(), "true".to_string());
            payload.insert("TOTAL_MINUTES".to_string(), outcome.total_work_minutes().to_string());
            self.fire(Trigger::SessionEnd, payload);
        }

        if let Err(e) = self.reporter.report(&outcome) {
            warn!("Failed to report session outcome: {:#}", e);
        }

        match result {
            CountdownResult::Completed => {
                self.renderer.message(Style::Success, "🎉 Pomodoro complete! Great job!");
                self.summary(&outcome);
                self.notify("Pomodoro Complete!", "Great job on completing all your sessions!");
            }
            CountdownResult::Aborted(AbortReason::Quit) => {
                self.renderer.message(Style::Warning, "⏹️  Pomodoro stopped early.");
                self.summary(&outcome);
            }
            CountdownResult::Aborted(AbortReason::Interrupted) => {
                self.renderer.message(Style::Warning, "⚠️  Interrupted, progress saved.");
                self.summary(&outcome);
            }
        }

        info!(
            "Run ended: {}/{} sessions, completed={}",
            outcome.sessions_completed, planned, completed
        );
        completed
    }

    /// Work and break intervals in order; stops at the first abort
    async fn run_intervals(
        &mut self,
        countdown: &mut Countdown,
        planned: u32,
        work_secs: u64,
        break_secs: u64,
    ) -> (u32, CountdownResult) {
        let mut sessions_completed = 0;

        for session in 1..=planned {
            self.renderer.message(
                Style::Highlight,
                &format!("📚 Session {}/{} - Focus Time", session, planned),
            );

            let work = IntervalSpec::work(seconds(work_secs));
            let result = countdown.run(&work, &mut self.renderer).await;
            if !result.completed() {
                debug!("Work interval {} aborted: {:?}", session, result);
                return (sessions_completed, result);
            }
            sessions_completed += 1;

            self.renderer.message(Style::Success, encouragement(session));
            self.notify("Work session complete!", "Time for a break!");

            if session < planned {
                let mut payload = Payload::new();
                payload.insert("DURATION".to_string(), (break_secs / 60).to_string());
                payload.insert("SESSION".to_string(), session.to_string());
                payload.insert("DATE".to_string(), stamp(self.clock.wall()));

                self.fire(Trigger::BreakStart, payload.clone());
                self.renderer.message(Style::Highlight, "☕ Break Time");

                let rest = IntervalSpec::rest(seconds(break_secs));
                let result = countdown.run(&rest, &mut self.renderer).await;
                if !result.completed() {
                    debug!("Break after session {} aborted: {:?}", session, result);
                    return (sessions_completed, result);
                }

                self.fire(Trigger::BreakEnd, payload);
                self.notify("Break complete!", "Time to focus!");
            }
        }

        (sessions_completed, CountdownResult::Completed)
    }

    fn fire(&self, trigger: Trigger, payload: Payload) {
        let event = HookEvent::new(trigger, payload);
        if let Err(e) = self.hooks.fire(&event) {
            warn!("Hook {} failed: {:#}", trigger.as_str(), e);
        }
    }

    fn notify(&self, title: &str, body: &str) {
        if let Err(e) = self.notifier.notify(title, body) {
            warn!("Notification failed: {:#}", e);
        }
    }

    fn summary(&mut self, outcome: &SessionOutcome) {
        self.renderer.message(
            Style::Highlight,
            &format!(
                "📊 Sessions completed: {}/{}",
                outcome.sessions_completed, outcome.sessions_planned
            ),
        );
        self.renderer.message(
            Style::Highlight,
            &format!("⏰ Total focus time: {} minutes", outcome.total_work_minutes()),
        );
    }
}
