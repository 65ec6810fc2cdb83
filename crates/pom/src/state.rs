//! Timer state machine
//!
//! ```text
//! Running <-> Paused
//!    \         /
//!     Quitting        (terminal)
//! ```
//!
//! The state lives in a `tokio::sync::watch` channel. Writers never assign
//! it directly: they submit a [`Transition`] and the channel applies it
//! atomically, validating it against the current state. Readers get the
//! current value without locking out writers and can await the next change,
//! which is how the countdown blocks while paused.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Running,
    Paused,
    Quitting,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Quitting => "quitting",
        }
    }

    /// The state `transition` leads to, or `None` when it does not apply here
    pub fn apply(self, transition: Transition) -> Option<TimerState> {
        use TimerState::*;
        match (self, transition) {
            (Running, Transition::Pause) => Some(Paused),
            (Paused, Transition::Resume) => Some(Running),
            (Running | Paused, Transition::Quit) => Some(Quitting),
            _ => None,
        }
    }
}

/// A requested state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pause,
    Resume,
    Quit,
}

/// Handle to the state of one run
///
/// Cloning shares the same underlying state.
#[derive(Debug, Clone)]
pub struct TimerStateMachine {
    // watch::Sender is not Clone
    tx: Arc<watch::Sender<TimerState>>,
}

impl Default for TimerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerStateMachine {
    /// A fresh machine in `Running`
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TimerState::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Apply a transition. Returns true when the state changed.
    pub fn request(&self, transition: Transition) -> bool {
        self.tx.send_if_modified(|state| match state.apply(transition) {
            Some(next) => {
                *state = next;
                true
            }
            None => false,
        })
    }

    pub fn request_pause(&self) -> bool {
        self.request(Transition::Pause)
    }

    pub fn request_resume(&self) -> bool {
        self.request(Transition::Resume)
    }

    pub fn request_quit(&self) -> bool {
        self.request(Transition::Quit)
    }

    pub fn state(&self) -> TimerState {
        *self.tx.borrow()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> StateWatch {
        StateWatch {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the state machine
#[derive(Debug, Clone)]
pub struct StateWatch {
    rx: watch::Receiver<TimerState>,
}

impl StateWatch {
    /// Current state, marking it as seen
    pub fn current(&mut self) -> TimerState {
        *self.rx.borrow_and_update()
    }

    /// Wait for the next change and return the new state.
    ///
    /// If every machine handle is gone the run can no longer be steered, so
    /// this resolves to `Quitting`.
    pub async fn changed(&mut self) -> TimerState {
        match self.rx.changed().await {
            Ok(()) => *self.rx.borrow_and_update(),
            Err(_) => TimerState::Quitting,
        }
    }

    /// Block until the state is anything but `Paused`
    pub async fn wait_unpaused(&mut self) -> TimerState {
        match self.rx.wait_for(|s| *s != TimerState::Paused).await {
            Ok(state) => *state,
            Err(_) => TimerState::Quitting,
        }
    }
}
