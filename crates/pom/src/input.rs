//! Keyboard input listener
//!
//! Runs as its own task for a whole run, reading stdin one byte at a time.
//! Keys become transition requests on the [`TimerStateMachine`]; the
//! listener never waits on the countdown. The orchestrator stops it through
//! its [`ListenerHandle`] when the run ends.

use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::render::{Renderer, Style};
use crate::state::TimerStateMachine;

/// Pause before retrying a failed read
const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

pub const CONTROLS_HINT: &str = "⌨️  Controls: [p]ause | [r]esume | [q]uit (then Enter)";

/// Effect of a single keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Paused,
    Resumed,
    Quitting,
    Ignored,
}

/// Apply one input byte to the state machine
pub fn apply_key(machine: &TimerStateMachine, byte: u8) -> KeyOutcome {
    match byte {
        b'p' | b'P' if machine.request_pause() => KeyOutcome::Paused,
        b'r' | b'R' if machine.request_resume() => KeyOutcome::Resumed,
        b'q' | b'Q' if machine.request_quit() => KeyOutcome::Quitting,
        _ => KeyOutcome::Ignored,
    }
}

pub struct InputListener<R, W> {
    reader: R,
    machine: TimerStateMachine,
    renderer: W,
}

impl<R, W> InputListener<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: Renderer + 'static,
{
    pub fn new(reader: R, machine: TimerStateMachine, renderer: W) -> Self {
        Self {
            reader,
            machine,
            renderer,
        }
    }

    /// Start listening on a background task
    pub fn spawn(self) -> ListenerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(stop_rx));
        ListenerHandle {
            stop: Some(stop_tx),
            task,
        }
    }

    /// Read keys until quit, end of input, or a stop request
    pub async fn run(mut self, mut stop: oneshot::Receiver<()>) {
        self.renderer.message(Style::Highlight, CONTROLS_HINT);

        loop {
            let read = tokio::select! {
                biased;
                _ = &mut stop => {
                    debug!("Input listener stopped");
                    return;
                }
                read = self.reader.read_u8() => read,
            };

            match read {
                Ok(byte) => match apply_key(&self.machine, byte) {
                    KeyOutcome::Paused => self
                        .renderer
                        .message(Style::Warning, "⏸️  Timer paused. Press 'r' to resume."),
                    KeyOutcome::Resumed => self.renderer.message(Style::Success, "▶️  Timer resumed."),
                    KeyOutcome::Quitting => {
                        self.renderer.message(Style::Warning, "⏹️  Quitting...");
                        return;
                    }
                    KeyOutcome::Ignored => {}
                },
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!("Input closed, no more keys");
                    return;
                }
                Err(e) => {
                    debug!("Input read failed, retrying: {}", e);
                    tokio::time::sleep(READ_RETRY_DELAY).await;
                }
            }
        }
    }
}

/// Owner's handle on a running listener
pub struct ListenerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop the listener and wait for its task to end
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            // Already gone if it exited on its own
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            debug!("Input listener task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::RecordingRenderer;
    use crate::state::TimerState;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    #[test]
    fn test_apply_key() {
        let machine = TimerStateMachine::new();
        assert_eq!(apply_key(&machine, b'r'), KeyOutcome::Ignored);
        assert_eq!(apply_key(&machine, b'p'), KeyOutcome::Paused);
        assert_eq!(apply_key(&machine, b'P'), KeyOutcome::Ignored);
        assert_eq!(apply_key(&machine, b'x'), KeyOutcome::Ignored);
        assert_eq!(apply_key(&machine, b'R'), KeyOutcome::Resumed);
        assert_eq!(apply_key(&machine, b'Q'), KeyOutcome::Quitting);
        assert_eq!(apply_key(&machine, b'q'), KeyOutcome::Ignored);
        assert_eq!(apply_key(&machine, b'p'), KeyOutcome::Ignored);
        assert_eq!(machine.state(), TimerState::Quitting);
    }

    #[tokio::test]
    async fn test_duplicate_keys_give_one_notice_each() {
        let machine = TimerStateMachine::new();
        let renderer = RecordingRenderer::default();
        let (_stop_tx, stop_rx) = oneshot::channel();

        InputListener::new(&b"pp\nrr\nq\np"[..], machine.clone(), renderer.clone())
            .run(stop_rx)
            .await;

        assert_eq!(
            renderer.messages(),
            vec![
                CONTROLS_HINT.to_string(),
                "⏸️  Timer paused. Press 'r' to resume.".to_string(),
                "▶️  Timer resumed.".to_string(),
                "⏹️  Quitting...".to_string(),
            ]
        );
        assert_eq!(machine.state(), TimerState::Quitting);
    }

    #[tokio::test]
    async fn test_end_of_input_ends_listener() {
        let machine = TimerStateMachine::new();
        let (_stop_tx, stop_rx) = oneshot::channel();

        InputListener::new(&b"p\n"[..], machine.clone(), RecordingRenderer::default())
            .run(stop_rx)
            .await;

        assert_eq!(machine.state(), TimerState::Paused);
    }

    #[tokio::test]
    async fn test_stop_cancels_blocked_read() {
        let machine = TimerStateMachine::new();
        // Keep the write half so reads block forever
        let (_keyboard, reader) = tokio::io::duplex(8);

        let handle = InputListener::new(reader, machine.clone(), RecordingRenderer::default()).spawn();
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        handle.stop().await;
        assert_eq!(machine.state(), TimerState::Running);
    }

    struct FlakyReader {
        failures: usize,
        data: &'static [u8],
    }

    impl AsyncRead for FlakyReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.failures > 0 {
                self.failures -= 1;
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "flaky terminal")));
            }
            let data = self.data;
            let n = data.len().min(buf.remaining());
            buf.put_slice(&data[..n]);
            self.data = &data[n..];
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_are_retried() {
        let machine = TimerStateMachine::new();
        let (_stop_tx, stop_rx) = oneshot::channel();
        let reader = FlakyReader {
            failures: 3,
            data: b"q",
        };

        InputListener::new(reader, machine.clone(), RecordingRenderer::default())
            .run(stop_rx)
            .await;

        assert_eq!(machine.state(), TimerState::Quitting);
    }
}
