//! Operating-system interrupt source
//!
//! An [`Interrupt`] is a cheap, clonable view of a one-shot flag. The
//! countdown awaits it alongside its tick timer so a termination request
//! ends the interval at once, without going through the timer state.

use tokio::sync::watch;
use tracing::{debug, info};

/// Fires the interrupt by hand (used by tests and embedders)
#[derive(Debug)]
pub struct InterruptTrigger {
    tx: watch::Sender<bool>,
}

impl InterruptTrigger {
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }
}

/// Awaitable interrupt flag
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// A manually triggered interrupt
    pub fn manual() -> (InterruptTrigger, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptTrigger { tx }, Interrupt { rx })
    }

    /// An interrupt that never fires
    pub fn never() -> Interrupt {
        Self::manual().1
    }

    /// Listen for SIGINT and SIGTERM (Ctrl-C on Windows).
    ///
    /// Must be called inside a tokio runtime. The listener task lives until
    /// the first signal arrives or the runtime shuts down.
    pub fn os() -> Interrupt {
        let (trigger, interrupt) = Self::manual();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("Interrupt signal received");
            trigger.fire();
        });
        interrupt
    }

    pub fn is_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt has fired
    pub async fn fired(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            // Trigger dropped without firing: it never will
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            debug!("SIGTERM handler unavailable: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_manual_fire() {
        let (trigger, mut interrupt) = Interrupt::manual();
        assert!(!interrupt.is_fired());
        trigger.fire();
        assert!(interrupt.is_fired());
        interrupt.fired().await;
    }

    #[tokio::test]
    async fn test_clones_observe_the_same_flag() {
        let (trigger, interrupt) = Interrupt::manual();
        let mut clone = interrupt.clone();
        let waiter = tokio::spawn(async move { clone.fired().await });
        trigger.fire();
        waiter.await.unwrap();
        assert!(interrupt.is_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_does_not_resolve() {
        let mut interrupt = Interrupt::never();
        let result = tokio::time::timeout(Duration::from_secs(3600), interrupt.fired()).await;
        assert!(result.is_err());
    }
}
