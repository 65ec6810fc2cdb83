//! Time sources
//!
//! Interval arithmetic uses tokio's monotonic [`Instant`], which follows the
//! runtime's virtual clock when tokio time is paused, so the whole engine can
//! be driven deterministically from tests. Wall-clock timestamps (outcome
//! start/end, hook `DATE` values) come from the same trait so they can be
//! pinned too.

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// A source of monotonic and wall-clock time
pub trait Clock: Send + Sync {
    /// Monotonic instant used for deadlines
    fn now(&self) -> Instant;

    /// Calendar timestamp used for records and hook payloads
    fn wall(&self) -> DateTime<Utc>;
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_follows_paused_runtime() {
        let clock = SystemClock;
        let before = clock.now();
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(clock.now() - before, Duration::from_secs(90));
    }
}
