use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// A cancellable once-per-second countdown.
///
/// The remaining time is always derived from the deadline fixed at start, so
/// a slow consumer can miss intermediate values (only the latest is kept) but
/// never observes expiry late. Dropping the countdown aborts its timer task.
pub struct Countdown {
    remaining: watch::Receiver<u32>,
    deadline: Instant,
    task: JoinHandle<()>,
}

impl Countdown {
    pub fn start(seconds: u32) -> Self {
        let now = Instant::now();
        let deadline = now + Duration::from_secs(u64::from(seconds));
        let (tx, rx) = watch::channel(seconds);
        let task = tokio::spawn(run(tx, now, deadline));
        Self {
            remaining: rx,
            deadline,
            task,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the next remaining-seconds value.
    ///
    /// Returns `None` once the clock has delivered zero or has been stopped.
    pub async fn next(&mut self) -> Option<u32> {
        self.remaining.changed().await.ok()?;
        Some(*self.remaining.borrow_and_update())
    }

    pub fn stop(&mut self) {
        self.task.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(tx: watch::Sender<u32>, started: Instant, deadline: Instant) {
    let mut interval = tokio::time::interval_at(started + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let remaining = seconds_until(deadline, Instant::now());
        if tx.send(remaining).is_err() || remaining == 0 {
            break;
        }
    }
}

/// Whole seconds left before `deadline`, rounded up.
fn seconds_until(deadline: Instant, now: Instant) -> u32 {
    let left = deadline.saturating_duration_since(now);
    let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
