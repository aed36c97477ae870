use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blocks the calling thread for the pacing and retry delays of the
/// translation client.
pub trait Sleeper: Send {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the current thread with [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Records every requested delay instead of sleeping.
///
/// Clones share the same log, so a test can hand one clone to the engine and
/// keep the other for assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    log: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.log
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of recorded delays equal to `duration`.
    pub fn count_of(&self, duration: Duration) -> usize {
        self.delays()
            .into_iter()
            .filter(|delay| *delay == duration)
            .count()
    }

    pub fn total(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        if let Ok(mut guard) = self.log.lock() {
            guard.push(duration);
        }
    }
}
