use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Lets at most one scream through per cooldown window.
///
/// The gate starts open and closes on the first successful `try_acquire`.
/// Only the background ticker reopens it, once every `cooldown`, whether or
/// not anything was let through in between. A zero cooldown means the gate
/// never closes.
#[derive(Debug)]
pub struct RateLimiter {
    gate: Arc<AtomicBool>,
    cooldown: Duration,
    reopener: Option<JoinHandle<()>>,
}

impl RateLimiter {
    /// Must be called from inside a tokio runtime unless `cooldown` is zero.
    pub fn start(cooldown: Duration) -> Self {
        let gate = Arc::new(AtomicBool::new(true));
        if cooldown.is_zero() {
            return Self {
                gate,
                cooldown,
                reopener: None,
            };
        }

        let reopen = Arc::clone(&gate);
        let first_tick = Instant::now() + cooldown;
        let reopener = tokio::spawn(async move {
            let mut ticker = time::interval_at(first_tick, cooldown);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                reopen.store(true, Ordering::Release);
            }
        });

        Self {
            gate,
            cooldown,
            reopener: Some(reopener),
        }
    }

    /// Returns `true` at most once between two ticks, closing the gate.
    pub fn try_acquire(&self) -> bool {
        if self.is_disabled() {
            return true;
        }
        self.gate
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_disabled(&self) -> bool {
        self.cooldown.is_zero()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(reopener) = self.reopener.take() {
            reopener.abort();
        }
    }
}
