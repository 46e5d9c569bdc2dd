//! Deferred one-shot generation trigger.
//!
//! Armed when the host reports its world is ready and polled from the main
//! tick. It never runs on its own thread.

use std::time::{Duration, Instant};

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerState {
    Idle,
    Armed { due: Instant },
    Fired,
    Cancelled,
}

#[derive(Debug)]
pub struct GenerationTrigger {
    delay: Duration,
    state: TriggerState,
}

impl GenerationTrigger {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: TriggerState::Idle,
        }
    }

    /// Schedule the trigger `delay` after `now`. Ignored once it has fired
    /// or been cancelled, and when already armed.
    pub fn arm(&mut self, now: Instant) {
        if self.state != TriggerState::Idle {
            debug!("Generation trigger already {:?}, not re-arming", self.state);
            return;
        }
        info!("Map generation scheduled in {}ms", self.delay.as_millis());
        self.state = TriggerState::Armed {
            due: now + self.delay,
        };
    }

    /// Returns `true` exactly once: on the first poll at or after the due time.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            TriggerState::Armed { due } if now >= due => {
                self.state = TriggerState::Fired;
                true
            }
            _ => false,
        }
    }

    /// Disarm a pending trigger. A fired trigger stays fired.
    pub fn cancel(&mut self) {
        if let TriggerState::Armed { .. } | TriggerState::Idle = self.state {
            if self.is_pending() {
                info!("Cancelling pending map generation");
            }
            self.state = TriggerState::Cancelled;
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TriggerState::Armed { .. })
    }

    pub fn has_fired(&self) -> bool {
        self.state == TriggerState::Fired
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == TriggerState::Cancelled
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for GenerationTrigger {
    fn drop(&mut self) {
        self.cancel();
    }
}
