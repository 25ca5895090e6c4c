use crate::timer::{Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    timer: TimerId,
    deadline_ms: u64,
    generation: u64,
}

/// Per-wave reaction countdown.
///
/// The expiry callback is the event handed to `start`; it sits in the
/// scheduler until it fires or the clock is cancelled. Only the timer the
/// clock is currently armed with can expire it, so a callback that outlives
/// its clock is inert.
#[derive(Debug, Default)]
pub struct ReactionClock {
    armed: Option<Armed>,
}

impl ReactionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the clock, cancelling whatever it was armed with before.
    pub fn start<E>(
        &mut self,
        timers: &mut Scheduler<E>,
        now: u64,
        window_ms: u64,
        generation: u64,
        on_expire: E,
    ) {
        self.cancel(timers);
        let timer = timers.schedule(now, window_ms, on_expire);
        self.armed = Some(Armed {
            timer,
            deadline_ms: now.saturating_add(window_ms),
            generation,
        });
    }

    pub fn cancel<E>(&mut self, timers: &mut Scheduler<E>) -> bool {
        match self.armed.take() {
            Some(armed) => timers.cancel(armed.timer),
            None => false,
        }
    }

    /// Called when a scheduled timer fires. Yields the armed generation
    /// exactly once, and only for the timer the clock is armed with.
    pub fn expire(&mut self, timer: TimerId) -> Option<u64> {
        match self.armed {
            Some(armed) if armed.timer == timer => {
                self.armed = None;
                Some(armed.generation)
            }
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.armed.map(|a| a.deadline_ms)
    }

    pub fn remaining(&self, now: u64) -> Option<u64> {
        self.deadline().map(|d| d.saturating_sub(now))
    }
}
