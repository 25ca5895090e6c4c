use crate::wave::Slot;

/// Lane length from spawn to the player line
pub const PLAYER_SPAN: u64 = 100;
/// Lane length from the player line to the exit line above the keyboard
pub const EXIT_SPAN: u64 = 12;

/// Time to travel from the player line to the exit at the speed that covers
/// the player span in `window_ms`.
pub fn exit_leg_ms(window_ms: u64) -> u64 {
    window_ms * EXIT_SPAN / PLAYER_SPAN
}

pub fn full_travel_ms(window_ms: u64) -> u64 {
    window_ms + exit_leg_ms(window_ms)
}

/// A falling obstacle in a distractor lane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obstacle {
    pub id: u32,
    pub slot: Slot,
    pub generation: u64,
    pub spawn_ms: u64,
    pub arrive_ms: u64,
    pub finish_ms: u64,
    /// Set once the obstacle has crossed the player line
    pub passed: bool,
}

impl Obstacle {
    pub fn new(id: u32, slot: Slot, generation: u64, spawn_ms: u64, window_ms: u64) -> Self {
        let arrive_ms = spawn_ms + window_ms;
        Self {
            id,
            slot,
            generation,
            spawn_ms,
            arrive_ms,
            finish_ms: arrive_ms + exit_leg_ms(window_ms),
            passed: false,
        }
    }

    /// Position along the lane: 0.0 at spawn, 1.0 at the player line, and
    /// `1 + EXIT_SPAN/PLAYER_SPAN` at the exit.
    pub fn progress(&self, now: u64) -> f64 {
        lane_progress(self.spawn_ms, self.arrive_ms, self.finish_ms, now)
    }
}

pub(crate) fn lane_progress(spawn_ms: u64, arrive_ms: u64, finish_ms: u64, now: u64) -> f64 {
    let exit = 1.0 + EXIT_SPAN as f64 / PLAYER_SPAN as f64;
    let to_player = arrive_ms.saturating_sub(spawn_ms);
    if to_player == 0 {
        return exit;
    }
    let now = now.clamp(spawn_ms, finish_ms);
    let t = (now - spawn_ms) as f64 / to_player as f64;
    t.min(exit)
}
