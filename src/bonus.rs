use log::debug;
use rand::{seq::SliceRandom, Rng};

use crate::track::{lane_progress, EXIT_SPAN, PLAYER_SPAN};
use crate::wave::{Slot, SLOT_COUNT};

/// Collectible letter travelling down a lane alongside the wave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusItem {
    pub id: u32,
    pub batch: u64,
    pub slot: Slot,
    pub ch: char,
    pub spawn_ms: u64,
    pub expire_ms: u64,
    pub active: bool,
}

impl BonusItem {
    pub fn progress(&self, now: u64) -> f64 {
        // same speed as the obstacles: the player line sits at PLAYER_SPAN of the full travel
        let travel = self.expire_ms - self.spawn_ms;
        let arrive = self.spawn_ms + travel * PLAYER_SPAN / (PLAYER_SPAN + EXIT_SPAN);
        lane_progress(self.spawn_ms, arrive, self.expire_ms, now)
    }
}

/// Periodic side channel of collectible letters
#[derive(Debug, Clone)]
pub struct BonusSpawner {
    interval_ms: u64,
    points: u64,
    items: Vec<BonusItem>,
    batch: u64,
    next_id: u32,
}

impl BonusSpawner {
    pub fn new(interval_ms: u64, points: u64) -> Self {
        Self {
            interval_ms,
            points,
            items: Vec::new(),
            batch: 0,
            next_id: 1,
        }
    }

    /// A zero interval disables spawning.
    pub fn is_enabled(&self) -> bool {
        self.interval_ms > 0
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn has_active_batch(&self) -> bool {
        self.items.iter().any(|i| i.active)
    }

    pub fn active(&self) -> impl Iterator<Item = &BonusItem> {
        self.items.iter().filter(|i| i.active)
    }

    /// Spawn one item per lane with distinct characters from `pool`, unless a
    /// batch is still travelling. Returns the new batch id.
    pub fn spawn_batch<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        pool: &[char],
        now: u64,
        travel_ms: u64,
    ) -> Option<u64> {
        if self.has_active_batch() || pool.is_empty() {
            return None;
        }
        self.items.clear();
        self.batch += 1;

        let chars: Vec<char> = pool.choose_multiple(rng, SLOT_COUNT).copied().collect();
        for (slot, ch) in chars.into_iter().enumerate() {
            self.items.push(BonusItem {
                id: self.next_id,
                batch: self.batch,
                slot,
                ch,
                spawn_ms: now,
                expire_ms: now + travel_ms,
                active: true,
            });
            self.next_id += 1;
        }
        debug!("bonus batch {} spawned: {:?}", self.batch, self.letters());
        Some(self.batch)
    }

    /// Consume the first active item carrying `ch`, in any lane.
    pub fn consume(&mut self, ch: char) -> Option<BonusItem> {
        let item = self.items.iter_mut().find(|i| i.active && i.ch == ch)?;
        item.active = false;
        Some(item.clone())
    }

    /// End of travel for a batch: unconsumed items are destroyed. Returns how
    /// many were missed; a batch id that is no longer current misses nothing.
    pub fn expire(&mut self, batch: u64) -> usize {
        if batch != self.batch {
            return 0;
        }
        let missed = self.items.iter().filter(|i| i.active).count();
        self.items.clear();
        missed
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn letters(&self) -> Vec<char> {
        self.items.iter().map(|i| i.ch).collect()
    }
}
