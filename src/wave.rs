use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};

use crate::error::ConfigError;
use crate::keys::{pool_for, Mode};

/// Number of parallel lanes the player and obstacles occupy
pub const SLOT_COUNT: usize = 3;

pub type Slot = usize;

/// One round: the target sits in the safe slot, distractors fill the rest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    pub generation: u64,
    pub safe_slot: Slot,
    pub target: char,
    pub letters: [char; SLOT_COUNT],
    pub reaction_window_ms: u64,
}

impl Wave {
    pub fn letter_at(&self, slot: Slot) -> char {
        self.letters[slot]
    }

    /// Distractor letters by slot, ascending, skipping the safe slot
    pub fn distractors(&self) -> impl Iterator<Item = (Slot, char)> + '_ {
        self.letters
            .iter()
            .copied()
            .enumerate()
            .filter(move |&(slot, _)| slot != self.safe_slot)
    }

    #[cfg(test)]
    pub fn is_distractor(&self, c: char) -> bool {
        self.distractors().any(|(_, d)| d == c)
    }
}

/// Produces waves from a validated pool
#[derive(Debug, Clone)]
pub struct WaveGenerator {
    pool: Vec<char>,
}

impl WaveGenerator {
    pub fn new(mode: Mode) -> Result<Self, ConfigError> {
        Self::with_pool(mode, pool_for(mode))
    }

    /// Fails when the pool cannot fill every slot with a distinct character.
    pub fn with_pool(mode: Mode, pool: &[char]) -> Result<Self, ConfigError> {
        let pool: Vec<char> = pool.iter().copied().unique().collect();
        if pool.len() < SLOT_COUNT {
            return Err(ConfigError::PoolTooSmall {
                mode,
                len: pool.len(),
                slots: SLOT_COUNT,
            });
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &[char] {
        &self.pool
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        generation: u64,
        reaction_window_ms: u64,
    ) -> Wave {
        let safe_slot = rng.gen_range(0..SLOT_COUNT);
        let target = self.pool[rng.gen_range(0..self.pool.len())];

        let mut wrongs: Vec<char> = self.pool.iter().copied().filter(|&c| c != target).collect();
        wrongs.shuffle(rng);

        let mut letters = [target; SLOT_COUNT];
        let mut wrongs = wrongs.into_iter();
        for (slot, letter) in letters.iter_mut().enumerate() {
            if slot == safe_slot {
                continue;
            }
            // pool size was checked in the constructor
            if let Some(c) = wrongs.next() {
                *letter = c;
            }
        }

        Wave {
            generation,
            safe_slot,
            target,
            letters,
            reaction_window_ms,
        }
    }
}
