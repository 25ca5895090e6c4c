use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::keys::Mode;
use crate::wave::{Slot, WaveGenerator, SLOT_COUNT};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Unknown names fall back to `Easy`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }

    /// Base reaction time before the buffer is added
    pub fn base_reaction_ms(self) -> u64 {
        match self {
            Difficulty::Easy => 1_500,
            Difficulty::Medium => 1_100,
            Difficulty::Hard => 800,
        }
    }
}

pub const DEFAULT_REACTION_BUFFER_MS: u64 = 2_000;
pub const DEFAULT_RAMP_EVERY: u32 = 5;
pub const DEFAULT_RAMP_STEP_MS: u64 = 100;
pub const DEFAULT_MIN_REACTION_MS: u64 = 400;
pub const DEFAULT_BONUS_INTERVAL_MS: u64 = 8_000;
pub const DEFAULT_BONUS_POINTS: u64 = 10;
pub const DEFAULT_COUNTDOWN_TICKS: u8 = 3;
pub const DEFAULT_COUNTDOWN_TICK_MS: u64 = 1_000;
pub const DEFAULT_START_SLOT: Slot = 1;
pub const DEFAULT_CHARACTER: char = '▲';

/// Immutable parameters bound when a session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub reaction_buffer_ms: u64,
    /// Correct answers between two ramp steps
    pub ramp_every: u32,
    pub ramp_step_ms: u64,
    /// Floor for the ramped reaction window
    pub min_reaction_ms: u64,
    /// Zero disables bonus items
    pub bonus_interval_ms: u64,
    pub bonus_points: u64,
    pub countdown_ticks: u8,
    pub countdown_tick_ms: u64,
    /// Lane the player stands in before the first answer
    pub start_slot: Slot,
    /// Glyph drawn for the player
    pub character: char,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            difficulty: Difficulty::default(),
            reaction_buffer_ms: DEFAULT_REACTION_BUFFER_MS,
            ramp_every: DEFAULT_RAMP_EVERY,
            ramp_step_ms: DEFAULT_RAMP_STEP_MS,
            min_reaction_ms: DEFAULT_MIN_REACTION_MS,
            bonus_interval_ms: DEFAULT_BONUS_INTERVAL_MS,
            bonus_points: DEFAULT_BONUS_POINTS,
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            countdown_tick_ms: DEFAULT_COUNTDOWN_TICK_MS,
            start_slot: DEFAULT_START_SLOT,
            character: DEFAULT_CHARACTER,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn new(mode: Mode, difficulty: Difficulty) -> Self {
        Self {
            mode,
            difficulty,
            ..Self::default()
        }
    }

    /// Window for the first wave: difficulty base plus buffer, never below the floor.
    pub fn initial_reaction_ms(&self) -> u64 {
        (self.difficulty.base_reaction_ms() + self.reaction_buffer_ms).max(self.min_reaction_ms)
    }

    /// Window after one more correct answer has been counted.
    pub fn ramped(&self, window_ms: u64, correct: u32) -> u64 {
        if correct > 0 && correct % self.ramp_every == 0 {
            window_ms
                .saturating_sub(self.ramp_step_ms)
                .max(self.min_reaction_ms)
                .min(window_ms)
        } else {
            window_ms
        }
    }

    /// Fail fast on parameters that would break wave generation mid-game.
    pub fn validate(&self) -> Result<WaveGenerator, ConfigError> {
        if self.min_reaction_ms == 0 {
            return Err(ConfigError::ZeroReactionWindow);
        }
        if self.ramp_every == 0 {
            return Err(ConfigError::ZeroRampInterval);
        }
        if self.start_slot >= SLOT_COUNT {
            return Err(ConfigError::StartSlotOutOfRange {
                slot: self.start_slot,
                slots: SLOT_COUNT,
            });
        }
        WaveGenerator::new(self.mode)
    }
}
