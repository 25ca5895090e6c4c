use serde::{Deserialize, Serialize};

use crate::keys::Mode;
use crate::session::Difficulty;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Reason {
    #[strum(serialize = "wrong key")]
    #[serde(rename = "wrong key")]
    WrongKey,
    #[strum(serialize = "too slow")]
    #[serde(rename = "too slow")]
    TooSlow,
    #[strum(serialize = "collision")]
    #[serde(rename = "collision")]
    Collision,
}

/// `floor(seconds * letters) + bonus`, evaluated in integer milliseconds.
pub fn score(elapsed_ms: u64, correct: u32, bonus: u64) -> u64 {
    elapsed_ms * correct as u64 / 1000 + bonus
}

/// Terminal snapshot of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub elapsed_secs: f64,
    pub letters_typed: u32,
    pub bonus_score: u64,
    pub score: u64,
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub reason: Reason,
}

impl SessionResult {
    pub fn new(
        elapsed_ms: u64,
        letters_typed: u32,
        bonus_score: u64,
        mode: Mode,
        difficulty: Difficulty,
        reason: Reason,
    ) -> Self {
        let elapsed_secs = elapsed_ms as f64 / 1000.0;
        Self {
            elapsed_secs,
            letters_typed,
            bonus_score,
            score: score(elapsed_ms, letters_typed, bonus_score),
            mode,
            difficulty,
            reason,
        }
    }
}
