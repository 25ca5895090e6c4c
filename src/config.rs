use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::keys::Mode;
use crate::session::{
    Difficulty, SessionConfig, DEFAULT_BONUS_INTERVAL_MS, DEFAULT_BONUS_POINTS,
    DEFAULT_COUNTDOWN_TICKS, DEFAULT_COUNTDOWN_TICK_MS, DEFAULT_MIN_REACTION_MS,
    DEFAULT_CHARACTER, DEFAULT_RAMP_EVERY, DEFAULT_RAMP_STEP_MS, DEFAULT_REACTION_BUFFER_MS,
    DEFAULT_START_SLOT,
};

pub const DEFAULT_PLAYER_NAME: &str = "player";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "lenient_mode")]
    pub mode: Mode,
    #[serde(deserialize_with = "lenient_difficulty")]
    pub difficulty: Difficulty,
    pub player_name: String,
    pub reaction_buffer_ms: u64,
    pub ramp_every: u32,
    pub ramp_step_ms: u64,
    pub min_reaction_ms: u64,
    pub bonus_interval_ms: u64,
    pub bonus_points: u64,
    pub countdown_ticks: u8,
    pub countdown_tick_ms: u64,
    pub start_slot: usize,
    pub character: char,
}

// Stored names outside the known set resolve through `from_name` instead of
// failing the whole file.
fn stored_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

fn lenient_mode<'de, D: Deserializer<'de>>(d: D) -> Result<Mode, D::Error> {
    stored_name(d).map(|name| Mode::from_name(&name))
}

fn lenient_difficulty<'de, D: Deserializer<'de>>(d: D) -> Result<Difficulty, D::Error> {
    stored_name(d).map(|name| Difficulty::from_name(&name))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            difficulty: Difficulty::default(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
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
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            mode: cfg.mode,
            difficulty: cfg.difficulty,
            reaction_buffer_ms: cfg.reaction_buffer_ms,
            ramp_every: cfg.ramp_every,
            ramp_step_ms: cfg.ramp_step_ms,
            min_reaction_ms: cfg.min_reaction_ms,
            bonus_interval_ms: cfg.bonus_interval_ms,
            bonus_points: cfg.bonus_points,
            countdown_ticks: cfg.countdown_ticks,
            countdown_tick_ms: cfg.countdown_tick_ms,
            start_slot: cfg.start_slot,
            character: cfg.character,
            seed: None,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "keyrunner") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("keyrunner_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
