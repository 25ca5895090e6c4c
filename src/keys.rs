use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const HOME_ROW: [char; 10] = ['a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l', ';'];
pub const TOP_ROW: [char; 10] = ['q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o', 'p'];
pub const BOTTOM_ROW: [char; 10] = ['z', 'x', 'c', 'v', 'b', 'n', 'm', ',', '.', '/'];

static MIXED: OnceLock<Vec<char>> = OnceLock::new();

/// Practice mode selecting which keyboard row the targets are drawn from
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
pub enum Mode {
    Home,
    Top,
    Bottom,
    #[default]
    Mixed,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Home, Mode::Top, Mode::Bottom, Mode::Mixed];

    /// Resolve a stored or user supplied mode name. Anything unknown fails
    /// closed to `Mixed`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "home" => Mode::Home,
            "top" => Mode::Top,
            "bottom" => Mode::Bottom,
            _ => Mode::Mixed,
        }
    }

    pub fn pool(self) -> &'static [char] {
        pool_for(self)
    }
}

/// Ordered set of target characters for a mode.
pub fn pool_for(mode: Mode) -> &'static [char] {
    match mode {
        Mode::Home => &HOME_ROW,
        Mode::Top => &TOP_ROW,
        Mode::Bottom => &BOTTOM_ROW,
        Mode::Mixed => mixed_pool(),
    }
}

/// Deduplicated union of the home, top and bottom rows, in that order.
pub fn mixed_pool() -> &'static [char] {
    MIXED.get_or_init(|| {
        HOME_ROW
            .iter()
            .chain(TOP_ROW.iter())
            .chain(BOTTOM_ROW.iter())
            .copied()
            .unique()
            .collect()
    })
}
