use thiserror::Error;

use crate::keys::Mode;

/// Session parameters that cannot produce a playable game
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("key pool for mode `{mode}` has {len} distinct characters, need at least {slots}")]
    PoolTooSmall { mode: Mode, len: usize, slots: usize },
    #[error("reaction window must be greater than zero")]
    ZeroReactionWindow,
    #[error("ramp interval must be at least one correct answer")]
    ZeroRampInterval,
    #[error("start lane {slot} does not exist, lanes are 0..{slots}")]
    StartSlotOutOfRange { slot: usize, slots: usize },
}
