// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod bonus;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod keys;
pub mod leaderboard;
pub mod result;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod track;
pub mod wave;
