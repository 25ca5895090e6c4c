use chrono::{DateTime, Local};
use log::warn;
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::result::SessionResult;

/// Finished run as submitted for the high-score table
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    pub letters: u32,
    pub time: f64,
    pub mode: String,
    pub difficulty: String,
}

impl LeaderboardEntry {
    pub fn from_result(name: &str, result: &SessionResult) -> Self {
        Self {
            name: name.to_string(),
            score: result.score,
            letters: result.letters_typed,
            time: result.elapsed_secs,
            mode: result.mode.to_string(),
            difficulty: result.difficulty.to_string(),
        }
    }
}

/// One line of the high-score table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub name: String,
    pub score: u64,
}

pub trait Leaderboard {
    fn submit(&mut self, entry: &LeaderboardEntry) -> Result<()>;
    /// Best `n` scores, highest first; ties keep submission order.
    fn top(&self, n: usize) -> Result<Vec<ScoreRow>>;
    /// Most recent submission time, if any run has been recorded
    fn last_submitted(&self) -> Result<Option<DateTime<Local>>>;
}

/// SQLite-backed high-score table
#[derive(Debug)]
pub struct SqliteLeaderboard {
    conn: Connection,
}

impl SqliteLeaderboard {
    /// Open the table under the state directory, creating it if needed.
    pub fn new() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("keyrunner_scores.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                score INTEGER NOT NULL,
                letters INTEGER NOT NULL,
                time REAL NOT NULL,
                mode TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                submitted_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_score ON scores(score DESC)",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl Leaderboard for SqliteLeaderboard {
    fn submit(&mut self, entry: &LeaderboardEntry) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO scores (name, score, letters, time, mode, difficulty, submitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                entry.name,
                entry.score as i64,
                entry.letters,
                entry.time,
                entry.mode,
                entry.difficulty,
                Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn top(&self, n: usize) -> Result<Vec<ScoreRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, score FROM scores ORDER BY score DESC, id ASC LIMIT ?1")?;
        let rows = stmt.query_map([n as i64], |row| {
            Ok(ScoreRow {
                name: row.get(0)?,
                score: row.get::<_, i64>(1)?.max(0) as u64,
            })
        })?;
        rows.collect()
    }

    fn last_submitted(&self) -> Result<Option<DateTime<Local>>> {
        let raw: Option<String> =
            self.conn
                .query_row("SELECT MAX(submitted_at) FROM scores", [], |row| row.get(0))?;
        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Local)))
    }
}

/// Submit a finished run, logging rather than failing when the store is down.
pub fn record<L: Leaderboard + ?Sized>(board: &mut L, name: &str, result: &SessionResult) -> bool {
    match board.submit(&LeaderboardEntry::from_result(name, result)) {
        Ok(()) => true,
        Err(e) => {
            warn!("failed to record score for {name}: {e}");
            false
        }
    }
}
