pub mod ui;

use chrono::{DateTime, Local};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keyrunner::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    error::ConfigError,
    game::{Game, GameEvent, KeyResponse},
    input::RawKey,
    keys::Mode,
    leaderboard::{self, Leaderboard, ScoreRow, SqliteLeaderboard},
    result::SessionResult,
    runtime::{AppEvent, CrosstermEventSource, EventSource, Runner, Stamped, TimeSource, WallClock},
    session::{Difficulty, SessionConfig},
};
use log::warn;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    time::Duration,
};

const TICK_RATE_MS: u64 = 30;
const LEADERBOARD_SIZE: usize = 10;

/// reflex typing runner: type the letter of the safe lane before the obstacles land
#[derive(Parser, Debug, Clone, Default)]
#[clap(version, about)]
pub struct Cli {
    /// keyboard rows to draw letters from
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// base reaction time
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// name recorded on the leaderboard
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// seed for reproducible waves
    #[clap(long)]
    seed: Option<u64>,

    /// extra milliseconds added to the reaction window
    #[clap(long)]
    buffer_ms: Option<u64>,

    /// disable bonus letters
    #[clap(long)]
    no_bonus: bool,

    /// lane to start in, 0 to 2
    #[clap(long)]
    lane: Option<usize>,
}

impl Cli {
    /// Persisted preferences chosen on the command line
    fn apply(&self, cfg: &mut Config) {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if let Some(name) = &self.name {
            cfg.player_name = name.clone();
        }
    }

    /// Per-run overrides that are never saved
    fn session_config(&self, cfg: &Config) -> SessionConfig {
        let mut session = SessionConfig::from(cfg);
        session.seed = self.seed;
        if let Some(buffer_ms) = self.buffer_ms {
            session.reaction_buffer_ms = buffer_ms;
        }
        if self.no_bonus {
            session.bonus_interval_ms = 0;
        }
        if let Some(lane) = self.lane {
            session.start_slot = lane;
        }
        session
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Playing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuField {
    Mode,
    Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub cli: Cli,
    pub config: Config,
    pub state: AppState,
    pub menu_field: MenuField,
    pub game: Option<Game>,
    pub last_result: Option<SessionResult>,
    pub top_scores: Vec<ScoreRow>,
    pub last_played: Option<DateTime<Local>>,
    pub notice: Option<String>,
    leaderboard: Option<Box<dyn Leaderboard>>,
}

impl App {
    pub fn new(cli: Cli, config: Config, leaderboard: Option<Box<dyn Leaderboard>>) -> Self {
        let mut app = Self {
            cli,
            config,
            state: AppState::Menu,
            menu_field: MenuField::Mode,
            game: None,
            last_result: None,
            top_scores: Vec::new(),
            last_played: None,
            notice: None,
            leaderboard,
        };
        app.refresh_scores();
        app
    }

    fn refresh_scores(&mut self) {
        let Some(board) = &self.leaderboard else {
            return;
        };
        match board.top(LEADERBOARD_SIZE) {
            Ok(rows) => self.top_scores = rows,
            Err(e) => warn!("failed to load leaderboard: {e}"),
        }
        match board.last_submitted() {
            Ok(at) => self.last_played = at,
            Err(e) => warn!("failed to read last run time: {e}"),
        }
    }

    pub fn start_game(&mut self, now: u64) -> Result<(), ConfigError> {
        let mut game = Game::new(self.cli.session_config(&self.config))?;
        game.start(now);
        self.game = Some(game);
        self.last_result = None;
        self.notice = None;
        self.state = AppState::Playing;
        Ok(())
    }

    fn try_start(&mut self, now: u64) {
        if let Err(e) = self.start_game(now) {
            warn!("cannot start session: {e}");
            self.notice = Some(e.to_string());
            self.state = AppState::Menu;
        }
    }

    fn to_menu(&mut self) {
        self.game = None;
        self.state = AppState::Menu;
        self.refresh_scores();
    }

    fn cycle(&mut self, forward: bool) {
        fn step<T: Copy + PartialEq>(all: &[T], cur: T, forward: bool) -> T {
            let idx = all.iter().position(|v| *v == cur).unwrap_or(0);
            let next = if forward {
                (idx + 1) % all.len()
            } else {
                (idx + all.len() - 1) % all.len()
            };
            all[next]
        }
        match self.menu_field {
            MenuField::Mode => self.config.mode = step(&Mode::ALL, self.config.mode, forward),
            MenuField::Difficulty => {
                self.config.difficulty = step(&Difficulty::ALL, self.config.difficulty, forward)
            }
        }
        // an explicit flag would otherwise shadow the menu choice
        self.cli.mode = None;
        self.cli.difficulty = None;
    }

    pub fn on_tick(&mut self, now: u64) {
        if let Some(game) = self.game.as_mut() {
            game.advance(now);
        }
        self.collect_events();
    }

    fn on_key(&mut self, key: KeyEvent, now: u64) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Esc => return Flow::Quit,
                KeyCode::Up | KeyCode::Down => {
                    self.menu_field = match self.menu_field {
                        MenuField::Mode => MenuField::Difficulty,
                        MenuField::Difficulty => MenuField::Mode,
                    }
                }
                KeyCode::Left => self.cycle(false),
                KeyCode::Right => self.cycle(true),
                KeyCode::Enter => self.try_start(now),
                _ => {}
            },
            AppState::Playing => {
                let Some(game) = self.game.as_mut() else {
                    self.to_menu();
                    return Flow::Continue;
                };
                if game.is_paused() && key.code == KeyCode::Char('m') {
                    self.to_menu();
                    return Flow::Continue;
                }
                let paused = game.is_paused();
                match game.press(&RawKey::from(&key), now) {
                    KeyResponse::RestartRequested if paused => self.try_start(now),
                    _ => self.collect_events(),
                }
            }
            AppState::Results => match key.code {
                KeyCode::Esc => return Flow::Quit,
                KeyCode::Enter => self.try_start(now),
                KeyCode::Char('m') => self.to_menu(),
                _ => {}
            },
        }
        Flow::Continue
    }

    fn collect_events(&mut self) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let finished = game.drain_events().into_iter().find_map(|e| match e {
            GameEvent::GameOver(result) => Some(result),
            _ => None,
        });
        if let Some(result) = finished {
            self.finish(result);
        }
    }

    fn finish(&mut self, result: SessionResult) {
        if let Some(board) = self.leaderboard.as_deref_mut() {
            leaderboard::record(board, &self.config.player_name, &result);
        }
        self.refresh_scores();
        self.last_result = Some(result);
        self.state = AppState::Results;
    }
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    if let Err(e) = cli.session_config(&config).validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
    }

    let leaderboard: Option<Box<dyn Leaderboard>> = match SqliteLeaderboard::new() {
        Ok(db) => Some(Box::new(db)),
        Err(e) => {
            warn!("leaderboard unavailable: {e}");
            None
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli, config, leaderboard);
    let runner = Runner::new(
        CrosstermEventSource::new(),
        WallClock::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let outcome = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&app.config) {
        warn!("failed to save config: {e}");
    }

    outcome
}

fn run_app<B: Backend, E: EventSource, C: TimeSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, C>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        let Stamped { at_ms, event } = runner.step();
        let flow = match event {
            AppEvent::Frame => {
                app.on_tick(at_ms);
                Flow::Continue
            }
            AppEvent::Resize => Flow::Continue,
            AppEvent::Key(key) => app.on_key(key, at_ms),
            AppEvent::InputClosed => Flow::Quit,
        };
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrunner::game::Phase;
    use keyrunner::runtime::{ManualClock, ScriptedSource};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(leaderboard: bool) -> App {
        let cli = Cli {
            seed: Some(7),
            no_bonus: true,
            ..Cli::default()
        };
        let config = Config {
            mode: Mode::Home,
            countdown_ticks: 0,
            ..Config::default()
        };
        let board: Option<Box<dyn Leaderboard>> = if leaderboard {
            Some(Box::new(SqliteLeaderboard::in_memory().unwrap()))
        } else {
            None
        };
        App::new(cli, config, board)
    }

    fn wrong_letter(app: &App) -> char {
        let game = app.game.as_ref().unwrap();
        game.wave().unwrap().distractors().next().unwrap().1
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["keyrunner"]);
        assert_eq!(cli.mode, None);
        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.name, None);
        assert_eq!(cli.seed, None);
        assert!(!cli.no_bonus);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "keyrunner",
            "--mode",
            "top",
            "-d",
            "hard",
            "--name",
            "ada",
            "--seed",
            "9",
            "--buffer-ms",
            "250",
            "--no-bonus",
            "--lane",
            "0",
        ]);
        assert_eq!(cli.mode, Some(Mode::Top));
        assert_eq!(cli.difficulty, Some(Difficulty::Hard));
        assert_eq!(cli.name.as_deref(), Some("ada"));
        assert_eq!(cli.seed, Some(9));
        assert_eq!(cli.buffer_ms, Some(250));
        assert!(cli.no_bonus);
        assert_eq!(cli.lane, Some(0));
        assert_eq!(cli.session_config(&Config::default()).start_slot, 0);
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["keyrunner", "--mode", "numbers"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["keyrunner", "-m", "bottom", "-n", "grace", "--buffer-ms", "0"]);
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.mode, Mode::Bottom);
        assert_eq!(cfg.player_name, "grace");
        assert_eq!(cfg.reaction_buffer_ms, 2_000);

        let session = cli.session_config(&cfg);
        assert_eq!(session.reaction_buffer_ms, 0);
        assert_eq!(session.bonus_interval_ms, cfg.bonus_interval_ms);
    }

    #[test]
    fn test_menu_navigation() {
        let mut app = test_app(false);
        assert_eq!(app.state, AppState::Menu);

        app.on_key(key(KeyCode::Right), 0);
        assert_eq!(app.config.mode, Mode::Top);
        app.on_key(key(KeyCode::Left), 0);
        app.on_key(key(KeyCode::Left), 0);
        assert_eq!(app.config.mode, Mode::Mixed);

        app.on_key(key(KeyCode::Down), 0);
        assert_eq!(app.menu_field, MenuField::Difficulty);
        app.on_key(key(KeyCode::Right), 0);
        assert_eq!(app.config.difficulty, Difficulty::Medium);

        assert_eq!(app.on_key(key(KeyCode::Esc), 0), Flow::Quit);
    }

    #[test]
    fn test_enter_starts_and_wrong_key_shows_results() {
        let mut app = test_app(true);
        app.on_key(key(KeyCode::Enter), 0);
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(
            app.game.as_ref().map(|g| g.phase()),
            Some(Phase::WaveActive)
        );

        let wrong = wrong_letter(&app);
        app.on_key(key(KeyCode::Char(wrong)), 1_000);
        assert_eq!(app.state, AppState::Results);
        assert!(app.last_result.is_some());
        assert_eq!(app.top_scores.len(), 1);
        assert_eq!(app.top_scores[0].name, "player");
        assert!(app.last_played.is_some());

        app.on_key(key(KeyCode::Char('m')), 1_500);
        assert_eq!(app.state, AppState::Menu);
    }

    #[test]
    fn test_results_enter_restarts() {
        let mut app = test_app(false);
        app.on_key(key(KeyCode::Enter), 0);
        let wrong = wrong_letter(&app);
        app.on_key(key(KeyCode::Char(wrong)), 500);
        app.on_key(key(KeyCode::Enter), 600);
        assert_eq!(app.state, AppState::Playing);
        assert!(app.last_result.is_none());
        assert_eq!(app.game.as_ref().map(|g| g.run().correct_count), Some(0));
    }

    #[test]
    fn test_enter_restarts_only_while_paused() {
        let mut app = test_app(false);
        app.on_key(key(KeyCode::Enter), 0);
        let target = app.game.as_ref().unwrap().wave().unwrap().target;
        app.on_key(key(KeyCode::Char(target)), 100);
        assert_eq!(app.game.as_ref().map(|g| g.run().correct_count), Some(1));

        app.on_key(key(KeyCode::Enter), 200);
        assert_eq!(app.game.as_ref().map(|g| g.run().correct_count), Some(1));

        app.on_key(key(KeyCode::Esc), 300);
        assert!(app.game.as_ref().unwrap().is_paused());
        app.on_key(key(KeyCode::Enter), 400);
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.game.as_ref().map(|g| g.run().correct_count), Some(0));
    }

    #[test]
    fn test_pause_then_m_returns_to_menu() {
        let mut app = test_app(false);
        app.on_key(key(KeyCode::Enter), 0);
        app.on_key(key(KeyCode::Esc), 100);
        app.on_key(key(KeyCode::Char('m')), 200);
        assert_eq!(app.state, AppState::Menu);
        assert!(app.game.is_none());
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let mut app = test_app(false);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.on_key(ctrl_c, 0), Flow::Quit);
        app.on_key(key(KeyCode::Enter), 0);
        assert_eq!(app.on_key(ctrl_c, 10), Flow::Quit);
    }

    #[test]
    fn test_tick_times_out_session() {
        let mut app = test_app(false);
        app.on_key(key(KeyCode::Enter), 0);
        app.on_tick(60_000);
        assert_eq!(app.state, AppState::Results);
    }

    #[test]
    fn test_invalid_config_stays_in_menu() {
        let mut app = test_app(false);
        app.config.ramp_every = 0;
        app.on_key(key(KeyCode::Enter), 0);
        assert_eq!(app.state, AppState::Menu);
        assert!(app.notice.is_some());
    }

    fn scripted_runner(
        script: impl FnOnce(ScriptedSource) -> ScriptedSource,
    ) -> Runner<ScriptedSource, ManualClock> {
        let clock = ManualClock::new();
        let source = script(ScriptedSource::new(clock.clone()));
        Runner::new(source, clock, Duration::from_millis(TICK_RATE_MS))
    }

    #[test]
    fn test_run_app_quits_on_escape_from_menu() {
        let runner = scripted_runner(|s| s.event(AppEvent::Resize).key(KeyCode::Esc).idle(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = test_app(false);

        run_app(&mut terminal, &mut app, &runner).unwrap();
        assert_eq!(app.state, AppState::Menu);
        assert!(app.game.is_none());
    }

    #[test]
    fn test_run_app_idle_player_reaches_results() {
        let runner = scripted_runner(|s| s.key(KeyCode::Enter).idle(400));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = test_app(true);

        run_app(&mut terminal, &mut app, &runner).unwrap();
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.top_scores.len(), 1);
    }

    #[test]
    fn test_tick_rate_constant() {
        assert!(TICK_RATE_MS <= 50);
    }
}
