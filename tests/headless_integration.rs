use std::time::Duration;

use crossterm::event::KeyCode;

use keyrunner::game::{Game, KeyResponse, Phase};
use keyrunner::input::RawKey;
use keyrunner::keys::Mode;
use keyrunner::runtime::{AppEvent, ManualClock, Runner, ScriptedSource, Stamped};
use keyrunner::session::{Difficulty, SessionConfig};

const FRAME: Duration = Duration::from_millis(50);

fn session() -> SessionConfig {
    SessionConfig {
        seed: Some(11),
        countdown_ticks: 0,
        bonus_interval_ms: 0,
        ..SessionConfig::new(Mode::Home, Difficulty::Easy)
    }
}

fn runner(script: ScriptedSource, clock: ManualClock) -> Runner<ScriptedSource, ManualClock> {
    Runner::new(script, clock, FRAME)
}

// Feed runner output into the game the way the binary does, until the
// script runs dry. Returns every key response.
fn drive(game: &mut Game, runner: &Runner<ScriptedSource, ManualClock>) -> Vec<KeyResponse> {
    let mut responses = Vec::new();
    loop {
        let Stamped { at_ms, event } = runner.step();
        match event {
            AppEvent::Frame => game.advance(at_ms),
            AppEvent::Resize => {}
            AppEvent::Key(k) => responses.push(game.press(&RawKey::from(&k), at_ms)),
            AppEvent::InputClosed => return responses,
        }
    }
}

#[test]
fn headless_correct_key_flow() {
    let mut game = Game::new(session()).unwrap();
    game.start(0);
    let target = game.wave().unwrap().target;

    let clock = ManualClock::new();
    let script = ScriptedSource::new(clock.clone()).letter(target).idle(9);
    let responses = drive(&mut game, &runner(script, clock));

    assert_eq!(responses, vec![KeyResponse::Correct]);
    assert_eq!(game.run().correct_count, 1);
    assert_eq!(game.phase(), Phase::Settling);
    assert!(!game.is_over());
}

#[test]
fn headless_session_times_out_on_frames() {
    let mut game = Game::new(session()).unwrap();
    game.start(0);

    let clock = ManualClock::new();
    let script = ScriptedSource::new(clock.clone()).idle(200);
    drive(&mut game, &runner(script, clock));

    assert!(game.is_over(), "an idle player should lose within one window");
    assert!(game.result().unwrap().elapsed_secs <= 3.55);
}

#[test]
fn headless_escape_pauses_and_freezes_time() {
    let mut game = Game::new(session()).unwrap();
    game.start(0);

    let clock = ManualClock::new();
    let script = ScriptedSource::new(clock.clone())
        .idle(1)
        .key(KeyCode::Esc)
        .idle(2_000);
    let responses = drive(&mut game, &runner(script, clock));

    assert_eq!(responses, vec![KeyResponse::PauseToggled { paused: true }]);
    assert!(!game.is_over());
    assert!(game.is_paused());
    assert_eq!(game.run().elapsed_ms, 100);
    assert_eq!(game.play_ms(), 100);
}
