use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::bonus::{BonusItem, BonusSpawner};
use crate::clock::ReactionClock;
use crate::error::ConfigError;
use crate::input::{self, Control, RawKey};
use crate::result::{self, Reason, SessionResult};
use crate::session::SessionConfig;
use crate::timer::{Scheduler, TimerId};
use crate::track::{full_travel_ms, Obstacle};
use crate::wave::{Slot, Wave, WaveGenerator, SLOT_COUNT};

/// Round state. Pausing is tracked separately in `RunState::is_paused` and
/// overlays `Countdown`, `WaveActive` and `Settling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Countdown { remaining: u8 },
    WaveActive,
    Settling,
    GameOver,
}

/// Session-scoped counters, mutated only by `Game`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub correct_count: u32,
    pub bonus_score: u64,
    pub elapsed_ms: u64,
    pub reaction_window_ms: u64,
    pub player_slot: Slot,
    pub is_paused: bool,
    pub is_over: bool,
}

/// Per-frame numbers for the heads-up display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub elapsed_secs: f64,
    pub correct: u32,
    pub score: u64,
    pub reaction_window_ms: u64,
    /// Time left to answer the current wave, while its clock runs
    pub time_left_ms: Option<u64>,
}

/// Notifications for the presentation layer, drained by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    CountdownTick {
        remaining: u8,
    },
    WaveStarted {
        generation: u64,
        safe_slot: Slot,
        target: char,
        letters: [char; SLOT_COUNT],
    },
    Correct {
        generation: u64,
        correct_count: u32,
    },
    Ramped {
        reaction_window_ms: u64,
    },
    BonusSpawned {
        batch: u64,
    },
    BonusCollected {
        ch: char,
        slot: Slot,
        points: u64,
    },
    BonusExpired {
        batch: u64,
        missed: usize,
    },
    Paused,
    Resumed,
    GameOver(SessionResult),
}

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    Ignored,
    Correct,
    Bonus { ch: char, points: u64 },
    WrongKey,
    PauseToggled { paused: bool },
    RestartRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    CountdownTick,
    ReactionExpired { generation: u64 },
    ObstacleArrived { obstacle: u32, generation: u64 },
    ObstacleFinished { obstacle: u32, generation: u64 },
    BonusSpawn,
    BonusExpired { batch: u64 },
}

/// The round state machine.
///
/// Driven by wall-clock milliseconds from the caller: `advance` on every
/// frame or tick, `press` for key-down events. Wall time is mapped to play
/// time, which stands still while paused, and every deferred callback runs
/// on play time. Within one instant a key press is resolved before any
/// timer due at that same instant.
#[derive(Debug)]
pub struct Game<R = StdRng> {
    config: SessionConfig,
    generator: WaveGenerator,
    rng: R,
    phase: Phase,
    run: RunState,
    wave: Option<Wave>,
    generation: u64,
    clock: ReactionClock,
    timers: Scheduler<Deferred>,
    obstacles: Vec<Obstacle>,
    next_obstacle_id: u32,
    bonus: BonusSpawner,
    play_ms: u64,
    last_wall_ms: u64,
    started_at: Option<u64>,
    result: Option<SessionResult>,
    events: Vec<GameEvent>,
}

impl Game<StdRng> {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Game<R> {
    pub fn with_rng(config: SessionConfig, rng: R) -> Result<Self, ConfigError> {
        let generator = config.validate()?;
        let bonus = BonusSpawner::new(config.bonus_interval_ms, config.bonus_points);

        Ok(Self {
            run: RunState {
                correct_count: 0,
                bonus_score: 0,
                elapsed_ms: 0,
                reaction_window_ms: config.initial_reaction_ms(),
                player_slot: config.start_slot,
                is_paused: false,
                is_over: false,
            },
            config,
            generator,
            rng,
            phase: Phase::Idle,
            wave: None,
            generation: 0,
            clock: ReactionClock::new(),
            timers: Scheduler::new(),
            obstacles: Vec::new(),
            next_obstacle_id: 1,
            bonus,
            play_ms: 0,
            last_wall_ms: 0,
            started_at: None,
            result: None,
            events: Vec::new(),
        })
    }

    /// Leave `Idle` and begin the pre-round countdown.
    pub fn start(&mut self, now: u64) {
        if self.phase != Phase::Idle {
            return;
        }
        self.last_wall_ms = now;
        info!(
            "session start: mode={} difficulty={} window={}ms",
            self.config.mode, self.config.difficulty, self.run.reaction_window_ms
        );

        let ticks = self.config.countdown_ticks;
        if ticks == 0 {
            self.next_wave();
            return;
        }
        self.phase = Phase::Countdown { remaining: ticks };
        self.events.push(GameEvent::CountdownTick { remaining: ticks });
        self.timers.schedule(
            self.play_ms,
            self.config.countdown_tick_ms,
            Deferred::CountdownTick,
        );
    }

    /// Run every callback due up to and including `now`.
    pub fn advance(&mut self, now: u64) {
        let target = self.target_play_ms(now);
        self.run_timers(target, true);
    }

    /// Feed a raw key-down event.
    pub fn press(&mut self, raw: &RawKey, now: u64) -> KeyResponse {
        if let Some(control) = input::control(raw) {
            return match control {
                Control::TogglePause => {
                    if self.toggle_pause(now) {
                        KeyResponse::PauseToggled {
                            paused: self.run.is_paused,
                        }
                    } else {
                        KeyResponse::Ignored
                    }
                }
                Control::Restart => KeyResponse::RestartRequested,
            };
        }

        match input::normalize(raw) {
            Some(c) => self.key(c, now),
            None => KeyResponse::Ignored,
        }
    }

    /// Resolve an already normalized character.
    pub fn key(&mut self, c: char, now: u64) -> KeyResponse {
        self.catch_up(now);
        if self.run.is_over || self.run.is_paused || !input::is_allowed(c) {
            return KeyResponse::Ignored;
        }

        match self.phase {
            Phase::WaveActive => {
                let Some(target) = self.wave.as_ref().map(|w| w.target) else {
                    return KeyResponse::Ignored;
                };
                if c == target {
                    self.resolve_correct();
                    return KeyResponse::Correct;
                }
                if let Some(response) = self.collect_bonus(c) {
                    return response;
                }
                self.game_over(Reason::WrongKey);
                KeyResponse::WrongKey
            }
            Phase::Settling => self.collect_bonus(c).unwrap_or(KeyResponse::Ignored),
            _ => KeyResponse::Ignored,
        }
    }

    /// Returns false when there is nothing to pause.
    pub fn toggle_pause(&mut self, now: u64) -> bool {
        self.catch_up(now);
        if self.run.is_over || self.phase == Phase::Idle {
            return false;
        }

        if self.run.is_paused {
            self.run.is_paused = false;
            // TODO: resume with the remaining window instead of a fresh one
            if self.phase == Phase::WaveActive {
                self.start_clock();
            }
            debug!("resumed at {}ms", self.play_ms);
            self.events.push(GameEvent::Resumed);
        } else {
            self.run.is_paused = true;
            self.clock.cancel(&mut self.timers);
            debug!("paused at {}ms", self.play_ms);
            self.events.push(GameEvent::Paused);
        }
        true
    }

    /// An obstacle reached the player line.
    pub fn obstacle_arrived(&mut self, obstacle: u32) {
        if self.run.is_over {
            return;
        }
        let player = self.run.player_slot;
        let generation = self.generation;
        let Some(ob) = self.obstacles.iter_mut().find(|o| o.id == obstacle) else {
            debug!("arrival for unknown obstacle {obstacle}");
            return;
        };
        if ob.passed {
            return;
        }
        ob.passed = true;

        let hit = ob.generation == generation && ob.slot == player;
        if hit && matches!(self.phase, Phase::WaveActive | Phase::Settling) {
            self.game_over(Reason::Collision);
        }
    }

    /// An obstacle left the lane; the next wave starts once the resolved
    /// wave has none left.
    pub fn obstacle_finished(&mut self, obstacle: u32) {
        if self.run.is_over {
            return;
        }
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.id != obstacle);
        if self.obstacles.len() != before {
            self.settle_if_clear();
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.run.is_paused
    }

    pub fn is_over(&self) -> bool {
        self.run.is_over
    }

    pub fn wave(&self) -> Option<&Wave> {
        self.wave.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Key the on-screen keyboard should light up
    pub fn highlight(&self) -> Option<char> {
        match self.phase {
            Phase::WaveActive => self.wave.as_ref().map(|w| w.target),
            _ => None,
        }
    }

    pub fn countdown_remaining(&self) -> Option<u8> {
        match self.phase {
            Phase::Countdown { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn bonus_items(&self) -> impl Iterator<Item = &BonusItem> {
        self.bonus.active()
    }

    /// Current play time: wall time minus paused spans
    pub fn play_ms(&self) -> u64 {
        self.play_ms
    }

    pub fn clock_deadline(&self) -> Option<u64> {
        self.clock.deadline()
    }

    pub fn clock_remaining(&self) -> Option<u64> {
        self.clock.remaining(self.play_ms)
    }

    /// Reaction timers still waiting in the queue
    pub fn pending_reaction_timers(&self) -> usize {
        self.timers
            .iter()
            .filter(|(_, e)| matches!(e, Deferred::ReactionExpired { .. }))
            .count()
    }

    pub fn score(&self) -> u64 {
        match &self.result {
            Some(r) => r.score,
            None => result::score(
                self.run.elapsed_ms,
                self.run.correct_count,
                self.run.bonus_score,
            ),
        }
    }

    pub fn hud(&self) -> Hud {
        Hud {
            elapsed_secs: self.run.elapsed_ms as f64 / 1000.0,
            correct: self.run.correct_count,
            score: self.score(),
            reaction_window_ms: self.run.reaction_window_ms,
            time_left_ms: self.clock_remaining(),
        }
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    fn target_play_ms(&mut self, now: u64) -> u64 {
        let now = now.max(self.last_wall_ms);
        let delta = now - self.last_wall_ms;
        self.last_wall_ms = now;
        if self.run.is_paused || self.run.is_over {
            self.play_ms
        } else {
            self.play_ms + delta
        }
    }

    /// Bring play time up to `now` without firing timers due exactly at
    /// `now`, so input at that instant wins the tie.
    fn catch_up(&mut self, now: u64) {
        let target = self.target_play_ms(now);
        self.run_timers(target, false);
    }

    fn run_timers(&mut self, target: u64, inclusive: bool) {
        while !self.run.is_over {
            let Some(due) = self.timers.next_due() else {
                break;
            };
            if due > target || (!inclusive && due == target) {
                break;
            }
            let Some((id, event)) = self.timers.pop_due(due) else {
                break;
            };
            self.play_ms = self.play_ms.max(due);
            self.update_elapsed();
            self.dispatch(id, event);
        }
        if !self.run.is_over {
            self.play_ms = self.play_ms.max(target);
            self.update_elapsed();
        }
    }

    fn update_elapsed(&mut self) {
        if let Some(started) = self.started_at {
            self.run.elapsed_ms = self.play_ms.saturating_sub(started);
        }
    }

    fn dispatch(&mut self, timer: TimerId, event: Deferred) {
        match event {
            Deferred::CountdownTick => self.countdown_tick(),
            Deferred::ReactionExpired { generation } => match self.clock.expire(timer) {
                Some(armed)
                    if armed == generation
                        && generation == self.generation
                        && self.phase == Phase::WaveActive =>
                {
                    self.game_over(Reason::TooSlow)
                }
                _ => debug!("dropping stale reaction timer for wave {generation}"),
            },
            Deferred::ObstacleArrived {
                obstacle,
                generation,
            } => {
                if generation == self.generation {
                    self.obstacle_arrived(obstacle);
                } else {
                    debug!("dropping stale arrival of obstacle {obstacle}");
                }
            }
            Deferred::ObstacleFinished {
                obstacle,
                generation,
            } => {
                if generation == self.generation {
                    self.obstacle_finished(obstacle);
                } else {
                    debug!("dropping stale finish of obstacle {obstacle}");
                }
            }
            Deferred::BonusSpawn => self.bonus_tick(),
            Deferred::BonusExpired { batch } => {
                let missed = self.bonus.expire(batch);
                if missed > 0 {
                    debug!("bonus batch {batch} expired with {missed} uncollected");
                    self.events.push(GameEvent::BonusExpired { batch, missed });
                }
            }
        }
    }

    fn countdown_tick(&mut self) {
        let Phase::Countdown { remaining } = self.phase else {
            return;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.next_wave();
            return;
        }
        self.phase = Phase::Countdown { remaining };
        self.events.push(GameEvent::CountdownTick { remaining });
        self.timers.schedule(
            self.play_ms,
            self.config.countdown_tick_ms,
            Deferred::CountdownTick,
        );
    }

    fn next_wave(&mut self) {
        self.obstacles.clear();
        self.generation += 1;
        let generation = self.generation;
        let window = self.run.reaction_window_ms;
        let now = self.play_ms;
        let wave = self.generator.generate(&mut self.rng, generation, window);

        if self.started_at.is_none() {
            self.started_at = Some(now);
            if self.bonus.is_enabled() {
                self.timers
                    .schedule(now, self.bonus.interval_ms(), Deferred::BonusSpawn);
            }
        }

        // obstacles are queued ahead of the clock: an arrival and the
        // deadline share an instant and the collision is reported first
        for (slot, _) in wave.distractors() {
            let ob = Obstacle::new(self.next_obstacle_id, slot, generation, now, window);
            self.next_obstacle_id += 1;
            self.timers.schedule(
                now,
                ob.arrive_ms - now,
                Deferred::ObstacleArrived {
                    obstacle: ob.id,
                    generation,
                },
            );
            self.timers.schedule(
                now,
                ob.finish_ms - now,
                Deferred::ObstacleFinished {
                    obstacle: ob.id,
                    generation,
                },
            );
            self.obstacles.push(ob);
        }

        debug!(
            "wave {generation}: target '{}' in slot {} letters {:?} window {window}ms",
            wave.target, wave.safe_slot, wave.letters
        );
        self.events.push(GameEvent::WaveStarted {
            generation,
            safe_slot: wave.safe_slot,
            target: wave.target,
            letters: wave.letters,
        });
        self.wave = Some(wave);
        self.phase = Phase::WaveActive;

        if !self.run.is_paused {
            self.start_clock();
        }
    }

    fn start_clock(&mut self) {
        let Some((window, generation)) = self
            .wave
            .as_ref()
            .map(|w| (w.reaction_window_ms, w.generation))
        else {
            return;
        };
        self.clock.start(
            &mut self.timers,
            self.play_ms,
            window,
            generation,
            Deferred::ReactionExpired { generation },
        );
    }

    fn resolve_correct(&mut self) {
        let Some((safe_slot, generation)) = self.wave.as_ref().map(|w| (w.safe_slot, w.generation))
        else {
            return;
        };
        self.clock.cancel(&mut self.timers);
        self.run.correct_count += 1;
        self.run.player_slot = safe_slot;
        self.phase = Phase::Settling;
        self.events.push(GameEvent::Correct {
            generation,
            correct_count: self.run.correct_count,
        });

        let window = self.run.reaction_window_ms;
        let ramped = self.config.ramped(window, self.run.correct_count);
        if ramped < window {
            debug!("ramp: reaction window {window}ms -> {ramped}ms");
            self.run.reaction_window_ms = ramped;
            self.events.push(GameEvent::Ramped {
                reaction_window_ms: ramped,
            });
        }

        self.settle_if_clear();
    }

    fn settle_if_clear(&mut self) {
        if self.phase != Phase::Settling {
            return;
        }
        let generation = self.generation;
        if !self.obstacles.iter().any(|o| o.generation == generation) {
            self.next_wave();
        }
    }

    fn bonus_tick(&mut self) {
        if matches!(self.phase, Phase::WaveActive | Phase::Settling) {
            let travel = full_travel_ms(self.run.reaction_window_ms);
            if let Some(batch) =
                self.bonus
                    .spawn_batch(&mut self.rng, self.generator.pool(), self.play_ms, travel)
            {
                self.timers
                    .schedule(self.play_ms, travel, Deferred::BonusExpired { batch });
                self.events.push(GameEvent::BonusSpawned { batch });
            }
        }
        self.timers
            .schedule(self.play_ms, self.bonus.interval_ms(), Deferred::BonusSpawn);
    }

    fn collect_bonus(&mut self, c: char) -> Option<KeyResponse> {
        let item = self.bonus.consume(c)?;
        let points = self.bonus.points();
        self.run.bonus_score += points;
        debug!("bonus '{c}' collected in slot {} (+{points})", item.slot);
        self.events.push(GameEvent::BonusCollected {
            ch: c,
            slot: item.slot,
            points,
        });
        Some(KeyResponse::Bonus { ch: c, points })
    }

    fn game_over(&mut self, reason: Reason) {
        if self.run.is_over {
            return;
        }
        self.update_elapsed();
        self.clock.cancel(&mut self.timers);
        self.timers.clear();
        self.bonus.clear();
        self.run.is_over = true;
        self.phase = Phase::GameOver;

        let result = SessionResult::new(
            self.run.elapsed_ms,
            self.run.correct_count,
            self.run.bonus_score,
            self.config.mode,
            self.config.difficulty,
            reason,
        );
        info!(
            "game over ({reason}): {:.1}s, {} letters, score {}",
            result.elapsed_secs, result.letters_typed, result.score
        );
        self.events.push(GameEvent::GameOver(result.clone()));
        self.result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Mode;
    use crate::session::{Difficulty, DEFAULT_START_SLOT};
    use assert_matches::assert_matches;

    fn config() -> SessionConfig {
        SessionConfig {
            seed: Some(42),
            bonus_interval_ms: 0,
            ..SessionConfig::new(Mode::Home, Difficulty::Easy)
        }
    }

    fn playing(config: SessionConfig) -> Game {
        let mut game = Game::new(config).unwrap();
        game.start(0);
        game.advance(3_000);
        game
    }

    fn wrong_letter(game: &Game) -> char {
        game.wave().unwrap().distractors().next().unwrap().1
    }

    #[test]
    fn countdown_runs_three_ticks_before_first_wave() {
        let mut game = Game::new(config()).unwrap();
        assert_eq!(game.phase(), Phase::Idle);

        game.start(0);
        assert_eq!(game.countdown_remaining(), Some(3));
        game.advance(999);
        assert_eq!(game.countdown_remaining(), Some(3));
        game.advance(1_000);
        assert_eq!(game.countdown_remaining(), Some(2));
        assert!(game.wave().is_none());
        assert_eq!(game.clock_deadline(), None);

        game.advance(3_000);
        assert_eq!(game.phase(), Phase::WaveActive);
        assert_eq!(game.generation(), 1);
        assert_eq!(game.clock_deadline(), Some(3_000 + 3_500));
        assert_eq!(game.obstacles().len(), SLOT_COUNT - 1);

        let ticks: Vec<GameEvent> = game
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::CountdownTick { .. }))
            .collect();
        assert_eq!(ticks.len(), 3);
    }

    #[test]
    fn input_during_countdown_is_ignored() {
        let mut game = Game::new(config()).unwrap();
        game.start(0);
        for c in crate::keys::HOME_ROW {
            assert_eq!(game.key(c, 500), KeyResponse::Ignored);
        }
        assert!(!game.is_over());
    }

    #[test]
    fn zero_countdown_starts_immediately() {
        let mut game = Game::new(SessionConfig {
            countdown_ticks: 0,
            ..config()
        })
        .unwrap();
        game.start(0);
        assert_eq!(game.phase(), Phase::WaveActive);
    }

    #[test]
    fn correct_key_settles_then_starts_next_wave() {
        let mut game = playing(config());
        let wave = game.wave().cloned().unwrap();

        assert_eq!(game.key(wave.target, 3_200), KeyResponse::Correct);
        assert_eq!(game.phase(), Phase::Settling);
        assert_eq!(game.run().player_slot, wave.safe_slot);
        assert_eq!(game.run().correct_count, 1);
        assert_eq!(game.clock_deadline(), None);
        assert_eq!(game.highlight(), None);

        // the old deadline passes while settling without ending the run
        game.advance(6_600);
        assert_eq!(game.phase(), Phase::Settling);
        assert!(!game.is_over());

        // obstacles finish at spawn + window * 1.12
        game.advance(3_000 + 3_920);
        assert_eq!(game.phase(), Phase::WaveActive);
        assert_eq!(game.generation(), 2);
        assert_eq!(game.clock_deadline(), Some(6_920 + 3_500));
    }

    #[test]
    fn settling_ignores_letters_that_are_not_bonuses() {
        let mut game = playing(config());
        let wave = game.wave().cloned().unwrap();
        game.key(wave.target, 3_100);
        assert_eq!(game.key(wrong_letter(&game), 3_150), KeyResponse::Ignored);
        assert!(!game.is_over());
    }

    #[test]
    fn wrong_key_ends_the_run() {
        let mut game = playing(config());
        let wrong = wrong_letter(&game);
        assert_eq!(game.key(wrong, 4_000), KeyResponse::WrongKey);
        assert!(game.is_over());
        let result = game.result().unwrap();
        assert_eq!(result.reason, Reason::WrongKey);
        assert_eq!(result.elapsed_secs, 1.0);
        assert_eq!(game.clock_deadline(), None);
        assert_eq!(game.pending_reaction_timers(), 0);
    }

    #[test]
    fn allowed_key_outside_mode_pool_is_wrong() {
        let mut game = playing(config());
        assert_eq!(game.key('q', 3_100), KeyResponse::WrongKey);
    }

    #[test]
    fn disallowed_keys_are_ignored() {
        let mut game = playing(config());
        assert_eq!(game.key('1', 3_100), KeyResponse::Ignored);
        assert_eq!(game.press(&RawKey::new("Shift"), 3_100), KeyResponse::Ignored);
        assert_eq!(game.press(&RawKey::repeated("a"), 3_100), KeyResponse::Ignored);
        assert_eq!(game.phase(), Phase::WaveActive);
    }

    fn game_with_safe_slot(pred: impl Fn(Slot) -> bool) -> Game {
        (0..500u64)
            .map(|seed| {
                playing(SessionConfig {
                    seed: Some(seed),
                    ..config()
                })
            })
            .find(|g| pred(g.wave().unwrap().safe_slot))
            .unwrap()
    }

    #[test]
    fn standing_in_a_distractor_lane_is_a_collision() {
        let mut game = game_with_safe_slot(|s| s != DEFAULT_START_SLOT);
        game.advance(3_000 + 3_500);
        assert_eq!(game.result().map(|r| r.reason), Some(Reason::Collision));
    }

    #[test]
    fn standing_in_the_safe_lane_times_out() {
        let mut game = game_with_safe_slot(|s| s == DEFAULT_START_SLOT);
        game.advance(6_499);
        assert!(!game.is_over());
        game.advance(6_500);
        assert_eq!(game.result().map(|r| r.reason), Some(Reason::TooSlow));
        assert_eq!(game.result().map(|r| r.elapsed_secs), Some(3.5));
    }

    #[test]
    fn key_at_the_deadline_instant_beats_the_timer() {
        let mut game = game_with_safe_slot(|s| s == DEFAULT_START_SLOT);
        let target = game.wave().unwrap().target;
        assert_eq!(game.key(target, 6_500), KeyResponse::Correct);
        game.advance(6_500);
        assert!(!game.is_over());
    }

    #[test]
    fn pause_freezes_play_time_and_restarts_full_window() {
        let mut game = playing(config());
        assert_eq!(
            game.press(&RawKey::new("Escape"), 4_000),
            KeyResponse::PauseToggled { paused: true }
        );
        assert_eq!(game.clock_deadline(), None);
        assert_eq!(game.highlight(), game.wave().map(|w| w.target));

        game.advance(60_000);
        assert!(!game.is_over());
        assert_eq!(game.play_ms(), 4_000);
        assert_eq!(game.run().elapsed_ms, 1_000);
        let target = game.wave().unwrap().target;
        assert_eq!(game.key(target, 60_000), KeyResponse::Ignored);

        assert_eq!(
            game.press(&RawKey::new("Escape"), 60_000),
            KeyResponse::PauseToggled { paused: false }
        );
        assert_eq!(game.clock_deadline(), Some(4_000 + 3_500));
        assert_eq!(game.pending_reaction_timers(), 1);
    }

    #[test]
    fn pause_during_settling_does_not_start_a_clock() {
        let mut game = playing(config());
        let target = game.wave().unwrap().target;
        game.key(target, 3_100);
        game.toggle_pause(3_200);
        game.toggle_pause(3_300);
        assert_eq!(game.phase(), Phase::Settling);
        assert_eq!(game.clock_deadline(), None);
    }

    #[test]
    fn pause_before_start_is_refused() {
        let mut game = Game::new(config()).unwrap();
        assert!(!game.toggle_pause(0));
        assert_eq!(
            game.press(&RawKey::new("Enter"), 0),
            KeyResponse::RestartRequested
        );
    }

    #[test]
    fn game_over_is_terminal() {
        let mut game = playing(config());
        let wrong = wrong_letter(&game);
        game.key(wrong, 3_500);
        let result = game.result().cloned();
        let events = game.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver(_)))
                .count(),
            1
        );

        for c in crate::keys::HOME_ROW {
            assert_eq!(game.key(c, 4_000), KeyResponse::Ignored);
        }
        game.advance(100_000);
        assert!(!game.toggle_pause(100_000));
        assert_eq!(game.result().cloned(), result);
        assert!(game.drain_events().is_empty());
        assert_eq!(game.run().elapsed_ms, 500);
    }

    #[test]
    fn external_obstacle_reports_are_idempotent() {
        let mut game = playing(config());
        let target = game.wave().unwrap().target;
        game.key(target, 3_100);
        let ids: Vec<u32> = game.obstacles().iter().map(|o| o.id).collect();

        game.obstacle_finished(ids[0]);
        game.obstacle_finished(ids[0]);
        assert_eq!(game.phase(), Phase::Settling);
        game.obstacle_finished(ids[1]);
        assert_eq!(game.phase(), Phase::WaveActive);
        assert_eq!(game.generation(), 2);

        // the internal arrivals for the finished obstacles are now stale
        game.advance(6_550);
        assert_eq!(game.generation(), 2);
        assert!(!game.is_over());
    }

    #[test]
    fn bonus_batch_spawns_on_interval_one_at_a_time() {
        let mut game = playing(SessionConfig {
            bonus_interval_ms: 1_000,
            ..config()
        });
        game.drain_events();
        game.advance(4_000);
        assert_eq!(game.bonus_items().count(), SLOT_COUNT);
        assert_matches!(
            game.drain_events().as_slice(),
            [GameEvent::BonusSpawned { batch: 1 }]
        );

        // a second interval passes while the batch is still travelling
        game.advance(5_000);
        assert_eq!(game.bonus_items().count(), SLOT_COUNT);
        assert!(game.drain_events().is_empty());
    }

    fn spawned(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::BonusSpawned { .. }))
            .count()
    }

    #[test]
    fn no_bonus_spawns_while_paused_across_many_intervals() {
        let mut game = playing(SessionConfig {
            bonus_interval_ms: 500,
            ..config()
        });
        game.toggle_pause(3_100);
        game.drain_events();

        for now in (3_500..=20_000).step_by(250) {
            game.advance(now);
        }
        assert_eq!(game.bonus_items().count(), 0);
        assert_eq!(spawned(&game.drain_events()), 0);
        assert_eq!(game.play_ms(), 3_100);

        game.toggle_pause(20_000);
        game.advance(20_399);
        assert_eq!(spawned(&game.drain_events()), 0);
        // 400ms of the first interval were still owed at the pause
        game.advance(20_400);
        assert_eq!(spawned(&game.drain_events()), 1);
        assert_eq!(game.bonus_items().count(), SLOT_COUNT);
    }

    #[test]
    fn no_bonus_spawns_during_a_long_countdown() {
        let mut game = Game::new(SessionConfig {
            bonus_interval_ms: 500,
            countdown_tick_ms: 5_000,
            ..config()
        })
        .unwrap();
        game.start(0);

        for now in (250..15_000).step_by(250) {
            game.advance(now);
            assert_matches!(game.phase(), Phase::Countdown { .. });
        }
        assert_eq!(game.bonus_items().count(), 0);
        assert_eq!(spawned(&game.drain_events()), 0);

        game.advance(15_000);
        assert_eq!(game.phase(), Phase::WaveActive);
        game.advance(15_499);
        assert_eq!(spawned(&game.drain_events()), 0);
        game.advance(15_500);
        assert_eq!(spawned(&game.drain_events()), 1);
    }

    #[test]
    fn pausing_the_countdown_holds_back_the_bonus_timer() {
        let mut game = Game::new(SessionConfig {
            bonus_interval_ms: 500,
            ..config()
        })
        .unwrap();
        game.start(0);
        game.advance(1_500);
        game.toggle_pause(1_500);
        game.advance(30_000);
        assert_matches!(game.phase(), Phase::Countdown { remaining: 2 });
        assert_eq!(spawned(&game.drain_events()), 0);

        game.toggle_pause(30_000);
        game.advance(31_500);
        assert_eq!(game.phase(), Phase::WaveActive);
        assert_eq!(game.bonus_items().count(), 0);
        game.advance(32_000);
        assert_eq!(spawned(&game.drain_events()), 1);
    }

    #[test]
    fn player_starts_in_the_configured_lane() {
        let game = Game::new(SessionConfig {
            start_slot: 0,
            ..config()
        })
        .unwrap();
        assert_eq!(game.run().player_slot, 0);
        assert_eq!(Game::new(config()).unwrap().run().player_slot, DEFAULT_START_SLOT);

        assert_matches!(
            Game::new(SessionConfig {
                start_slot: SLOT_COUNT,
                ..config()
            }),
            Err(ConfigError::StartSlotOutOfRange { .. })
        );
    }

    #[test]
    fn hud_reports_live_score() {
        let mut game = playing(config());
        let target = game.wave().unwrap().target;
        game.key(target, 5_000);
        game.advance(6_000);
        let hud = game.hud();
        assert_eq!(hud.correct, 1);
        assert_eq!(hud.elapsed_secs, 3.0);
        assert_eq!(hud.score, 3);
        assert_eq!(hud.reaction_window_ms, 3_500);
    }

    #[test]
    fn hud_counts_down_the_reaction_window() {
        let mut game = playing(config());
        assert_eq!(game.hud().time_left_ms, Some(3_500));
        game.advance(4_000);
        assert_eq!(game.hud().time_left_ms, Some(2_500));

        game.toggle_pause(4_000);
        assert_eq!(game.hud().time_left_ms, None);
        game.toggle_pause(9_000);
        assert_eq!(game.hud().time_left_ms, Some(3_500));
    }
}
