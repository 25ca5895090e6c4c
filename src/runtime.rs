use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What the frame loop reacts to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived within one frame; timers get a chance to fire.
    Frame,
    /// The input source is gone and nothing more will arrive.
    InputClosed,
}

/// An event together with the wall millisecond it was picked up at.
/// The game maps this onto its own play clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stamped {
    pub at_ms: u64,
    pub event: AppEvent,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Wait at most `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Monotonic millisecond clock the loop stamps events with
pub trait TimeSource: Send + Sync + 'static {
    fn now_ms(&self) -> u64;
}

#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    epoch: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}

/// Production event source: a reader thread forwarding crossterm key-down
/// and resize events.
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                // key-up events only show up with enhanced keyboard reporting
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Release => continue,
                Ok(CtEvent::Key(key)) => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(event).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Replays a fixed input script against a [`ManualClock`]. Every receive
/// moves the clock by the full frame, so a scripted session runs in
/// simulated time; an exhausted script reads as a closed input.
pub struct ScriptedSource {
    clock: ManualClock,
    script: Mutex<VecDeque<Option<AppEvent>>>,
}

impl ScriptedSource {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn key(self, code: KeyCode) -> Self {
        self.push(Some(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))))
    }

    pub fn letter(self, c: char) -> Self {
        self.key(KeyCode::Char(c))
    }

    pub fn event(self, event: AppEvent) -> Self {
        self.push(Some(event))
    }

    /// `frames` empty frames with no input
    pub fn idle(mut self, frames: usize) -> Self {
        for _ in 0..frames {
            self = self.push(None);
        }
        self
    }

    fn push(self, step: Option<AppEvent>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
        self
    }
}

impl EventSource for ScriptedSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        let next = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(_) => None,
        };
        self.clock.advance(timeout);
        match next {
            Some(Some(event)) => Ok(event),
            Some(None) => Err(RecvTimeoutError::Timeout),
            None => Err(RecvTimeoutError::Disconnected),
        }
    }
}

/// Drives the frame loop: waits up to one frame for input and stamps what
/// it gets.
pub struct Runner<E: EventSource, C: TimeSource> {
    source: E,
    clock: C,
    frame: Duration,
}

impl<E: EventSource, C: TimeSource> Runner<E, C> {
    pub fn new(source: E, clock: C, frame: Duration) -> Self {
        Self {
            source,
            clock,
            frame,
        }
    }

    pub fn step(&self) -> Stamped {
        let event = match self.source.recv_timeout(self.frame) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => AppEvent::Frame,
            Err(RecvTimeoutError::Disconnected) => AppEvent::InputClosed,
        };
        Stamped {
            at_ms: self.clock.now_ms(),
            event,
        }
    }
}
