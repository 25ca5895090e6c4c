use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, ModifierKeyCode};

use crate::keys::mixed_pool;

/// Key names that never count as gameplay input
pub const IGNORE_KEYS: [&str; 32] = [
    "Shift",
    "Control",
    "Alt",
    "Meta",
    "CapsLock",
    "Tab",
    "Escape",
    "Enter",
    "Backspace",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "Home",
    "End",
    "PageUp",
    "PageDown",
    "Insert",
    "Delete",
    "ContextMenu",
    "F1",
    "F2",
    "F3",
    "F4",
    "F5",
    "F6",
    "F7",
    "F8",
    "F9",
    "F10",
    "F11",
    "F12",
];

/// A key-down event as delivered by the input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKey {
    pub key: String,
    pub repeat: bool,
}

impl RawKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            repeat: false,
        }
    }

    pub fn repeated(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            repeat: true,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(c.to_string())
    }
}

impl From<&KeyEvent> for RawKey {
    fn from(event: &KeyEvent) -> Self {
        let key = match event.code {
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Esc => "Escape".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Backspace => "Backspace".into(),
            KeyCode::Tab | KeyCode::BackTab => "Tab".into(),
            KeyCode::Up => "ArrowUp".into(),
            KeyCode::Down => "ArrowDown".into(),
            KeyCode::Left => "ArrowLeft".into(),
            KeyCode::Right => "ArrowRight".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PageUp".into(),
            KeyCode::PageDown => "PageDown".into(),
            KeyCode::Insert => "Insert".into(),
            KeyCode::Delete => "Delete".into(),
            KeyCode::CapsLock => "CapsLock".into(),
            KeyCode::Menu => "ContextMenu".into(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Modifier(m) => match m {
                ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => "Shift".into(),
                ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => "Control".into(),
                ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => "Alt".into(),
                _ => "Meta".into(),
            },
            _ => "Unidentified".into(),
        };

        Self {
            key,
            repeat: event.kind == KeyEventKind::Repeat,
        }
    }
}

/// Non-gameplay commands carried by control keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    TogglePause,
    Restart,
}

/// Route control keys to pause/restart handling.
pub fn control(raw: &RawKey) -> Option<Control> {
    if raw.repeat {
        return None;
    }
    match raw.key.as_str() {
        "Escape" => Some(Control::TogglePause),
        "Enter" => Some(Control::Restart),
        _ => None,
    }
}

/// Map a raw key event to the canonical character it stands for, if any.
///
/// Shifted punctuation collapses onto its unshifted key so holding Shift does
/// not cost the player the round.
pub fn normalize(raw: &RawKey) -> Option<char> {
    if raw.repeat || IGNORE_KEYS.contains(&raw.key.as_str()) {
        return None;
    }

    let mut chars = raw.key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };

    match c {
        ':' => Some(';'),
        '<' => Some(','),
        '>' => Some('.'),
        '?' => Some('/'),
        c => {
            // lowercase forms that expand to several chars are not keys
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => Some(l),
                _ => None,
            }
        }
    }
}

pub fn is_allowed(c: char) -> bool {
    mixed_pool().contains(&c)
}
