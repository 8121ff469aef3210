//! Host-agnostic key event types.
//!
//! Every host maps its native keyboard input to these types. The shell
//! engine never sees raw platform input.

use serde::{Deserialize, Serialize};

/// A logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A printable character, already resolved for the active layout.
    Char(char),
    Enter,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    /// Any key the shell does not interpret (function keys, modifiers...).
    Other,
}

/// A key transition delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    /// Whether shift was held when the event fired.
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }

    /// Event for a typed character, with shift inferred from its case.
    pub fn from_char(ch: char) -> Self {
        Self {
            key: Key::Char(ch),
            shift: ch.is_uppercase(),
        }
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}
