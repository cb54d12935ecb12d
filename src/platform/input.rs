//! Keyboard input
//!
//! `KeyTracker` consumes key down/up events as they arrive and produces one
//! `InputSnapshot` per frame. A press is edge-triggered: it appears in exactly
//! one snapshot, however long the key is then held.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Escape,
    /// Mute toggle
    M,
    /// Anything else (still counts for "press any key")
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` string to a key
    pub fn from_code(code: &str) -> Self {
        match code {
            "ArrowLeft" | "KeyA" => Key::Left,
            "ArrowRight" | "KeyD" => Key::Right,
            "ArrowUp" | "KeyW" => Key::Up,
            "ArrowDown" | "KeyS" => Key::Down,
            "Space" => Key::Space,
            "Enter" | "NumpadEnter" => Key::Enter,
            "Escape" => Key::Escape,
            "KeyM" => Key::M,
            _ => Key::Other,
        }
    }

    /// Short label for on-screen prompts
    pub fn label(&self) -> &'static str {
        match self {
            Key::Left => "\u{2190}",
            Key::Right => "\u{2192}",
            Key::Up => "\u{2191}",
            Key::Down => "\u{2193}",
            Key::Space => "SPACE",
            Key::Enter => "ENTER",
            Key::Escape => "ESC",
            Key::M => "M",
            Key::Other => "?",
        }
    }

    /// The four arrows, in a fixed order
    pub const ARROWS: [Key; 4] = [Key::Up, Key::Down, Key::Left, Key::Right];
}

/// Immutable view of the keyboard for one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    down: HashSet<Key>,
    /// Keys newly pressed this frame, in arrival order
    pressed: Vec<Key>,
}

impl InputSnapshot {
    /// No keys held, nothing pressed
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot where `keys` were just pressed (and are therefore held)
    pub fn pressing(keys: &[Key]) -> Self {
        let mut snap = Self::default();
        for &key in keys {
            snap.down.insert(key);
            if !snap.pressed.contains(&key) {
                snap.pressed.push(key);
            }
        }
        snap
    }

    /// Snapshot where `keys` are held but none were pressed this frame
    pub fn holding(keys: &[Key]) -> Self {
        Self {
            down: keys.iter().copied().collect(),
            pressed: Vec::new(),
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    /// True only on the frame the key went down
    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn any_key_pressed(&self) -> bool {
        !self.pressed.is_empty()
    }

    /// Fresh presses in the order they happened
    pub fn presses(&self) -> &[Key] {
        &self.pressed
    }

    /// -1 for left, +1 for right, 0 for neither/both
    pub fn horizontal_axis(&self) -> f32 {
        let mut axis = 0.0;
        if self.is_down(Key::Left) {
            axis -= 1.0;
        }
        if self.is_down(Key::Right) {
            axis += 1.0;
        }
        axis
    }

    /// -1 for up, +1 for down (screen coordinates)
    pub fn vertical_axis(&self) -> f32 {
        let mut axis = 0.0;
        if self.is_down(Key::Up) {
            axis -= 1.0;
        }
        if self.is_down(Key::Down) {
            axis += 1.0;
        }
        axis
    }
}

/// Accumulates raw events between frames
#[derive(Debug, Default)]
pub struct KeyTracker {
    down: HashSet<Key>,
    pressed: Vec<Key>,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key went down. Auto-repeat events for an already-held key are ignored.
    pub fn key_down(&mut self, key: Key) {
        if self.down.insert(key) && !self.pressed.contains(&key) {
            self.pressed.push(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.down.remove(&key);
    }

    /// Release everything (e.g. window lost focus)
    pub fn release_all(&mut self) {
        self.down.clear();
    }

    /// Produce this frame's snapshot and clear the edge-triggered presses
    pub fn snapshot(&mut self) -> InputSnapshot {
        InputSnapshot {
            down: self.down.clone(),
            pressed: std::mem::take(&mut self.pressed),
        }
    }
}
