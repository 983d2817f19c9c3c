//! Input snapshots consumed once per simulation tick
//!
//! The platform layer owns event polling; the core only ever sees a copy of
//! the current key/mouse state handed to the World at the start of a tick.

use crate::math::Vec2;
use std::collections::HashSet;

/// Platform-neutral key identifier (scan code or virtual key, as the
/// platform layer chooses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    /// Cursor position in window pixels, origin top-left.
    pub mouse_position: Vec2,
    /// Viewport size in pixels, used for screen-to-world rays.
    pub viewport_size: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.keys_down.insert(key);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        self.mouse_buttons.insert(button);
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        self.mouse_buttons.remove(&button);
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Key is down now but was not in `previous`.
    pub fn key_pressed_since(&self, previous: &InputState, key: KeyCode) -> bool {
        self.is_key_down(key) && !previous.is_key_down(key)
    }

    pub fn key_released_since(&self, previous: &InputState, key: KeyCode) -> bool {
        !self.is_key_down(key) && previous.is_key_down(key)
    }
}
