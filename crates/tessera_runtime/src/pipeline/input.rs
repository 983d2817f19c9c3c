use parking_lot::Mutex;
use std::sync::Arc;
use tessera_core::InputState;

/// Input state shared between the platform thread, which writes it as events
/// arrive, and the simulation thread, which copies it once per tick.
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    state: Arc<Mutex<InputState>>,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit the latched state in place.
    pub fn update<R>(&self, edit: impl FnOnce(&mut InputState) -> R) -> R {
        edit(&mut self.state.lock())
    }

    pub fn set(&self, state: InputState) {
        *self.state.lock() = state;
    }

    pub fn snapshot(&self) -> InputState {
        self.state.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::KeyCode;

    #[test]
    fn clones_share_state() {
        let latch = InputLatch::new();
        let platform = latch.clone();
        platform.update(|state| state.press_key(KeyCode(32)));

        let seen = latch.snapshot();
        assert!(seen.is_key_down(KeyCode(32)));

        platform.update(|state| state.release_key(KeyCode(32)));
        assert!(seen.is_key_down(KeyCode(32)));
        assert!(!latch.snapshot().is_key_down(KeyCode(32)));
    }
}
