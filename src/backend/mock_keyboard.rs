//! Recording mock keyboard backend.
//!
//! Logs every event and keeps it in memory so tests can assert on exactly
//! what was emitted (edge counts, stop safety, per-player key routing).

use super::{BackendError, KeyboardBackend};
use crate::profile::KeySym;
use log::info;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub key: KeySym,
}

/// Mock backend; clones share the same recorded event list.
#[derive(Debug, Clone, Default)]
pub struct MockKeyboardBackend {
    events: Arc<Mutex<Vec<KeyEvent>>>,
}

impl MockKeyboardBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.lock().expect("mock event lock").clone()
    }

    pub fn clear(&self) {
        self.events.lock().expect("mock event lock").clear();
    }

    /// Keys with an unmatched down event, i.e. logically held right now.
    pub fn held_keys(&self) -> HashSet<KeySym> {
        let mut held = HashSet::new();
        for event in self.events.lock().expect("mock event lock").iter() {
            match event.action {
                KeyAction::Down => {
                    held.insert(event.key);
                }
                KeyAction::Up => {
                    held.remove(&event.key);
                }
            }
        }
        held
    }

    fn record(&self, action: KeyAction, key: KeySym) {
        self.events
            .lock()
            .expect("mock event lock")
            .push(KeyEvent { action, key });
    }
}

impl KeyboardBackend for MockKeyboardBackend {
    fn key_down(&self, key: KeySym) -> Result<(), BackendError> {
        info!("[MOCK KEYBOARD] Key DOWN: {}", key);
        self.record(KeyAction::Down, key);
        Ok(())
    }

    fn key_up(&self, key: KeySym) -> Result<(), BackendError> {
        info!("[MOCK KEYBOARD] Key UP: {}", key);
        self.record(KeyAction::Up, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_recorded_stream() {
        let mock = MockKeyboardBackend::new();
        let clone = mock.clone();

        mock.key_down(KeySym::Character('w')).unwrap();
        clone.key_up(KeySym::Character('w')).unwrap();

        let events = mock.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, KeyAction::Down);
        assert_eq!(events[1].action, KeyAction::Up);
    }

    #[test]
    fn held_keys_tracks_unmatched_downs() {
        let mock = MockKeyboardBackend::new();
        let w = KeySym::Character('w');
        let s = KeySym::Character('s');

        mock.key_down(w).unwrap();
        mock.key_down(w).unwrap(); // forced hold re-press
        mock.key_down(s).unwrap();
        mock.key_up(s).unwrap();

        let held = mock.held_keys();
        assert!(held.contains(&w));
        assert!(!held.contains(&s));
    }
}
