//! Key emission backends.
//!
//! The translator talks to a [`KeyboardBackend`]; the real implementation
//! injects events into the OS, the mock records them so tests can assert on
//! what the state machine emitted.

pub mod keyboard_sendinput;
pub mod mock_keyboard;

#[cfg(windows)]
pub use keyboard_sendinput::KeyboardSendInputBackend;

pub use mock_keyboard::{KeyAction, KeyEvent, MockKeyboardBackend};

use crate::profile::KeySym;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend operation failed: {0}")]
    Operation(String),

    #[error("unsupported key: {0}")]
    UnsupportedKey(KeySym),
}

/// Sink for synthesized keyboard events.
pub trait KeyboardBackend {
    /// Press a key (key down event).
    fn key_down(&self, key: KeySym) -> Result<(), BackendError>;

    /// Release a key (key up event).
    fn key_up(&self, key: KeySym) -> Result<(), BackendError>;
}
