//! Windows SendInput keyboard backend (scancode-based).
//!
//! Injects key events with Win32 `SendInput` and `KEYEVENTF_SCANCODE`, which
//! games pick up more reliably than virtual-key injection. Only the symbols a
//! [`crate::profile::KeyMap`] can produce are supported: letters, digits, and
//! the named special keys (enter, space, arrows). Arrow keys are extended
//! keys and carry `KEYEVENTF_EXTENDEDKEY`.

#![cfg(windows)]

use super::{BackendError, KeyboardBackend};
use crate::profile::{KeySym, SpecialKey};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, VIRTUAL_KEY,
};

/// Backend that uses Win32 SendInput to synthesize keyboard events.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyboardSendInputBackend;

impl KeyboardSendInputBackend {
    pub fn new() -> Self {
        Self
    }
}

/// US keyboard Set 1 scancode plus the extended-key flag.
fn scancode(key: KeySym) -> Result<(u16, bool), BackendError> {
    let code = match key {
        KeySym::Special(special) => {
            return Ok(match special {
                SpecialKey::Enter => (0x1C, false),
                SpecialKey::Space => (0x39, false),
                SpecialKey::Up => (0x48, true),
                SpecialKey::Down => (0x50, true),
                SpecialKey::Left => (0x4B, true),
                SpecialKey::Right => (0x4D, true),
            })
        }
        KeySym::Character(c) => match c.to_ascii_lowercase() {
            'a' => 0x1E,
            'b' => 0x30,
            'c' => 0x2E,
            'd' => 0x20,
            'e' => 0x12,
            'f' => 0x21,
            'g' => 0x22,
            'h' => 0x23,
            'i' => 0x17,
            'j' => 0x24,
            'k' => 0x25,
            'l' => 0x26,
            'm' => 0x32,
            'n' => 0x31,
            'o' => 0x18,
            'p' => 0x19,
            'q' => 0x10,
            'r' => 0x13,
            's' => 0x1F,
            't' => 0x14,
            'u' => 0x16,
            'v' => 0x2F,
            'w' => 0x11,
            'x' => 0x2D,
            'y' => 0x15,
            'z' => 0x2C,
            '1' => 0x02,
            '2' => 0x03,
            '3' => 0x04,
            '4' => 0x05,
            '5' => 0x06,
            '6' => 0x07,
            '7' => 0x08,
            '8' => 0x09,
            '9' => 0x0A,
            '0' => 0x0B,
            _ => return Err(BackendError::UnsupportedKey(key)),
        },
    };
    Ok((code, false))
}

fn send_scancode(code: u16, extended: bool, key_up: bool) -> Result<(), BackendError> {
    let mut flags: KEYBD_EVENT_FLAGS = KEYEVENTF_SCANCODE;
    if extended {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }

    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: code,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };

    // SendInput returns the number of events injected; 0 means failure.
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent == 0 {
        let err = windows::core::Error::from_win32();
        return Err(BackendError::Operation(format!("SendInput failed: {err}")));
    }
    Ok(())
}

impl KeyboardBackend for KeyboardSendInputBackend {
    fn key_down(&self, key: KeySym) -> Result<(), BackendError> {
        let (code, extended) = scancode(key)?;
        send_scancode(code, extended, false)
    }

    fn key_up(&self, key: KeySym) -> Result<(), BackendError> {
        let (code, extended) = scancode(key)?;
        send_scancode(code, extended, true)
    }
}
