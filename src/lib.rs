//! Padbridge: Unbranded USB Gamepad to Keyboard Bridge
//!
//! This library turns no-name USB HID gamepads into keyboard input without a
//! vendor report descriptor. A differential calibration pass learns, per
//! button, which byte and bit pattern of the opaque 64-byte input report
//! toggles on a press; a polling translator then replays those learned rules
//! against the live report stream and synthesizes key events for up to two
//! controllers at once.

pub mod backend;
pub mod bridge;
pub mod calibrate;
pub mod cancel;
pub mod config;
pub mod hid;
pub mod profile;
pub mod translate;

// Re-export commonly used items
pub use backend::{KeyboardBackend, MockKeyboardBackend};
pub use bridge::{Bridge, BridgeEvent};
pub use cancel::CancelToken;
pub use config::Config;
pub use hid::{HidSession, ReportSource, ScriptedSource};
pub use profile::{Button, ButtonMapping, KeyMap, KeySym, Profile};
