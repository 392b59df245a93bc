//! USB HID device access.
//!
//! Thin layer over `hidapi`: keyword-based controller discovery and a
//! non-blocking report source per open device. Everything above this module
//! talks to the [`ReportSource`] trait so tests can substitute scripted
//! report streams.

pub mod discovery;
pub mod scripted;
pub mod session;

pub use discovery::{detect_controllers, ControllerInfo};
pub use scripted::{Poll, ScriptedSource};
pub use session::{HidSession, RawReport, ReportSource, REPORT_LEN};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HidError {
    #[error("failed to initialize HID backend: {0}")]
    Init(#[source] hidapi::HidError),

    #[error("failed to open device '{name}': {source}")]
    OpenFailed {
        name: String,
        #[source]
        source: hidapi::HidError,
    },

    #[error("device lost mid-session: {0}")]
    Lost(String),
}
