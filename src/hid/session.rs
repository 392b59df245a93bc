//! Device session: one open handle, non-blocking fixed-size reads.

use super::HidError;
use hidapi::{HidApi, HidDevice};
use log::debug;
use std::ffi::CStr;

/// Fixed input report size these controllers produce.
pub const REPORT_LEN: usize = 64;

/// A raw input report: up to [`REPORT_LEN`] bytes from one successful poll.
pub type RawReport = Vec<u8>;

/// Non-blocking source of input reports.
///
/// `Ok(None)` means the poll returned no fresh report; the caller never
/// blocks on I/O. Implemented by [`HidSession`] for real hardware and by
/// [`super::ScriptedSource`] in tests.
pub trait ReportSource {
    fn read_report(&mut self) -> Result<Option<RawReport>, HidError>;
}

/// Exclusive owner of one open HID device handle.
///
/// The handle is switched to non-blocking mode at open and closed when the
/// session drops.
pub struct HidSession {
    device: HidDevice,
    name: String,
}

impl HidSession {
    /// Open the device behind a discovery entry by its physical path.
    pub fn open(api: &HidApi, path: &CStr, name: &str) -> Result<Self, HidError> {
        let device = api.open_path(path).map_err(|source| HidError::OpenFailed {
            name: name.to_string(),
            source,
        })?;
        device
            .set_blocking_mode(false)
            .map_err(|source| HidError::OpenFailed {
                name: name.to_string(),
                source,
            })?;
        debug!("Opened HID session for '{}'", name);
        Ok(Self {
            device,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ReportSource for HidSession {
    fn read_report(&mut self) -> Result<Option<RawReport>, HidError> {
        let mut buf = [0u8; REPORT_LEN];
        // In non-blocking mode a read with no pending report returns 0 bytes.
        match self.device.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(buf[..n].to_vec())),
            Err(e) => Err(HidError::Lost(e.to_string())),
        }
    }
}

impl Drop for HidSession {
    fn drop(&mut self) {
        debug!("Closing HID session for '{}'", self.name);
    }
}
