//! Controller discovery.
//!
//! No vendor/product IDs are assumed; candidates are picked by a
//! case-insensitive substring match of the product string against a fixed
//! keyword set, deduplicated by physical path. Enumeration order decides
//! player-slot assignment.

use hidapi::HidApi;
use log::{debug, info};
use std::ffi::CString;

/// Product-name fragments that mark a device as a candidate controller.
const KEYWORDS: [&str; 5] = ["gamepad", "joystick", "controller", "snes", "retrolink"];

/// One discovered candidate device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerInfo {
    /// Physical path used to open the device; unique per interface.
    pub path: CString,
    /// Product string for display and logs.
    pub name: String,
}

/// True when a product name contains any discovery keyword.
pub fn name_matches(product: &str) -> bool {
    let lowered = product.to_lowercase();
    KEYWORDS.iter().any(|word| lowered.contains(word))
}

/// Enumerate connected HID devices and keep keyword-matching controllers,
/// first interface per physical path wins.
pub fn detect_controllers(api: &HidApi) -> Vec<ControllerInfo> {
    let mut found: Vec<ControllerInfo> = Vec::new();

    for device in api.device_list() {
        let Some(product) = device.product_string() else {
            continue;
        };
        if !name_matches(product) {
            continue;
        }
        let path = device.path().to_owned();
        // Some hosts list the same controller once per interface.
        if found.iter().any(|c| c.path == path) {
            debug!("Skipping duplicate interface for '{}'", product);
            continue;
        }
        found.push(ControllerInfo {
            path,
            name: product.to_string(),
        });
    }

    info!("{} controller(s) found", found.len());
    found
}
