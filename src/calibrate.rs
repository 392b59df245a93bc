//! Differential calibration engine.
//!
//! Learns one decode rule per button with no knowledge of the device's
//! report layout: capture an idle baseline, then for each prompted button
//! take the FIRST byte index where a report diverges from the baseline and
//! record `mask = report[i] ^ baseline[i]`.
//!
//! The first-divergence tie-break is a single-sample heuristic: a second
//! button held at the same moment, or controller debounce noise, corrupts
//! that button's rule. Reconciling simultaneous multi-byte changes is out of
//! scope; recalibrating is the fix.

use crate::bridge::BridgeEvent;
use crate::cancel::CancelToken;
use crate::hid::{HidError, RawReport, ReportSource};
use crate::profile::{Button, ButtonMapping, Profile, ProfileBuilder};
use crossbeam_channel::Sender;
use log::{debug, info};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("no idle report received; is the controller connected?")]
    NoIdleSignal,

    #[error("calibration did not complete for every button")]
    Incomplete,

    #[error(transparent)]
    Device(#[from] HidError),
}

/// Timing and bounding knobs. Tests zero the delays and cap the polls.
#[derive(Debug, Clone)]
pub struct CalibrationOptions {
    /// Hands-off delay before idle sampling starts.
    pub settle_delay: Duration,
    /// Number of idle polls; the last non-empty report wins.
    pub idle_samples: usize,
    /// Delay between idle polls.
    pub idle_sample_interval: Duration,
    /// Delay between polls while waiting on a press or release.
    pub poll_interval: Duration,
    /// Pause after a release is observed, before the next prompt.
    pub release_settle: Duration,
    /// Upper bound on polls per press/release wait; `None` waits forever
    /// (cancellation still applies). Exceeding it is [`CalibrationError::Incomplete`].
    pub poll_limit: Option<usize>,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            idle_samples: 10,
            idle_sample_interval: Duration::from_millis(50),
            poll_interval: Duration::from_millis(10),
            release_settle: Duration::from_millis(500),
            poll_limit: None,
        }
    }
}

/// Calibrate one controller: learn a mapping for every button, in
/// [`Button::ALL`] order.
///
/// Returns `Ok(None)` when the token is cancelled mid-run; the partial
/// profile is discarded and nothing is persisted.
pub fn calibrate<S: ReportSource>(
    source: &mut S,
    slot: usize,
    options: &CalibrationOptions,
    cancel: &CancelToken,
    events: &Sender<BridgeEvent>,
) -> Result<Option<Profile>, CalibrationError> {
    info!(
        "Calibrating player {}: keep all buttons released",
        slot + 1
    );
    std::thread::sleep(options.settle_delay);

    let Some(baseline) = sample_idle(source, options, cancel)? else {
        return Ok(None);
    };
    info!("Player {} idle baseline captured", slot + 1);

    let mut builder = ProfileBuilder::new();

    for &button in Button::ALL.iter() {
        info!("[PLAYER {}] PRESS AND HOLD: [{}]", slot + 1, button);
        let _ = events.try_send(BridgeEvent::CalibrationPrompt { slot, button });

        let Some(mapping) = wait_for_press(source, &baseline, options, cancel)? else {
            return Ok(None);
        };
        debug!(
            "[{}] mapped: index {} idle {} mask {:#04x}",
            button, mapping.index, mapping.idle_value, mapping.mask
        );
        builder.insert(button, mapping);
        let _ = events.try_send(BridgeEvent::CalibrationMapped {
            slot,
            button,
            mapping,
        });

        info!("[{}] mapped, release the button", button);
        if !wait_for_release(source, &baseline, mapping.index, options, cancel)? {
            return Ok(None);
        }
        std::thread::sleep(options.release_settle);
    }

    let profile = builder.finish().ok_or(CalibrationError::Incomplete)?;
    info!("Player {} calibration complete", slot + 1);
    Ok(Some(profile))
}

/// Bounded idle sampling; keeps the last non-empty report.
fn sample_idle<S: ReportSource>(
    source: &mut S,
    options: &CalibrationOptions,
    cancel: &CancelToken,
) -> Result<Option<RawReport>, CalibrationError> {
    let mut baseline: Option<RawReport> = None;
    for _ in 0..options.idle_samples {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        if let Some(report) = source.read_report()? {
            baseline = Some(report);
        }
        std::thread::sleep(options.idle_sample_interval);
    }
    match baseline {
        Some(report) => Ok(Some(report)),
        None => Err(CalibrationError::NoIdleSignal),
    }
}

/// Poll until a report differs from the baseline anywhere; the first
/// differing byte index becomes the rule. `Ok(None)` on cancellation.
fn wait_for_press<S: ReportSource>(
    source: &mut S,
    baseline: &[u8],
    options: &CalibrationOptions,
    cancel: &CancelToken,
) -> Result<Option<ButtonMapping>, CalibrationError> {
    let mut polls = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        if options.poll_limit.is_some_and(|limit| polls >= limit) {
            return Err(CalibrationError::Incomplete);
        }
        polls += 1;

        if let Some(report) = source.read_report()? {
            let diff = report
                .iter()
                .zip(baseline.iter())
                .position(|(current, idle)| current != idle);
            if let Some(index) = diff {
                return Ok(Some(ButtonMapping {
                    index,
                    idle_value: baseline[index],
                    mask: report[index] ^ baseline[index],
                }));
            }
        }
        std::thread::sleep(options.poll_interval);
    }
}

/// Poll until the learned byte alone reads idle again. Deliberately ignores
/// the rest of the report so unrelated noise cannot stall calibration.
fn wait_for_release<S: ReportSource>(
    source: &mut S,
    baseline: &[u8],
    index: usize,
    options: &CalibrationOptions,
    cancel: &CancelToken,
) -> Result<bool, CalibrationError> {
    let mut polls = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        if options.poll_limit.is_some_and(|limit| polls >= limit) {
            return Err(CalibrationError::Incomplete);
        }
        polls += 1;

        if let Some(report) = source.read_report()? {
            if report.len() > index && report[index] == baseline[index] {
                return Ok(true);
            }
        }
        std::thread::sleep(options.poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::ScriptedSource;
    use crossbeam_channel::bounded;

    fn fast_options() -> CalibrationOptions {
        CalibrationOptions {
            settle_delay: Duration::ZERO,
            idle_samples: 3,
            idle_sample_interval: Duration::ZERO,
            poll_interval: Duration::ZERO,
            release_settle: Duration::ZERO,
            poll_limit: Some(32),
        }
    }

    #[test]
    fn all_empty_idle_polls_is_no_idle_signal() {
        let mut source = ScriptedSource::new();
        let (tx, _rx) = bounded(16);
        let result = calibrate(&mut source, 0, &fast_options(), &CancelToken::new(), &tx);
        assert!(matches!(result, Err(CalibrationError::NoIdleSignal)));
    }

    #[test]
    fn cancellation_discards_partial_profile() {
        let mut source = ScriptedSource::new();
        source.push_report(&[0u8; 8]);
        let token = CancelToken::new();
        token.cancel();

        let (tx, _rx) = bounded(16);
        let result = calibrate(&mut source, 0, &fast_options(), &token, &tx).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn press_wait_takes_first_differing_index() {
        let baseline = [0u8, 128, 128, 127, 127, 15, 0, 0];
        let pressed = [0u8, 128, 128, 127, 127, 47, 0, 0];

        let mut source = ScriptedSource::new();
        source.push_empty();
        source.push_report(&baseline); // identical: keep waiting
        source.push_report(&pressed);

        let mapping = wait_for_press(&mut source, &baseline, &fast_options(), &CancelToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(mapping.index, 5);
        assert_eq!(mapping.idle_value, 15);
        assert_eq!(mapping.mask, 32);
    }

    #[test]
    fn release_wait_ignores_unrelated_bytes() {
        let baseline = [0u8, 128, 128, 127];
        let mut source = ScriptedSource::new();
        // Index 1 still pressed, then released while byte 3 is noisy.
        source.push_report(&[0, 129, 128, 127]);
        source.push_report(&[0, 128, 128, 90]);

        let released =
            wait_for_release(&mut source, &baseline, 1, &fast_options(), &CancelToken::new())
                .unwrap();
        assert!(released);
    }

    #[test]
    fn silent_button_exhausts_poll_limit() {
        let baseline = [0u8; 8];
        let mut source = ScriptedSource::new();
        source.repeat_report(&baseline, 40);

        let result = wait_for_press(&mut source, &baseline, &fast_options(), &CancelToken::new());
        assert!(matches!(result, Err(CalibrationError::Incomplete)));
    }
}
