//! Calibration engine integration tests over scripted report streams.

use crossbeam_channel::bounded;
use padbridge::bridge::BridgeEvent;
use padbridge::calibrate::{calibrate, CalibrationError, CalibrationOptions};
use padbridge::cancel::CancelToken;
use padbridge::profile::Button;
use padbridge::ScriptedSource;
use std::time::Duration;

fn fast_options() -> CalibrationOptions {
    CalibrationOptions {
        settle_delay: Duration::ZERO,
        idle_samples: 3,
        idle_sample_interval: Duration::ZERO,
        poll_interval: Duration::ZERO,
        release_settle: Duration::ZERO,
        poll_limit: Some(64),
    }
}

/// Idle baseline used across these tests; first eight bytes match the
/// worked decoding example, padded out to a realistic report width.
fn baseline() -> Vec<u8> {
    let mut report = vec![0u8, 128, 128, 127, 127, 15, 0, 0];
    report.resize(16, 0);
    report
}

/// Script a complete calibration: button number `k` toggles byte `k`.
fn script_full_run(source: &mut ScriptedSource, baseline: &[u8]) {
    // Idle phase: two quiet polls, then the baseline itself.
    source.push_empty();
    source.push_empty();
    source.push_report(baseline);

    for k in 0..Button::ALL.len() {
        let mask = if k == 5 { 32 } else { 1u8 << (k % 8) };
        let mut pressed = baseline.to_vec();
        pressed[k] ^= mask;

        source.push_report(&pressed); // press observed
        source.push_report(baseline); // release observed
    }
}

#[test]
fn full_run_learns_a_rule_per_button() {
    let _ = env_logger::builder().is_test(true).try_init();

    let baseline = baseline();
    let mut source = ScriptedSource::new();
    script_full_run(&mut source, &baseline);

    let (tx, rx) = bounded(256);
    let profile = calibrate(&mut source, 0, &fast_options(), &CancelToken::new(), &tx)
        .expect("calibration should succeed")
        .expect("not cancelled");

    for (k, &button) in Button::ALL.iter().enumerate() {
        let mapping = profile.mapping(button);
        assert_eq!(mapping.index, k, "button {}", button);
        assert_eq!(mapping.idle_value, baseline[k]);
        assert_ne!(mapping.mask, 0);
    }

    // Sixth button is the worked example: idle 15, pressed 47, mask 32.
    let mapping = profile.mapping(Button::B);
    assert_eq!(mapping.index, 5);
    assert_eq!(mapping.idle_value, 15);
    assert_eq!(mapping.mask, 32);
    assert!(mapping.is_pressed(47));
    assert!(!mapping.is_pressed(15));

    // One prompt and one mapped notification per button.
    let events: Vec<BridgeEvent> = rx.try_iter().collect();
    let prompts = events
        .iter()
        .filter(|e| matches!(e, BridgeEvent::CalibrationPrompt { .. }))
        .count();
    let mapped = events
        .iter()
        .filter(|e| matches!(e, BridgeEvent::CalibrationMapped { .. }))
        .count();
    assert_eq!(prompts, Button::ALL.len());
    assert_eq!(mapped, Button::ALL.len());
}

#[test]
fn dead_device_reports_no_idle_signal() {
    let mut source = ScriptedSource::new();
    let (tx, _rx) = bounded(16);
    let result = calibrate(&mut source, 0, &fast_options(), &CancelToken::new(), &tx);
    assert!(matches!(result, Err(CalibrationError::NoIdleSignal)));
}

#[test]
fn unresponsive_button_is_incomplete() {
    let baseline = baseline();
    let mut source = ScriptedSource::new();
    source.push_report(&baseline);
    source.push_empty();
    source.push_empty();
    // First button never presses; the stream just repeats the idle state.
    source.repeat_report(&baseline, 70);

    let (tx, _rx) = bounded(16);
    let result = calibrate(&mut source, 0, &fast_options(), &CancelToken::new(), &tx);
    assert!(matches!(result, Err(CalibrationError::Incomplete)));
}

#[test]
fn cancelled_calibration_returns_none() {
    let baseline = baseline();
    let mut source = ScriptedSource::new();
    script_full_run(&mut source, &baseline);

    let token = CancelToken::new();
    token.cancel();

    let (tx, _rx) = bounded(16);
    let result = calibrate(&mut source, 1, &fast_options(), &token, &tx).unwrap();
    assert!(result.is_none());
}

#[test]
fn release_wait_tolerates_noise_on_other_bytes() {
    let baseline = baseline();
    let mut source = ScriptedSource::new();

    source.push_report(&baseline);
    source.push_empty();
    source.push_empty();

    for k in 0..Button::ALL.len() {
        let mut pressed = baseline.clone();
        pressed[k] ^= 0x40;
        source.push_report(&pressed);

        // Released at the learned index, but a far byte is still jittering.
        let mut noisy_release = baseline.clone();
        noisy_release[15] = 0xAA;
        source.push_report(&noisy_release);
    }

    let (tx, _rx) = bounded(256);
    let profile = calibrate(&mut source, 0, &fast_options(), &CancelToken::new(), &tx)
        .expect("noise elsewhere must not stall calibration")
        .expect("not cancelled");
    assert_eq!(profile.mapping(Button::Start).mask, 0x40);
}
