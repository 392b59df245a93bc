//! Translation: decode learned bit rules and synthesize key events.
//!
//! Three pieces live here. `decode_into` replays a profile's bit rules
//! against one raw report. [`ButtonStates`] is the per-player two-state
//! machine that turns boolean samples into key events, re-asserting a press
//! on every poll while held so host key-repeat timers cannot auto-release a
//! sustained hold. [`run_translation`] is the single cooperative loop that
//! multiplexes up to two player lanes.

use crate::backend::KeyboardBackend;
use crate::bridge::BridgeEvent;
use crate::cancel::CancelToken;
use crate::hid::{HidError, ReportSource};
use crate::profile::{Button, KeyMap, Profile, BUTTON_COUNT};
use crossbeam_channel::Sender;
use log::{debug, info, trace, warn};
use std::time::Duration;

/// Decode one report against a profile, updating per-button booleans in
/// place.
///
/// Pure and deterministic in `(report, profile)` for every button the report
/// covers. When the report is too short for a mapping's byte index that
/// button's previous value is retained, so a truncated report never
/// spuriously clears a held button.
pub fn decode_into(report: &[u8], profile: &Profile, state: &mut [bool; BUTTON_COUNT]) {
    for &button in Button::ALL.iter() {
        let mapping = profile.mapping(button);
        if report.len() <= mapping.index {
            continue;
        }
        state[button.index()] = mapping.is_pressed(report[mapping.index]);
    }
}

/// A press or release edge, for logging and the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// One observed button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub button: Button,
    pub edge: Edge,
}

/// Per-player button state machine: current and previous boolean per button.
///
/// `key_down` goes out on every poll a button reads pressed (forced hold);
/// the returned transitions carry only the edges, exactly one `Pressed` per
/// maximal run of pressed samples and one `Released` after it.
#[derive(Debug, Clone, Default)]
pub struct ButtonStates {
    current: [bool; BUTTON_COUNT],
    previous: [bool; BUTTON_COUNT],
}

impl ButtonStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded booleans for the next `dispatch` call.
    pub fn sample_mut(&mut self) -> &mut [bool; BUTTON_COUNT] {
        &mut self.current
    }

    /// Emit key events for the current sample and advance previous state.
    /// Buttons without a key map entry are tracked but emit nothing.
    pub fn dispatch<K: KeyboardBackend>(&mut self, keymap: &KeyMap, backend: &K) -> Vec<Transition> {
        let mut transitions = Vec::new();

        for &button in Button::ALL.iter() {
            let i = button.index();
            let pressed = self.current[i];
            let was_pressed = self.previous[i];

            if let Some(key) = keymap.key(button) {
                if pressed {
                    // Forced hold: re-assert the press every poll.
                    if let Err(e) = backend.key_down(key) {
                        warn!("Failed to press key '{}': {}", key, e);
                    }
                } else if was_pressed {
                    if let Err(e) = backend.key_up(key) {
                        warn!("Failed to release key '{}': {}", key, e);
                    }
                }
            }

            if pressed != was_pressed {
                let edge = if pressed { Edge::Pressed } else { Edge::Released };
                trace!("button {} {:?}", button, edge);
                transitions.push(Transition { button, edge });
            }

            self.previous[i] = pressed;
        }

        transitions
    }

    /// Release every mapped key currently held. Used on every loop exit path
    /// so no key stays logically stuck on the host.
    pub fn release_all<K: KeyboardBackend>(&mut self, keymap: &KeyMap, backend: &K) {
        for &button in Button::ALL.iter() {
            let i = button.index();
            if !(self.current[i] || self.previous[i]) {
                continue;
            }
            if let Some(key) = keymap.key(button) {
                if let Err(e) = backend.key_up(key) {
                    warn!("Failed to release key '{}': {}", key, e);
                }
            }
            self.current[i] = false;
            self.previous[i] = false;
        }
    }
}

/// One player slot: device source, learned profile, state machine, key table.
pub struct PlayerLane<S: ReportSource> {
    pub slot: usize,
    pub source: S,
    pub profile: Profile,
    pub keymap: KeyMap,
    pub states: ButtonStates,
    active: bool,
}

impl<S: ReportSource> PlayerLane<S> {
    pub fn new(slot: usize, source: S, profile: Profile, keymap: KeyMap) -> Self {
        Self {
            slot,
            source,
            profile,
            keymap,
            states: ButtonStates::new(),
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Timing knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Sleep between multiplexer iterations; bounds CPU use and stop latency.
    pub poll_interval: Duration,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
        }
    }
}

/// Run the session multiplexer until the token is cancelled.
///
/// Each iteration issues one non-blocking read per active lane; a fresh
/// report is decoded and dispatched, a read failure deactivates that lane
/// (its keys released, the other lane keeps running). On exit every held key
/// across every lane is released before the sources drop.
pub fn run_translation<S, K>(
    lanes: &mut [PlayerLane<S>],
    backend: &K,
    options: &TranslateOptions,
    cancel: &CancelToken,
    events: &Sender<BridgeEvent>,
) where
    S: ReportSource,
    K: KeyboardBackend,
{
    info!("Translator running with {} player lane(s)", lanes.len());

    while !cancel.is_cancelled() {
        for lane in lanes.iter_mut() {
            if !lane.active {
                continue;
            }
            match lane.source.read_report() {
                Ok(Some(report)) => {
                    decode_into(&report, &lane.profile, lane.states.sample_mut());
                    for transition in lane.states.dispatch(&lane.keymap, backend) {
                        debug!(
                            "[P{}] {} {:?}",
                            lane.slot + 1,
                            transition.button,
                            transition.edge
                        );
                        let _ = events.try_send(BridgeEvent::ButtonEdge {
                            slot: lane.slot,
                            transition,
                        });
                    }
                }
                Ok(None) => {}
                Err(HidError::Lost(reason)) => {
                    warn!("Player {} device lost: {}", lane.slot + 1, reason);
                    lane.states.release_all(&lane.keymap, backend);
                    lane.active = false;
                    let _ = events.try_send(BridgeEvent::LaneLost { slot: lane.slot });
                }
                Err(e) => {
                    warn!("Player {} read error: {}", lane.slot + 1, e);
                    lane.states.release_all(&lane.keymap, backend);
                    lane.active = false;
                    let _ = events.try_send(BridgeEvent::LaneLost { slot: lane.slot });
                }
            }
        }
        std::thread::sleep(options.poll_interval);
    }

    // No-stuck-key invariant: release everything before handles close.
    for lane in lanes.iter_mut() {
        lane.states.release_all(&lane.keymap, backend);
    }
    info!("Translator stopped");
}
