//! Control surface for calibration and translation.
//!
//! A [`Bridge`] owns the keyboard backend, the configuration, and at most
//! one worker thread at a time: either the calibration run or the translator
//! loop. `stop()` is idempotent and joins the worker, which guarantees every
//! held key has been released by the time it returns.

use crate::backend::KeyboardBackend;
use crate::calibrate::{calibrate, CalibrationError};
use crate::cancel::CancelToken;
use crate::config::{Config, MAX_PLAYERS};
use crate::hid::{detect_controllers, HidError, HidSession, REPORT_LEN};
use crate::profile::{Button, ButtonMapping, Profile, ProfileError, ProfileStore};
use crate::translate::{run_translation, PlayerLane, Transition};
use crossbeam_channel::{bounded, Receiver, Sender};
use hidapi::HidApi;
use log::{error, info, warn};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Progress and lifecycle notifications for a console or GUI front end.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// Calibration wants this button pressed and held.
    CalibrationPrompt { slot: usize, button: Button },
    /// A rule was learned for this button.
    CalibrationMapped {
        slot: usize,
        button: Button,
        mapping: ButtonMapping,
    },
    /// One player's profile is complete.
    CalibrationPlayerDone { slot: usize },
    /// All profiles were written to disk.
    CalibrationSaved { players: usize },
    /// The translator loop is up.
    TranslationStarted { lanes: usize },
    /// A button changed state during translation.
    ButtonEdge { slot: usize, transition: Transition },
    /// A player's device stopped responding; that lane is frozen.
    LaneLost { slot: usize },
    /// The active worker has exited.
    Stopped,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("a calibration or translation worker is already running")]
    Busy,

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Hid(#[from] HidError),

    #[error("no controller could be opened")]
    NoDevices,

    #[error("failed to spawn worker thread: {0}")]
    Thread(std::io::Error),
}

/// Owns the worker lifecycle behind `start_calibration` / `start_translation`
/// / `stop`.
pub struct Bridge<K>
where
    K: KeyboardBackend + Clone + Send + 'static,
{
    config: Config,
    keyboard: K,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
    event_tx: Sender<BridgeEvent>,
    event_rx: Receiver<BridgeEvent>,
}

impl<K> Bridge<K>
where
    K: KeyboardBackend + Clone + Send + 'static,
{
    pub fn new(config: Config, keyboard: K) -> Self {
        let (event_tx, event_rx) = bounded(256);
        Self {
            config,
            keyboard,
            cancel: CancelToken::new(),
            worker: None,
            event_tx,
            event_rx,
        }
    }

    /// Receiver for [`BridgeEvent`]s; clone it into whatever front end is
    /// listening.
    pub fn events(&self) -> Receiver<BridgeEvent> {
        self.event_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Handle to cancel the active worker from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Discover controllers and calibrate up to `player_count` of them in
    /// slot order, then persist the profile list.
    ///
    /// Per-player failures (open failure, no idle signal) skip that player
    /// and continue; cancellation discards everything unsaved.
    pub fn start_calibration(&mut self, player_count: usize) -> Result<(), BridgeError> {
        self.ensure_idle()?;
        self.cancel.reset();

        let store = ProfileStore::new(self.config.settings.profile_path.clone());
        let options = self.config.calibration_options();
        let cancel = self.cancel.clone();
        let events = self.event_tx.clone();
        let count = player_count.clamp(1, MAX_PLAYERS);

        let handle = thread::Builder::new()
            .name("calibrator".to_string())
            .spawn(move || {
                run_calibration_worker(count, store, options, cancel, events);
            })
            .map_err(BridgeError::Thread)?;
        self.worker = Some(handle);
        Ok(())
    }

    /// Load profiles, open one device session per slot, and start the
    /// translator loop on a worker thread.
    ///
    /// Refuses before touching any device when the profile file is missing
    /// or corrupt; a device that fails to open only loses its own lane.
    pub fn start_translation(&mut self) -> Result<(), BridgeError> {
        self.ensure_idle()?;

        let store = ProfileStore::new(self.config.settings.profile_path.clone());
        let profiles = store.load()?;

        let api = HidApi::new().map_err(HidError::Init)?;
        let controllers = detect_controllers(&api);
        let limit = controllers.len().min(profiles.len()).min(MAX_PLAYERS);

        let mut lanes = Vec::new();
        for (slot, (controller, profile)) in
            controllers.iter().zip(profiles.into_iter()).take(limit).enumerate()
        {
            if profile.max_index() >= REPORT_LEN {
                warn!(
                    "Player {} profile references byte {} beyond the report size; \
                     those buttons will never decode",
                    slot + 1,
                    profile.max_index()
                );
            }
            match HidSession::open(&api, &controller.path, &controller.name) {
                Ok(session) => {
                    info!("Player {} ready: {}", slot + 1, controller.name);
                    lanes.push(PlayerLane::new(
                        slot,
                        session,
                        profile,
                        self.config.keymap_for_slot(slot),
                    ));
                }
                Err(e) => {
                    warn!("Player {} unavailable: {}", slot + 1, e);
                    let _ = self.event_tx.try_send(BridgeEvent::LaneLost { slot });
                }
            }
        }
        if lanes.is_empty() {
            return Err(BridgeError::NoDevices);
        }

        self.cancel.reset();
        let backend = self.keyboard.clone();
        let options = self.config.translate_options();
        let cancel = self.cancel.clone();
        let events = self.event_tx.clone();
        let lane_count = lanes.len();

        let handle = thread::Builder::new()
            .name("translator".to_string())
            .spawn(move || {
                let _ = events.try_send(BridgeEvent::TranslationStarted { lanes: lane_count });
                run_translation(&mut lanes, &backend, &options, &cancel, &events);
                let _ = events.try_send(BridgeEvent::Stopped);
            })
            .map_err(BridgeError::Thread)?;
        self.worker = Some(handle);
        Ok(())
    }

    /// Cancel the active worker, if any, and wait for it to finish.
    /// Idempotent; a no-op when nothing is running.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Worker thread panicked during shutdown");
            }
        }
    }

    fn ensure_idle(&mut self) -> Result<(), BridgeError> {
        if self.is_running() {
            return Err(BridgeError::Busy);
        }
        // Reap a finished worker so the handle does not linger.
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl<K> Drop for Bridge<K>
where
    K: KeyboardBackend + Clone + Send + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

/// Calibration worker body: discovery, per-player calibration, persistence.
fn run_calibration_worker(
    player_count: usize,
    store: ProfileStore,
    options: crate::calibrate::CalibrationOptions,
    cancel: CancelToken,
    events: Sender<BridgeEvent>,
) {
    let api = match HidApi::new() {
        Ok(api) => api,
        Err(e) => {
            error!("HID backend unavailable: {}", e);
            let _ = events.try_send(BridgeEvent::Stopped);
            return;
        }
    };

    let controllers = detect_controllers(&api);
    if controllers.is_empty() {
        warn!("No controllers found; connect them and try again");
        let _ = events.try_send(BridgeEvent::Stopped);
        return;
    }

    let mut profiles: Vec<Profile> = Vec::new();
    for (slot, controller) in controllers.iter().take(player_count).enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        info!("Setting up player {}: {}", slot + 1, controller.name);

        let mut session = match HidSession::open(&api, &controller.path, &controller.name) {
            Ok(session) => session,
            Err(e) => {
                warn!("Skipping player {}: {}", slot + 1, e);
                continue;
            }
        };

        match calibrate(&mut session, slot, &options, &cancel, &events) {
            Ok(Some(profile)) => {
                let _ = events.try_send(BridgeEvent::CalibrationPlayerDone { slot });
                profiles.push(profile);
            }
            Ok(None) => break, // cancelled; nothing is saved
            Err(CalibrationError::NoIdleSignal) => {
                warn!("Player {}: no idle signal, skipping", slot + 1);
            }
            Err(e) => {
                warn!("Player {} calibration failed: {}", slot + 1, e);
            }
        }
    }

    if !cancel.is_cancelled() && !profiles.is_empty() {
        match store.save(&profiles) {
            Ok(()) => {
                info!(
                    "Calibration finished; {} profile(s) saved to {}",
                    profiles.len(),
                    store.path().display()
                );
                let _ = events.try_send(BridgeEvent::CalibrationSaved {
                    players: profiles.len(),
                });
            }
            Err(e) => error!("Failed to save profiles: {}", e),
        }
    } else {
        info!("Calibration stopped; profiles not saved");
    }
    let _ = events.try_send(BridgeEvent::Stopped);
}
