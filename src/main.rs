//! Padbridge - Unbranded USB Gamepad to Keyboard Bridge
//!
//! `padbridge calibrate [players]` learns a profile per controller;
//! `padbridge run` (the default) translates controller input into keyboard
//! events using the saved profiles.

use anyhow::{bail, Result};
use padbridge::bridge::{Bridge, BridgeEvent};
use padbridge::config::Config;

#[cfg(windows)]
use padbridge::backend::KeyboardSendInputBackend;
#[cfg(not(windows))]
use padbridge::backend::MockKeyboardBackend;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map(String::as_str).unwrap_or("run");

    let config = Config::load_default()?;

    #[cfg(windows)]
    let keyboard = KeyboardSendInputBackend::new();
    #[cfg(not(windows))]
    let keyboard = MockKeyboardBackend::new();

    let mut bridge = Bridge::new(config, keyboard);
    let events = bridge.events();

    match mode {
        "calibrate" => {
            let players: usize = match args.get(1) {
                Some(n) => n.parse()?,
                None => 1,
            };
            println!("=======================================");
            println!("   Universal Multiplayer Calibration   ");
            println!("=======================================");
            bridge.start_calibration(players)?;
        }
        "run" => {
            println!("Starting translator... (Ctrl+C to stop)");
            bridge.start_translation()?;
        }
        other => bail!("unknown mode '{}'; expected 'calibrate' or 'run'", other),
    }

    // Drain worker events to the console until the worker exits.
    for event in events.iter() {
        match event {
            BridgeEvent::CalibrationPrompt { slot, button } => {
                println!("[PLAYER {}] PRESS AND HOLD: [{}]", slot + 1, button);
            }
            BridgeEvent::CalibrationMapped { button, .. } => {
                println!("[{}] mapped successfully! Release the button.", button);
            }
            BridgeEvent::CalibrationPlayerDone { slot } => {
                println!("Player {} calibrated!", slot + 1);
            }
            BridgeEvent::CalibrationSaved { players } => {
                println!("{} profile(s) saved. You can now start the translator.", players);
            }
            BridgeEvent::TranslationStarted { lanes } => {
                println!("Running with {} player(s)...", lanes);
            }
            BridgeEvent::ButtonEdge { slot, transition } => {
                println!(
                    "[P{}] {} {:?}",
                    slot + 1,
                    transition.button,
                    transition.edge
                );
            }
            BridgeEvent::LaneLost { slot } => {
                println!("Player {} controller lost; its input is frozen.", slot + 1);
            }
            BridgeEvent::Stopped => break,
        }

        if !bridge.is_running() && events.is_empty() {
            break;
        }
    }

    bridge.stop();
    Ok(())
}
