//! Runtime configuration.
//!
//! Loaded from `configs/default.toml`; every field has a default so a
//! missing file just means stock behavior. Key maps are configuration here,
//! never calibration output: overrides replace the built-in per-slot tables.

use crate::calibrate::CalibrationOptions;
use crate::profile::{Button, KeyMap, KeySym};
use crate::translate::TranslateOptions;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Maximum concurrently translated player slots.
pub const MAX_PLAYERS: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,

    /// Optional per-slot key-map overrides, index = player slot.
    #[serde(default)]
    pub players: Vec<PlayerKeys>,
}

/// Timing and path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Translator loop sleep, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Hands-off delay before calibration samples the idle baseline.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// Number of idle polls during baseline capture.
    #[serde(default = "default_idle_samples")]
    pub idle_samples: usize,

    /// Where the calibrated profile list is persisted.
    #[serde(default = "default_profile_path")]
    pub profile_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_secs: default_settle_delay_secs(),
            idle_samples: default_idle_samples(),
            profile_path: default_profile_path(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    5
}
fn default_settle_delay_secs() -> u64 {
    3
}
fn default_idle_samples() -> usize {
    10
}
fn default_profile_path() -> String {
    "profiles.json".to_string()
}

/// Key-map override for one slot: button name to key symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerKeys(pub BTreeMap<Button, KeySym>);

impl PlayerKeys {
    fn to_keymap(&self) -> KeyMap {
        let mut map = KeyMap::empty();
        for (&button, &key) in &self.0 {
            map.set(button, key);
        }
        map
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!("Config loaded: {:?}", config.settings);
        Ok(config)
    }

    /// Load `configs/default.toml`, falling back to built-in defaults when
    /// the file does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Path::new("configs/default.toml");
        if !path.exists() {
            info!("No config file found, using built-in defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be at least 1".into(),
            ));
        }
        if self.settings.idle_samples == 0 {
            return Err(ConfigError::Invalid(
                "idle_samples must be at least 1".into(),
            ));
        }
        if self.players.len() > MAX_PLAYERS {
            return Err(ConfigError::Invalid(format!(
                "at most {} player key maps are supported",
                MAX_PLAYERS
            )));
        }

        // Two players must never collide on a host key.
        if self.players.len() == MAX_PLAYERS {
            for (button_a, key_a) in &self.players[0].0 {
                for (button_b, key_b) in &self.players[1].0 {
                    if key_a == key_b {
                        return Err(ConfigError::Invalid(format!(
                            "key '{}' is bound to both player 1 {} and player 2 {}",
                            key_a, button_a, button_b
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Effective key map for a slot: override when configured and non-empty,
    /// built-in table otherwise.
    pub fn keymap_for_slot(&self, slot: usize) -> KeyMap {
        match self.players.get(slot) {
            Some(keys) if !keys.0.is_empty() => keys.to_keymap(),
            _ => KeyMap::for_slot(slot),
        }
    }

    pub fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            poll_interval: Duration::from_millis(self.settings.poll_interval_ms),
        }
    }

    pub fn calibration_options(&self) -> CalibrationOptions {
        CalibrationOptions {
            settle_delay: Duration::from_secs(self.settings.settle_delay_secs),
            idle_samples: self.settings.idle_samples,
            ..CalibrationOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn parses_overrides_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [settings]
            poll_interval_ms = 10

            [[players]]
            up = "w"
            A = "enter"
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.poll_interval_ms, 10);
        // Unspecified settings keep their defaults.
        assert_eq!(config.settings.idle_samples, 10);

        let keymap = config.keymap_for_slot(0);
        assert_eq!(keymap.key(Button::Up), Some(KeySym::Character('w')));
        assert_eq!(keymap.key(Button::Down), None);
    }

    #[test]
    fn missing_override_falls_back_to_builtin_table() {
        let config = Config::default();
        assert_eq!(config.keymap_for_slot(0), KeyMap::for_slot(0));
        assert_eq!(config.keymap_for_slot(1), KeyMap::for_slot(1));
    }

    #[test]
    fn colliding_player_keys_are_rejected() {
        let config: Config = toml::from_str(
            r#"
            [[players]]
            A = "v"

            [[players]]
            B = "v"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config: Config = toml::from_str("[settings]\npoll_interval_ms = 0")
            .unwrap();
        assert!(config.validate().is_err());
    }
}
