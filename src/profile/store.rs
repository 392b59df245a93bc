//! Profile persistence.
//!
//! The on-disk format is a JSON list ordered by player slot, each element a
//! name-keyed map of learned button rules. Translation refuses to start until
//! this file loads cleanly.

use super::Profile;
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile file not found: {0}")]
    NotFound(PathBuf),

    #[error("profile file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("failed to access profile file: {0}")]
    Io(#[from] std::io::Error),
}

/// Load/save handle for one `profiles.json` path.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full ordered profile list. A missing file is `NotFound`;
    /// unparseable or invalid content is `Corrupt`.
    pub fn load(&self) -> Result<Vec<Profile>, ProfileError> {
        if !self.path.exists() {
            return Err(ProfileError::NotFound(self.path.clone()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let profiles: Vec<Profile> = serde_json::from_str(&content)?;
        info!(
            "Loaded {} profile(s) from {}",
            profiles.len(),
            self.path.display()
        );
        Ok(profiles)
    }

    /// Serialize the full list, index = player slot. Pretty-printed so the
    /// file stays hand-inspectable.
    pub fn save(&self, profiles: &[Profile]) -> Result<(), ProfileError> {
        let json = serde_json::to_string_pretty(profiles)?;
        std::fs::write(&self.path, json)?;
        debug!(
            "Saved {} profile(s) to {}",
            profiles.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Button, ButtonMapping, ProfileBuilder};

    fn test_profile(base_index: usize) -> Profile {
        let mut builder = ProfileBuilder::new();
        for (i, &button) in Button::ALL.iter().enumerate() {
            builder.insert(
                button,
                ButtonMapping {
                    index: base_index + i,
                    idle_value: 128,
                    mask: 1 << (i % 8),
                },
            );
        }
        builder.finish().unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("padbridge-{}-{}.json", name, std::process::id()));
        path
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_path("roundtrip");
        let store = ProfileStore::new(&path);
        let profiles = vec![test_profile(0), test_profile(8)];

        store.save(&profiles).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, profiles);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_not_found() {
        let store = ProfileStore::new(temp_path("missing-nonexistent"));
        assert!(matches!(store.load(), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn garbage_content_is_corrupt() {
        let path = temp_path("garbage");
        std::fs::write(&path, "not json at all {{{").unwrap();

        let store = ProfileStore::new(&path);
        assert!(matches!(store.load(), Err(ProfileError::Corrupt(_))));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn incomplete_profile_is_corrupt() {
        let path = temp_path("incomplete");
        // One button short of the full set.
        std::fs::write(&path, r#"[{"A": {"index": 0, "idle_value": 0, "mask": 1}}]"#).unwrap();

        let store = ProfileStore::new(&path);
        assert!(matches!(store.load(), Err(ProfileError::Corrupt(_))));

        let _ = std::fs::remove_file(&path);
    }
}
