// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SpotION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Schedule state persistence
//!
//! Every schedule saves its state under its own name as a small JSON
//! file, so settings and masks survive restarts. Writes go through a
//! temp file and rename to never leave a half-written state behind.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

/// Per-name JSON state files in one directory
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.st.json"))
    }

    /// Save a state snapshot under a schedule name
    pub fn save<T: Serialize>(&self, name: &str, state: &T) -> Result<()> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {parent:?}"))?;
        }

        let json = serde_json::to_string_pretty(state)
            .with_context(|| format!("Failed to serialize state for {name}"))?;

        // Write to a temp file first, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write state file: {temp_path:?}"))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to move state file into place: {path:?}"))?;
        Ok(())
    }

    /// Load a previously saved snapshot, `None` when absent or unreadable
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path_for(name);
        if !path.exists() {
            info!("ℹ️ No saved state for {}, starting fresh", name);
            return None;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("⚠️ Failed to read state file for {}: {}", name, e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("⚠️ Saved state for {} is not valid, ignoring it: {}", name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct DemoState {
        enabled: bool,
        limit: f32,
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let state = DemoState {
            enabled: true,
            limit: 2.5,
        };
        store.save("boiler", &state).unwrap();

        let loaded: DemoState = store.load("boiler").unwrap();
        assert_eq!(loaded, state);
        assert!(dir.path().join("boiler.st.json").exists());
    }

    #[test]
    fn test_load_missing_state_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert_eq!(store.load::<DemoState>("nobody"), None);
    }

    #[test]
    fn test_load_ignores_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        fs::write(dir.path().join("boiler.st.json"), "{ not json").unwrap();
        assert_eq!(store.load::<DemoState>("boiler"), None);
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state").join("deep");
        let store = StateStore::new(&nested);

        store
            .save("boiler", &DemoState { enabled: false, limit: 0.0 })
            .unwrap();
        assert!(nested.join("boiler.st.json").exists());
    }
}
