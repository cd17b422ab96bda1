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

//! Price cache storage backends
//!
//! The price store works against a raw per-date content interface so the
//! file layout stays in one place and tests can run fully in memory.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Extension used by cached price files
pub const PRICE_FILE_EXTENSION: &str = "prc";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("price storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Backend holding raw price file content keyed by date
pub trait PriceStorage: Send + Sync {
    /// Stored content for a date, `None` when the day has no file
    fn read(&self, date: NaiveDate) -> Result<Option<String>, StorageError>;

    /// Append content to the date's file, creating the file when absent
    fn append(&self, date: NaiveDate, content: &str) -> Result<(), StorageError>;

    /// Remove the date's file; removing an absent file is not an error
    fn delete(&self, date: NaiveDate) -> Result<(), StorageError>;

    /// Drop every stored day that is not in `keep`
    fn retain(&self, keep: &[NaiveDate]) -> Result<(), StorageError>;
}

/// Price files on disk, one `YYYY_MM_DD.prc` file per date
///
/// The directory must exist; writes into a missing directory fail and the
/// caller decides how to recover.
pub struct FsPriceStorage {
    dir: PathBuf,
}

impl FsPriceStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(file_name(date))
    }
}

fn file_name(date: NaiveDate) -> String {
    format!(
        "{:04}_{:02}_{:02}.{}",
        date.year(),
        date.month(),
        date.day(),
        PRICE_FILE_EXTENSION
    )
}

impl PriceStorage for FsPriceStorage {
    fn read(&self, date: NaiveDate) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(date)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn append(&self, date: NaiveDate, content: &str) -> Result<(), StorageError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(date))?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn delete(&self, date: NaiveDate) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(date)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn retain(&self, keep: &[NaiveDate]) -> Result<(), StorageError> {
        let keep_names: Vec<String> = keep.iter().map(|d| file_name(*d)).collect();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_price_file = name.ends_with(&format!(".{PRICE_FILE_EXTENSION}"));
            if is_price_file && !keep_names.iter().any(|k| k == &name) {
                debug!("🗑️ Removing stale price file {}", name);
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// In-memory backend for tests and dry runs
#[derive(Default)]
pub struct MemoryPriceStorage {
    days: Mutex<HashMap<NaiveDate, String>>,
}

impl MemoryPriceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dates currently holding content, in no particular order
    pub fn stored_dates(&self) -> Vec<NaiveDate> {
        self.days.lock().keys().copied().collect()
    }
}

impl PriceStorage for MemoryPriceStorage {
    fn read(&self, date: NaiveDate) -> Result<Option<String>, StorageError> {
        Ok(self.days.lock().get(&date).cloned())
    }

    fn append(&self, date: NaiveDate, content: &str) -> Result<(), StorageError> {
        self.days.lock().entry(date).or_default().push_str(content);
        Ok(())
    }

    fn delete(&self, date: NaiveDate) -> Result<(), StorageError> {
        self.days.lock().remove(&date);
        Ok(())
    }

    fn retain(&self, keep: &[NaiveDate]) -> Result<(), StorageError> {
        self.days.lock().retain(|date, _| keep.contains(date));
        Ok(())
    }
}
