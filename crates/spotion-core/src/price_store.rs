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

//! Two-day price cache
//!
//! One cached file per date, one `period:price` line per quarter-hour
//! period. Writes merge: a period already present keeps its first value.
//! The cache never holds more than today, tomorrow and the day after.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use spotion_types::{DayPrices, PERIODS_PER_DAY};
use tracing::{debug, error, warn};

use crate::storage::PriceStorage;

/// Price table cache over a storage backend
#[derive(Clone)]
pub struct PriceStore {
    storage: Arc<dyn PriceStorage>,
}

fn parse_line(line: &str) -> Option<(usize, f32)> {
    let (period, price) = line.split_once(':')?;
    let period: usize = period.trim().parse().ok()?;
    let price: f32 = price.trim().parse().ok()?;
    (period < PERIODS_PER_DAY).then_some((period, price))
}

/// Entries in file line order, `None` when any line is malformed
fn parse_entries(content: &str) -> Option<Vec<(usize, f32)>> {
    let mut entries = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        entries.push(parse_line(line)?);
    }
    Some(entries)
}

impl PriceStore {
    pub fn new(storage: Arc<dyn PriceStorage>) -> Self {
        Self { storage }
    }

    /// Price table for a date
    ///
    /// Absent and unparseable files both come back as an empty table; a
    /// malformed file is left on disk for inspection.
    pub fn read(&self, date: NaiveDate) -> DayPrices {
        let content = match self.storage.read(date) {
            Ok(Some(content)) => content,
            Ok(None) => return DayPrices::empty(date),
            Err(e) => {
                warn!("⚠️ Failed to read price file for {}: {}", date, e);
                return DayPrices::empty(date);
            }
        };
        match parse_entries(&content) {
            Some(entries) => {
                let mut table = DayPrices::empty(date);
                for (period, price) in entries {
                    let _ = table.set_price(period, price);
                }
                table
            }
            None => {
                error!("❌ Price file for {} is not valid", date);
                DayPrices::empty(date)
            }
        }
    }

    /// Tables for a date and the day after it
    pub fn read_today_tomorrow(&self, today: NaiveDate) -> (DayPrices, DayPrices) {
        let tomorrow = match today.succ_opt() {
            Some(date) => self.read(date),
            None => DayPrices::empty(today),
        };
        (self.read(today), tomorrow)
    }

    /// Merge period prices into a date's file
    ///
    /// Periods the file already holds are skipped, so the first stored
    /// value for a period wins. A corrupt file is dropped and started
    /// over. Failures are logged and the write is skipped.
    pub fn write(&self, date: NaiveDate, entries: &[(usize, f32)]) {
        let mut present: HashSet<usize> = match self.storage.read(date) {
            Ok(Some(content)) => match parse_entries(&content) {
                Some(existing) => existing.iter().map(|(period, _)| *period).collect(),
                None => {
                    warn!("⚠️ Dropping corrupt price file for {} before write", date);
                    if let Err(e) = self.storage.delete(date) {
                        error!("❌ Failed to remove corrupt price file for {}: {}", date, e);
                        return;
                    }
                    HashSet::new()
                }
            },
            Ok(None) => HashSet::new(),
            Err(e) => {
                warn!("⚠️ Failed to read price file for {}: {}", date, e);
                return;
            }
        };

        let mut chunk = String::new();
        for (period, price) in entries {
            if *period >= PERIODS_PER_DAY || !present.insert(*period) {
                continue;
            }
            chunk.push_str(&format!("{period}:{price}\n"));
        }
        if chunk.is_empty() {
            return;
        }
        if let Err(e) = self.storage.append(date, &chunk) {
            error!("❌ No folder to write price list for {}: {}", date, e);
        }
    }

    /// Check a date's file for structural validity
    ///
    /// Entries must run 0, 1, 2, ... in line order with no gaps and at
    /// most `max_periods` of them. Returns the entry count, 0 for an
    /// absent file, or -1 after deleting a corrupt one.
    pub fn validate(&self, date: NaiveDate, max_periods: usize) -> i32 {
        let content = match self.storage.read(date) {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!("No price file yet for {}", date);
                return 0;
            }
            Err(e) => {
                warn!("⚠️ Failed to read price file for {}: {}", date, e);
                return 0;
            }
        };

        let count = parse_entries(&content).and_then(|entries| {
            for (expected, (period, _)) in entries.iter().enumerate() {
                if *period != expected {
                    return None;
                }
            }
            (entries.len() <= max_periods).then_some(entries.len())
        });

        match count {
            Some(count) => count as i32,
            None => {
                error!("❌ Price file for {} is corrupt, removing it", date);
                if let Err(e) = self.storage.delete(date) {
                    error!("❌ Failed to remove corrupt price file for {}: {}", date, e);
                }
                -1
            }
        }
    }

    /// Drop every cached day outside today, tomorrow and the day after
    pub fn prune(&self, today: NaiveDate) {
        let mut keep = vec![today];
        if let Some(tomorrow) = today.succ_opt() {
            keep.push(tomorrow);
            if let Some(day_after) = tomorrow.succ_opt() {
                keep.push(day_after);
            }
        }
        if let Err(e) = self.storage.retain(&keep) {
            warn!("⚠️ Failed to prune old price files: {}", e);
        }
    }
}
