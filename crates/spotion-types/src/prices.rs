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

//! Per-day electricity price tables

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::period::PERIODS_PER_DAY;

#[derive(Debug, Error, PartialEq)]
pub enum PriceTableError {
    #[error("expected {expected} period prices, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("period index {0} out of range")]
    PeriodOutOfRange(usize),
}

/// Electricity prices for one calendar date, one slot per 15-minute period
///
/// A table may be partially filled while prices are still being collected.
/// Consumers that need a value for every period read missing slots as 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPrices {
    /// The date these prices belong to
    pub date: NaiveDate,
    periods: Vec<Option<f32>>,
}

impl DayPrices {
    /// Create a table with no prices filled in
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            periods: vec![None; PERIODS_PER_DAY],
        }
    }

    /// Create a fully populated table from a flat list of 96 prices
    pub fn from_flat(date: NaiveDate, prices: &[f32]) -> Result<Self, PriceTableError> {
        if prices.len() != PERIODS_PER_DAY {
            return Err(PriceTableError::WrongLength {
                expected: PERIODS_PER_DAY,
                actual: prices.len(),
            });
        }
        Ok(Self {
            date,
            periods: prices.iter().map(|p| Some(*p)).collect(),
        })
    }

    /// Price for a period, `None` when not known yet
    pub fn price(&self, period: usize) -> Option<f32> {
        self.periods.get(period).copied().flatten()
    }

    /// Price for a period, defaulting missing slots to 0.0
    pub fn price_or_zero(&self, period: usize) -> f32 {
        self.price(period).unwrap_or(0.0)
    }

    /// Store a price for one period, overwriting any previous value
    pub fn set_price(&mut self, period: usize, price: f32) -> Result<(), PriceTableError> {
        match self.periods.get_mut(period) {
            Some(slot) => {
                *slot = Some(price);
                Ok(())
            }
            None => Err(PriceTableError::PeriodOutOfRange(period)),
        }
    }

    /// Number of periods with a known price
    pub fn period_count(&self) -> usize {
        self.periods.iter().filter(|p| p.is_some()).count()
    }

    /// True when no period has a price yet
    pub fn is_empty(&self) -> bool {
        self.periods.iter().all(|p| p.is_none())
    }

    /// Known prices in ascending period order
    pub fn known_prices(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.periods
            .iter()
            .enumerate()
            .filter_map(|(period, price)| price.map(|p| (period, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_flat_requires_full_day() {
        let short = vec![1.0; 95];
        let result = DayPrices::from_flat(date(2025, 3, 10), &short);
        assert_eq!(
            result.unwrap_err(),
            PriceTableError::WrongLength {
                expected: 96,
                actual: 95
            }
        );

        let full = vec![2.5; 96];
        let table = DayPrices::from_flat(date(2025, 3, 10), &full).unwrap();
        assert_eq!(table.period_count(), 96);
        assert_eq!(table.price(95), Some(2.5));
    }

    #[test]
    fn test_missing_periods_read_as_zero() {
        let mut table = DayPrices::empty(date(2025, 3, 10));
        assert!(table.is_empty());
        assert_eq!(table.price(10), None);
        assert_eq!(table.price_or_zero(10), 0.0);

        table.set_price(10, 4.2).unwrap();
        assert_eq!(table.price(10), Some(4.2));
        assert_eq!(table.period_count(), 1);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_set_price_rejects_out_of_range() {
        let mut table = DayPrices::empty(date(2025, 3, 10));
        assert_eq!(
            table.set_price(96, 1.0).unwrap_err(),
            PriceTableError::PeriodOutOfRange(96)
        );
    }

    #[test]
    fn test_known_prices_ascending() {
        let mut table = DayPrices::empty(date(2025, 3, 10));
        table.set_price(40, 3.0).unwrap();
        table.set_price(4, 1.0).unwrap();
        let known: Vec<_> = table.known_prices().collect();
        assert_eq!(known, vec![(4, 1.0), (40, 3.0)]);
    }
}
