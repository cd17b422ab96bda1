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

//! Integration traits
//!
//! The engine talks to the outside world through two seams: a price
//! provider that serves day-ahead prices, and device sinks that receive
//! on/off run commands. Concrete implementations live in the adapters
//! crate; tests substitute their own.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has not published the requested day yet
    #[error("prices not published yet")]
    NotYetPublished,
    /// The provider answered with a payload we could not use
    #[error("malformed provider payload: {0}")]
    Malformed(String),
    /// Transport or protocol failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One nominal provider day of quarter-hour prices
///
/// The provider day starts one hour after local midnight, so the 96
/// prices here straddle two local dates: the first 92 belong to the
/// nominal date, the last 4 to the day after.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDayPrices {
    /// Nominal date the provider published these prices for
    pub date: NaiveDate,
    /// Exactly 96 prices in provider period order
    pub prices: Vec<f32>,
}

/// Source of day-ahead electricity prices
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch the next nominal day of prices
    ///
    /// Returns [`ProviderError::NotYetPublished`] when the provider has
    /// not released the day yet; callers retry later.
    async fn fetch_day_ahead(&self) -> Result<ProviderDayPrices, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Receiver of on/off run commands from a schedule
///
/// Schedules repeat the current command every tick, so implementations
/// must be idempotent and must not block the caller.
pub trait DeviceSink: Send + Sync {
    /// Apply an on/off run command
    fn set_auto_run(&self, on: bool);

    /// Name used for association bookkeeping and logs
    fn name(&self) -> &str;
}
