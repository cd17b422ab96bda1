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

//! Concrete integrations for the SpotION engine
//!
//! The core crate talks to the outside world through the `PriceProvider`
//! and `DeviceSink` traits; this crate supplies the production
//! implementations: an HTTP day-ahead price client and a logging device
//! sink.

pub mod provider;
pub mod sink;

pub use provider::HttpPriceProvider;
pub use sink::LoggingDeviceSink;
