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

//! SpotION core scheduling engine
//!
//! Keeps a rolling two-day cache of quarter-hour electricity prices,
//! computes cost-minimizing run windows and drives on/off device
//! schedules from them. Provider and device integrations plug in
//! through the traits in [`traits`]; everything else runs as ECS
//! resources, components and systems registered by
//! [`plugin::SpotionCorePlugin`].

pub mod async_systems;
pub mod messages;
pub mod optimizer;
pub mod persist;
pub mod plugin;
pub mod price_store;
pub mod resources;
pub mod schedules;
pub mod storage;
pub mod sync;
pub mod traits;

pub use messages::{
    DeviceAssociated, NewPricesAvailable, PeriodChanged, PricesChanged, ScheduleChanged,
};
pub use persist::StateStore;
pub use plugin::SpotionCorePlugin;
pub use price_store::PriceStore;
pub use resources::{
    DeviceSinkRegistry, PriceProviderResource, PriceStoreResource, SchedulerConfig,
    StateStoreResource,
};
pub use sync::PriceSync;
pub use traits::{DeviceSink, PriceProvider, ProviderDayPrices, ProviderError};
