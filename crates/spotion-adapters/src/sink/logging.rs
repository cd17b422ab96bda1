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

//! Logging device sink
//!
//! Stands in for real device plumbing: every run command lands in the
//! log instead of on a relay. Schedules repeat their current command on
//! each tick, so transitions log at info and repeats at trace to keep
//! the log readable.

use parking_lot::Mutex;
use tracing::{info, trace};

use spotion_core::traits::DeviceSink;

pub struct LoggingDeviceSink {
    name: String,
    last_command: Mutex<Option<bool>>,
}

impl LoggingDeviceSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_command: Mutex::new(None),
        }
    }
}

impl DeviceSink for LoggingDeviceSink {
    fn set_auto_run(&self, on: bool) {
        let mut last = self.last_command.lock();
        if *last == Some(on) {
            trace!("🔌 [DEVICE] {} auto_run still {}", self.name, on);
            return;
        }
        let state = if on { "ON" } else { "OFF" };
        info!("🔌 [DEVICE] {} auto_run -> {}", self.name, state);
        *last = Some(on);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_reports_its_name() {
        let sink = LoggingDeviceSink::new("boiler");
        assert_eq!(sink.name(), "boiler");
    }

    #[test]
    fn test_repeated_commands_are_absorbed() {
        let sink = LoggingDeviceSink::new("boiler");
        sink.set_auto_run(true);
        sink.set_auto_run(true);
        assert_eq!(*sink.last_command.lock(), Some(true));

        sink.set_auto_run(false);
        assert_eq!(*sink.last_command.lock(), Some(false));
    }
}
