// btleplug Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! The log sink handed to a [`Manager`](crate::bluez::manager::Manager) and shared with every
//! [`Device`](crate::bluez::device::Device) it opens.
//!
//! By default everything goes to the [`log`] facade, so whatever logger the application installs
//! (`env_logger`, `pretty_env_logger`, ...) sees it. A custom sink can be injected with
//! [`Manager::with_logger`](crate::bluez::manager::Manager::with_logger) to route one manager's
//! messages somewhere else.

use std::fmt::{self, Debug};

use log::Level;

pub const LOG_TARGET: &str = "btleplug_hci";

pub trait Logger: Debug + Send + Sync {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args)
    }
}

/// Forwards to the global [`log`] facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log!(target: LOG_TARGET, level, "{}", args);
    }
}
