// btleplug Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.
//
// Some portions of this file are taken and/or modified from Rumble
// (https://github.com/mwylde/rumble), using a dual MIT/Apache License under the
// following copyright:
//
// Copyright (c) 2014 The Rust Project Developers

use std::sync::Arc;

use nix::errno::Errno;

use crate::api::{Channel, Config, ControllerInfo, DeviceSelector};
use crate::bluez::device::Device;
use crate::bluez::socket::HciSocketTransport;
use crate::bluez::transport::{HciControl, HciTransport};
use crate::common::logger::{LogFacade, Logger};
use crate::constants::HCI_MAX_DEV;
use crate::{Error, Result};

/// This struct is the interface into the kernel's HCI layer. It lists controllers and claims one
/// for exclusive use.
#[derive(Debug, Clone)]
pub struct Manager<T = HciSocketTransport> {
    transport: T,
    config: Config,
    logger: Arc<dyn Logger>,
}

impl Manager<HciSocketTransport> {
    /// Constructs a manager that talks to the kernel through raw HCI sockets.
    pub fn new() -> Self {
        Manager::with_transport(HciSocketTransport)
    }
}

impl Default for Manager<HciSocketTransport> {
    fn default() -> Self {
        Manager::new()
    }
}

impl<T: HciTransport> Manager<T> {
    pub fn with_transport(transport: T) -> Self {
        Manager {
            transport,
            config: Config::default(),
            logger: Arc::new(LogFacade),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Routes this manager's messages, and those of the devices it opens, to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // The kernel rejects a zero-sized device list request with EINVAL.
    fn max_devices(&self) -> u16 {
        self.config.max_devices.clamp(1, HCI_MAX_DEV)
    }

    /// Returns what the kernel reports about every controller, without claiming any of them.
    pub fn controllers(&self) -> Result<Vec<ControllerInfo>> {
        let control = self.transport.open().map_err(Error::Socket)?;
        let indices = control
            .device_list(self.max_devices())
            .map_err(Error::DeviceList)?;
        indices
            .into_iter()
            .map(|index| {
                control
                    .device_info(index)
                    .map_err(|source| Error::DeviceInfo { index, source })
            })
            .collect()
    }

    /// Opens a raw HCI socket and claims a controller with it.
    ///
    /// With [`DeviceSelector::Index`] exactly that controller is claimed and its error is
    /// returned as is. With [`DeviceSelector::Any`] every controller the kernel lists is tried in
    /// ascending index order and the first one that can be claimed wins; if none can,
    /// [`Error::NoSupportedDevices`] carries the reason each one was rejected.
    pub fn open_controller(
        &self,
        selector: impl Into<DeviceSelector>,
        require_le: bool,
    ) -> Result<Device> {
        let control = self.transport.open().map_err(Error::Socket)?;

        if let DeviceSelector::Index(index) = selector.into() {
            return self.claim_controller(control, index, require_le);
        }

        let mut indices = control
            .device_list(self.max_devices())
            .map_err(Error::DeviceList)?;
        // HCIGETDEVLIST reports the most recently registered controller first.
        indices.sort_unstable();
        self.logger
            .debug(format_args!("got {} devices", indices.len()));

        let mut failures = Vec::with_capacity(indices.len());
        for index in indices {
            match self.claim(&control, index, require_le) {
                Ok(info) => return Ok(self.device(control, info)),
                Err(err) => {
                    self.logger
                        .debug(format_args!("hci{}: skipped: {}", index, err));
                    failures.push((index, err));
                }
            }
        }
        Err(Error::NoSupportedDevices(failures))
    }

    /// Runs the claim sequence for `index` on an already opened control handle, and hands the
    /// bound socket to the returned [`Device`].
    pub fn claim_controller(
        &self,
        control: T::Control,
        index: u16,
        require_le: bool,
    ) -> Result<Device> {
        let info = self.claim(&control, index, require_le)?;
        Ok(self.device(control, info))
    }

    fn device(&self, control: T::Control, info: ControllerInfo) -> Device {
        self.logger.debug(format_args!("dev: {} opened", info.name));
        Device::new(
            control.into_fd(),
            info,
            self.config.poll_timeout,
            self.logger.clone(),
        )
    }

    // Order matters: info, LE check, up (or reset if it already is), down, bind. A controller
    // must be down before the user channel can be bound.
    fn claim(&self, control: &T::Control, index: u16, require_le: bool) -> Result<ControllerInfo> {
        let info = control
            .device_info(index)
            .map_err(|source| Error::DeviceInfo { index, source })?;
        let name = info.name.clone();

        if require_le && !info.supports_le() {
            return Err(Error::LowEnergyUnsupported { index, name });
        }

        self.logger.debug(format_args!("dev: {} up", name));
        match control.up(index) {
            Ok(()) => {}
            Err(Errno::EALREADY) => {
                self.logger.debug(format_args!("dev: {} reset", name));
                control.reset(index).map_err(|source| Error::Reset {
                    index,
                    name: name.clone(),
                    source,
                })?;
            }
            Err(source) => return Err(Error::Up { index, name, source }),
        }

        self.logger.debug(format_args!("dev: {} down", name));
        control.down(index).map_err(|source| Error::Down {
            index,
            name: name.clone(),
            source,
        })?;

        self.bind(control, index, &name)?;
        Ok(info)
    }

    fn bind(&self, control: &T::Control, index: u16, name: &str) -> Result<()> {
        let channel = self.config.channel;
        match control.bind(index, channel) {
            Ok(()) => Ok(()),
            // Kernels before 3.14 have no user channel.
            Err(Errno::EINVAL) if channel == Channel::User => {
                self.logger.warn(format_args!(
                    "dev: {:?} can't bind to hci user channel, err: {}.",
                    name,
                    Errno::EINVAL
                ));
                control
                    .bind(index, Channel::Raw)
                    .map_err(|source| Error::Bind {
                        index,
                        name: name.to_string(),
                        channel: Channel::Raw,
                        source,
                    })
            }
            Err(source) => Err(Error::Bind {
                index,
                name: name.to_string(),
                channel,
                source,
            }),
        }
    }
}
