// btleplug Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! The device-control operations the claim sequence depends on.
//!
//! Errors are reported as raw [`Errno`](nix::errno::Errno) values: the manager treats
//! `EALREADY` from [`HciControl::up`] and `EINVAL` from [`HciControl::bind`] specially, and
//! wraps everything else with the controller's index and name.

use std::fmt::Debug;
use std::os::unix::io::OwnedFd;

use crate::api::{Channel, ControllerInfo};

/// A control handle on one socket. A successful [`bind`](HciControl::bind) turns the socket into
/// the I/O endpoint returned by [`into_fd`](HciControl::into_fd).
pub trait HciControl {
    /// Lists the ids of up to `max` controllers, in the order the kernel reports them.
    fn device_list(&self, max: u16) -> nix::Result<Vec<u16>>;

    fn device_info(&self, index: u16) -> nix::Result<ControllerInfo>;

    /// Brings the controller up. Fails with `EALREADY` if it already is.
    fn up(&self, index: u16) -> nix::Result<()>;

    fn down(&self, index: u16) -> nix::Result<()>;

    fn reset(&self, index: u16) -> nix::Result<()>;

    /// Binds the socket to `channel` on the controller. Kernels older than 3.14 reject
    /// [`Channel::User`] with `EINVAL`.
    fn bind(&self, index: u16, channel: Channel) -> nix::Result<()>;

    fn into_fd(self) -> OwnedFd
    where
        Self: Sized;
}

/// Opens control handles.
pub trait HciTransport: Debug + Send + Sync {
    type Control: HciControl;

    fn open(&self) -> nix::Result<Self::Control>;
}
