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

//! btleplug-hci acquires a local Bluetooth controller through the Linux raw HCI socket interface
//! and exposes it as a serialized, poll-driven byte stream.
//!
//! The entry point is the [`Manager`](bluez::manager::Manager), which enumerates controllers,
//! validates them (optionally requiring Low Energy support) and claims one by driving it through
//! the up / reset / down / bind sequence. The result is a [`Device`](bluez::device::Device) that
//! upper protocol layers (HCI, L2CAP, ATT) read from and write to. [`BytePool`](common::pool::BytePool)
//! recycles fixed-width packet buffers for those layers.
//!
//! # Usage
//!
//! ```no_run
//! use btleplug_hci::api::DeviceSelector;
//! use btleplug_hci::platform::Manager;
//!
//! # fn main() -> btleplug_hci::Result<()> {
//! let manager = Manager::new();
//! let device = manager.open_controller(DeviceSelector::Any, true)?;
//! println!("claimed {} (hci{})", device.name(), device.index());
//!
//! let mut buf = [0u8; 1024];
//! let n = device.read(&mut buf)?;
//! println!("read {} bytes", n);
//! device.close()?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

use std::fmt::Write as _;
use std::io;

use nix::errno::Errno;

pub mod api;
pub mod bluez;
pub mod common;
mod constants;
pub mod platform;

pub use crate::api::Channel;

/// The main error type returned by most methods in btleplug-hci.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not create AF_BLUETOOTH raw socket: {0}")]
    Socket(#[source] Errno),

    #[error("could not list HCI devices: {0}")]
    DeviceList(#[source] Errno),

    #[error("hci{index}: could not get device info: {source}")]
    DeviceInfo { index: u16, source: Errno },

    #[error("hci{index}: dev {name:?} does not support LE")]
    LowEnergyUnsupported { index: u16, name: String },

    #[error("hci{index}: dev {name:?} could not be brought up: {source}")]
    Up {
        index: u16,
        name: String,
        source: Errno,
    },

    #[error("hci{index}: dev {name:?} could not be reset: {source}")]
    Reset {
        index: u16,
        name: String,
        source: Errno,
    },

    #[error("hci{index}: dev {name:?} could not be brought down: {source}")]
    Down {
        index: u16,
        name: String,
        source: Errno,
    },

    #[error("hci{index}: dev {name:?} can't bind to hci {channel} channel: {source}")]
    Bind {
        index: u16,
        name: String,
        channel: Channel,
        source: Errno,
    },

    #[error("no supported devices available: {}", format_failures(.0))]
    NoSupportedDevices(Vec<(u16, Error)>),

    #[error("poll failed: {0}")]
    Poll(#[source] Errno),

    #[error("read failed: {0}")]
    Read(#[source] Errno),

    #[error("write failed: {0}")]
    Write(#[source] Errno),

    #[error("close failed: {0}")]
    Close(#[source] Errno),

    #[error("device is closed")]
    Closed,
}

impl Error {
    /// The errno reported by the kernel, if this error came from a system call.
    pub fn errno(&self) -> Option<Errno> {
        match *self {
            Error::Socket(e)
            | Error::DeviceList(e)
            | Error::Poll(e)
            | Error::Read(e)
            | Error::Write(e)
            | Error::Close(e) => Some(e),
            Error::DeviceInfo { source, .. }
            | Error::Up { source, .. }
            | Error::Reset { source, .. }
            | Error::Down { source, .. }
            | Error::Bind { source, .. } => Some(source),
            Error::LowEnergyUnsupported { .. } | Error::NoSupportedDevices(_) | Error::Closed => {
                None
            }
        }
    }
}

fn format_failures(failures: &[(u16, Error)]) -> String {
    if failures.is_empty() {
        return "no controllers found".to_string();
    }
    let mut out = String::new();
    for (i, (index, err)) in failures.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "error {}: {}", index, err);
    }
    out
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err.errno() {
            Some(errno) => io::Error::from_raw_os_error(errno as i32),
            None => match err {
                Error::Closed => io::Error::new(io::ErrorKind::NotConnected, err),
                _ => io::Error::new(io::ErrorKind::Other, err),
            },
        }
    }
}

/// Convenience type for a result using the btleplug-hci [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_error_lists_every_candidate() {
        let err = Error::NoSupportedDevices(vec![
            (
                0,
                Error::LowEnergyUnsupported {
                    index: 0,
                    name: "hci0".into(),
                },
            ),
            (
                1,
                Error::DeviceInfo {
                    index: 1,
                    source: Errno::ENODEV,
                },
            ),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("no supported devices available: "));
        assert!(msg.contains("error 0: hci0: dev \"hci0\" does not support LE"));
        assert!(msg.contains("error 1: hci1: could not get device info"));
    }

    #[test]
    fn empty_aggregate_error() {
        let err = Error::NoSupportedDevices(vec![]);
        assert_eq!(
            err.to_string(),
            "no supported devices available: no controllers found"
        );
    }

    #[test]
    fn io_error_keeps_errno() {
        let err: io::Error = Error::Read(Errno::EIO).into();
        assert_eq!(err.raw_os_error(), Some(Errno::EIO as i32));

        let err: io::Error = Error::Closed.into();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
