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

//! The `api` module contains the platform independent types used to select, describe and
//! configure a controller. The Linux implementation lives in [`bluez`](crate::bluez).

use std::fmt::{self, Debug, Display, Formatter};
use std::time::Duration;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_cr as serde;

use crate::constants::*;

/// Which controller [`Manager::open_controller`](crate::bluez::manager::Manager::open_controller)
/// should claim.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceSelector {
    /// Claim the first controller, in the order the kernel reports them, that passes validation.
    #[default]
    Any,
    /// Claim exactly this controller (`hciN`).
    Index(u16),
}

impl From<u16> for DeviceSelector {
    fn from(index: u16) -> Self {
        DeviceSelector::Index(index)
    }
}

impl From<Option<u16>> for DeviceSelector {
    fn from(index: Option<u16>) -> Self {
        index.map_or(DeviceSelector::Any, DeviceSelector::Index)
    }
}

/// The HCI socket channel a claimed controller is bound to.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    /// Exclusive access, available since Linux 3.14. The kernel stops driving the controller
    /// while the socket is bound.
    #[default]
    User,
    /// Shared legacy access.
    Raw,
}

impl Channel {
    pub fn num(&self) -> u16 {
        match *self {
            Channel::User => HCI_CHANNEL_USER,
            Channel::Raw => HCI_CHANNEL_RAW,
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Channel::User => f.write_str("user"),
            Channel::Raw => f.write_str("raw"),
        }
    }
}

/// Tunables for the [`Manager`](crate::bluez::manager::Manager) and the devices it opens.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr", default)
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long a single [`Device::read`](crate::bluez::device::Device::read) waits for the
    /// socket to become readable before returning zero bytes.
    pub poll_timeout: Duration,
    /// Upper bound on the number of controllers requested from the kernel, clamped to `1..=16`.
    pub max_devices: u16,
    /// The preferred channel. `Channel::User` falls back to `Channel::Raw` on kernels that lack
    /// the user channel; `Channel::Raw` never falls back.
    pub channel: Channel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            max_devices: HCI_MAX_DEV,
            channel: Channel::User,
        }
    }
}

/// Stores the 6 byte address of a controller, most significant byte first.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Default)]
pub struct BDAddr {
    address: [u8; 6],
}

impl BDAddr {
    /// Builds an address from the little endian layout the kernel uses in `bdaddr_t`.
    pub fn from_le_bytes(mut bytes: [u8; 6]) -> Self {
        bytes.reverse();
        BDAddr { address: bytes }
    }

    pub fn into_inner(self) -> [u8; 6] {
        self.address
    }
}

impl From<[u8; 6]> for BDAddr {
    fn from(address: [u8; 6]) -> Self {
        BDAddr { address }
    }
}

impl Display for BDAddr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let a = &self.address;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

impl Debug for BDAddr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerType {
    BrEdr,
    Amp,
    Unknown(u8),
}

impl ControllerType {
    /// Decodes the bus/type byte of `hci_dev_info`; the controller type lives in bits 4-5.
    pub fn parse(typ: u8) -> ControllerType {
        match (typ & 0x30) >> 4 {
            0 => ControllerType::BrEdr,
            1 => ControllerType::Amp,
            x => ControllerType::Unknown(x),
        }
    }

    pub fn num(&self) -> u8 {
        match *self {
            ControllerType::BrEdr => 0,
            ControllerType::Amp => 1,
            ControllerType::Unknown(x) => x,
        }
    }
}

bitflags! {
    /// Device flags as reported in `hci_dev_info.flags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControllerFlags: u32 {
        const UP = 1 << 0;
        const INIT = 1 << 1;
        const RUNNING = 1 << 2;
        const PSCAN = 1 << 3;
        const ISCAN = 1 << 4;
        const AUTH = 1 << 5;
        const ENCRYPT = 1 << 6;
        const INQUIRY = 1 << 7;
        const RAW = 1 << 8;
    }
}

/// A snapshot of what the kernel reports about a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerInfo {
    /// The device id of the controller (`hciN`).
    pub index: u16,
    /// The name of the controller, e.g. `hci0`.
    pub name: String,
    /// The public address of the controller.
    pub address: BDAddr,
    pub typ: ControllerType,
    pub flags: ControllerFlags,
    /// The LMP feature mask, page 0.
    pub features: [u8; 8],
    pub acl_mtu: u16,
    pub acl_pkts: u16,
    pub sco_mtu: u16,
    pub sco_pkts: u16,
}

impl ControllerInfo {
    /// A zeroed snapshot carrying only an index and a name.
    pub fn new(index: u16, name: impl Into<String>) -> Self {
        ControllerInfo {
            index,
            name: name.into(),
            address: BDAddr::default(),
            typ: ControllerType::BrEdr,
            flags: ControllerFlags::empty(),
            features: [0u8; 8],
            acl_mtu: 0,
            acl_pkts: 0,
            sco_mtu: 0,
            sco_pkts: 0,
        }
    }

    pub fn supports_le(&self) -> bool {
        self.features[LMP_LE_OCTET] & LMP_LE != 0
    }

    pub fn is_up(&self) -> bool {
        self.flags.contains(ControllerFlags::UP)
    }
}
