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

//! The kernel side of the device-control transport: a raw `BTPROTO_HCI` socket driven through
//! the `HCI*` ioctls and `bind(2)`.

use std::mem;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::sys::ioctl::ioctl_param_type;

use crate::api::{BDAddr, Channel, ControllerFlags, ControllerInfo, ControllerType};
use crate::bluez::ioctl;
use crate::bluez::transport::{HciControl, HciTransport};
use crate::bluez::util::{c_name, handle_error};
use crate::constants::*;

#[derive(Debug, Copy, Clone, Default)]
#[repr(C)]
pub struct HCIDevReq {
    pub dev_id: u16,
    pub dev_opt: u32,
}

#[derive(Debug, Copy, Clone)]
#[repr(C)]
pub struct HCIDevListReq {
    dev_num: u16,
    dev_reqs: [HCIDevReq; HCI_MAX_DEV as usize],
}

impl HCIDevListReq {
    /// A request for at most `max` entries; the kernel overwrites `dev_num` with the number it
    /// filled in.
    pub fn new(max: u16) -> Self {
        HCIDevListReq {
            dev_num: max.min(HCI_MAX_DEV),
            dev_reqs: [HCIDevReq::default(); HCI_MAX_DEV as usize],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &HCIDevReq> {
        let n = (self.dev_num as usize).min(self.dev_reqs.len());
        self.dev_reqs[..n].iter()
    }
}

#[derive(Debug, Copy, Clone, Default)]
#[repr(C)]
pub struct HCIDevStats {
    pub err_rx: u32,
    pub err_tx: u32,
    pub cmd_tx: u32,
    pub evt_rx: u32,
    pub acl_tx: u32,
    pub acl_rx: u32,
    pub sco_tx: u32,
    pub sco_rx: u32,
    pub byte_rx: u32,
    pub byte_tx: u32,
}

#[derive(Debug, Copy, Clone, Default)]
#[repr(C)]
pub struct HCIDevInfo {
    pub dev_id: u16,
    pub name: [libc::c_char; 8],
    pub bdaddr: [u8; 6],
    pub flags: u32,
    pub type_: u8,
    pub features: [u8; 8],
    pub pkt_type: u32,
    pub link_policy: u32,
    pub link_mode: u32,
    pub acl_mtu: u16,
    pub acl_pkts: u16,
    pub sco_mtu: u16,
    pub sco_pkts: u16,
    pub stat: HCIDevStats,
}

impl From<&HCIDevInfo> for ControllerInfo {
    fn from(di: &HCIDevInfo) -> Self {
        ControllerInfo {
            index: di.dev_id,
            name: c_name(&di.name),
            address: BDAddr::from_le_bytes(di.bdaddr),
            typ: ControllerType::parse(di.type_),
            flags: ControllerFlags::from_bits_truncate(di.flags),
            features: di.features,
            acl_mtu: di.acl_mtu,
            acl_pkts: di.acl_pkts,
            sco_mtu: di.sco_mtu,
            sco_pkts: di.sco_pkts,
        }
    }
}

#[derive(Debug, Copy, Clone)]
#[repr(C)]
struct SockaddrHCI {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

/// An open, not yet bound, `AF_BLUETOOTH` raw HCI socket.
#[derive(Debug)]
pub struct HciSocket {
    fd: OwnedFd,
}

impl HciSocket {
    pub fn open() -> nix::Result<HciSocket> {
        let fd = handle_error(unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                BTPROTO_HCI,
            )
        })?;
        Ok(HciSocket {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl HciControl for HciSocket {
    fn device_list(&self, max: u16) -> nix::Result<Vec<u16>> {
        let mut dev_list = HCIDevListReq::new(max);
        unsafe { ioctl::hci_get_dev_list(self.as_raw_fd(), &mut dev_list)? };
        Ok(dev_list.iter().map(|req| req.dev_id).collect())
    }

    fn device_info(&self, index: u16) -> nix::Result<ControllerInfo> {
        let mut di = HCIDevInfo {
            dev_id: index,
            ..HCIDevInfo::default()
        };
        unsafe { ioctl::hci_get_dev_info(self.as_raw_fd(), &mut di)? };
        Ok(ControllerInfo::from(&di))
    }

    fn up(&self, index: u16) -> nix::Result<()> {
        unsafe { ioctl::hci_dev_up(self.as_raw_fd(), index as ioctl_param_type) }.map(drop)
    }

    fn down(&self, index: u16) -> nix::Result<()> {
        unsafe { ioctl::hci_dev_down(self.as_raw_fd(), index as ioctl_param_type) }.map(drop)
    }

    fn reset(&self, index: u16) -> nix::Result<()> {
        unsafe { ioctl::hci_dev_reset(self.as_raw_fd(), index as ioctl_param_type) }.map(drop)
    }

    fn bind(&self, index: u16, channel: Channel) -> nix::Result<()> {
        let addr = SockaddrHCI {
            hci_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: index,
            hci_channel: channel.num(),
        };
        handle_error(unsafe {
            libc::bind(
                self.as_raw_fd(),
                &addr as *const SockaddrHCI as *const libc::sockaddr,
                mem::size_of::<SockaddrHCI>() as libc::socklen_t,
            )
        })
        .map(drop)
    }

    fn into_fd(self) -> OwnedFd {
        self.fd
    }
}

/// Opens real kernel sockets. This is what [`Manager::new`](crate::bluez::manager::Manager::new)
/// uses.
#[derive(Debug, Default, Clone, Copy)]
pub struct HciSocketTransport;

impl HciTransport for HciSocketTransport {
    type Control = HciSocket;

    fn open(&self) -> nix::Result<HciSocket> {
        HciSocket::open()
    }
}
