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

//! Linux implementation on top of `AF_BLUETOOTH` / `BTPROTO_HCI` raw sockets.

pub mod device;
#[cfg(test)]
pub(crate) mod fake;
mod ioctl;
pub mod manager;
pub mod socket;
pub mod transport;
mod util;
