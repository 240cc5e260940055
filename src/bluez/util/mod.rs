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

use nix::errno::{Errno, ErrnoSentinel};

/// Turns the `-1` return convention of libc calls into an `Errno`.
pub fn handle_error<S: ErrnoSentinel + PartialEq<S>>(v: S) -> nix::Result<S> {
    Errno::result(v)
}

/// Decodes a fixed size, NUL padded C string.
pub fn c_name(raw: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
