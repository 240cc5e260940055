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

use std::fmt::{self, Debug, Formatter};
use std::os::unix::io::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use crate::api::ControllerInfo;
use crate::bluez::util::handle_error;
use crate::common::logger::Logger;
use crate::{Error, Result};

/// A claimed controller, bound to its HCI socket and ready for I/O.
///
/// Reads and writes are serialized independently: at most one read and at most one write are in
/// flight at a time, but a read never holds up a write. [`close`](Device::close) waits for the
/// in-flight calls to leave the kernel, releases the socket, and makes every later call fail with
/// [`Error::Closed`].
pub struct Device {
    info: ControllerInfo,
    fd: RwLock<Option<OwnedFd>>,
    closed: AtomicBool,
    poll_target: libc::pollfd,
    poll_timeout_ms: libc::c_int,
    read_guard: Mutex<()>,
    write_guard: Mutex<()>,
    logger: Arc<dyn Logger>,
}

impl Device {
    pub(crate) fn new(
        fd: OwnedFd,
        info: ControllerInfo,
        poll_timeout: Duration,
        logger: Arc<dyn Logger>,
    ) -> Device {
        let raw_fd = fd.as_raw_fd();
        Device {
            info,
            fd: RwLock::new(Some(fd)),
            closed: AtomicBool::new(false),
            poll_target: libc::pollfd {
                fd: raw_fd,
                events: libc::POLLIN,
                revents: 0,
            },
            poll_timeout_ms: poll_timeout.as_millis().min(libc::c_int::MAX as u128)
                as libc::c_int,
            read_guard: Mutex::new(()),
            write_guard: Mutex::new(()),
            logger,
        }
    }

    /// The controller id this device is bound to (`hciN`).
    pub fn index(&self) -> u16 {
        self.info.index
    }

    /// The controller name reported by the kernel when the device was claimed.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &ControllerInfo {
        &self.info
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Reads one packet into `buf`.
    ///
    /// Waits at most the configured poll timeout (100 ms by default) for the socket to become
    /// readable. If nothing arrives in time this returns `Ok(0)` without touching the socket, so
    /// callers can check for cancellation between calls. Otherwise exactly one `read(2)` is
    /// issued and its result is returned as is.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let _guard = self.read_guard.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let state = self.fd.read().unwrap_or_else(PoisonError::into_inner);
        let fd = state.as_ref().ok_or(Error::Closed)?;

        let mut fds = [self.poll_target];
        let ready = handle_error(unsafe {
            libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, self.poll_timeout_ms)
        })
        .map_err(Error::Poll)?;
        if ready == 0 {
            return Ok(0);
        }

        let n = handle_error(unsafe {
            libc::read(
                fd.as_raw_fd(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        })
        .map_err(Error::Read)?;
        Ok(n as usize)
    }

    /// Writes `buf` with a single `write(2)`.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let state = self.fd.read().unwrap_or_else(PoisonError::into_inner);
        let fd = state.as_ref().ok_or(Error::Closed)?;

        let n = handle_error(unsafe {
            libc::write(
                fd.as_raw_fd(),
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
            )
        })
        .map_err(Error::Write)?;
        Ok(n as usize)
    }

    /// Releases the socket. Returns [`Error::Closed`] if the device was already closed.
    pub fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        let fd = self
            .fd
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::Closed)?;
        self.logger
            .debug(format_args!("dev: {} close", self.info.name));
        handle_error(unsafe { libc::close(fd.into_raw_fd()) }).map_err(Error::Close)?;
        Ok(())
    }
}

impl AsRawFd for Device {
    /// The socket's descriptor, or `-1` once [`close`](Device::close) has released it.
    fn as_raw_fd(&self) -> RawFd {
        self.fd
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(-1, AsRawFd::as_raw_fd)
    }
}

impl Debug for Device {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Device")
            .field("index", &self.info.index)
            .field("name", &self.info.name)
            .field("fd", &self.as_raw_fd())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::logger::test_util::RecordingLogger;
    use crate::common::logger::LogFacade;
    use log::Level;
    use nix::errno::Errno;
    use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};
    use std::fs::File;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;
    use std::thread;
    use std::time::Instant;

    fn pair(poll_timeout: Duration) -> (Device, UnixStream) {
        let (ours, theirs) = socketpair(
            AddressFamily::Unix,
            SockType::SeqPacket,
            None,
            SockFlag::SOCK_CLOEXEC,
        )
        .unwrap();
        let device = Device::new(
            ours,
            ControllerInfo::new(0, "hci0"),
            poll_timeout,
            Arc::new(LogFacade),
        );
        (device, UnixStream::from(theirs))
    }

    #[test]
    fn read_times_out_with_zero_bytes() {
        let (device, _peer) = pair(Duration::from_millis(100));
        let mut buf = [0u8; 64];

        let start = Instant::now();
        assert_eq!(device.read(&mut buf).unwrap(), 0);
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn read_returns_what_the_socket_produced() {
        let (device, mut peer) = pair(Duration::from_millis(100));
        let packet = [0x04, 0x0e, 0x04, 0x01, 0x03, 0x0c, 0x00];
        peer.write_all(&packet).unwrap();

        let mut buf = [0u8; 260];
        let n = device.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &packet);
    }

    #[test]
    fn read_error_keeps_the_errno() {
        // A directory always polls readable, but read(2) on it fails.
        let dir = OwnedFd::from(File::open("/").unwrap());
        let device = Device::new(
            dir,
            ControllerInfo::new(0, "hci0"),
            Duration::from_millis(100),
            Arc::new(LogFacade),
        );

        let mut buf = [0u8; 16];
        match device.read(&mut buf) {
            Err(Error::Read(errno)) => assert_eq!(errno, Errno::EISDIR),
            other => panic!("expected a read error, got {:?}", other),
        }
        assert!(!device.is_closed());
    }

    #[test]
    fn write_reaches_the_socket() {
        let (device, mut peer) = pair(Duration::from_millis(100));
        let command = [0x01, 0x03, 0x0c, 0x00];
        assert_eq!(device.write(&command).unwrap(), command.len());

        let mut buf = [0u8; 16];
        let n = peer.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &command);
    }

    #[test]
    fn concurrent_writes_do_not_interleave() {
        const WRITERS: u8 = 8;
        const PER_WRITER: usize = 100;

        let (device, mut peer) = pair(Duration::from_millis(100));
        let device = Arc::new(device);
        let writers: Vec<_> = (0..WRITERS)
            .map(|id| {
                let device = device.clone();
                thread::spawn(move || {
                    let packet = [id; 64];
                    for _ in 0..PER_WRITER {
                        assert_eq!(device.write(&packet).unwrap(), 64);
                    }
                })
            })
            .collect();

        let mut buf = [0u8; 128];
        for _ in 0..(WRITERS as usize * PER_WRITER) {
            let n = peer.read(&mut buf).unwrap();
            assert_eq!(n, 64);
            assert!(buf[..n].iter().all(|&b| b == buf[0]));
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }

    #[test]
    fn pending_read_does_not_block_write() {
        let (device, mut peer) = pair(Duration::from_secs(2));
        let device = Arc::new(device);

        let reader = {
            let device = device.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 16];
                device.read(&mut buf).unwrap()
            })
        };
        thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        device.write(&[0x01]).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));

        let mut buf = [0u8; 4];
        assert_eq!(peer.read(&mut buf).unwrap(), 1);

        peer.write_all(&[0x04]).unwrap();
        assert_eq!(reader.join().unwrap(), 1);
    }

    #[test]
    fn io_after_close_fails_cleanly() {
        let (device, _peer) = pair(Duration::from_millis(100));
        device.close().unwrap();
        assert!(device.is_closed());

        let mut buf = [0u8; 4];
        assert!(matches!(device.read(&mut buf), Err(Error::Closed)));
        assert!(matches!(device.write(&buf), Err(Error::Closed)));
        assert!(matches!(device.close(), Err(Error::Closed)));
    }

    #[test]
    fn close_during_read_ends_the_read_loop() {
        let (device, _peer) = pair(Duration::from_millis(20));
        let device = Arc::new(device);

        let reader = {
            let device = device.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 16];
                loop {
                    match device.read(&mut buf) {
                        Ok(_) => continue,
                        Err(err) => return err,
                    }
                }
            })
        };
        thread::sleep(Duration::from_millis(50));
        device.close().unwrap();

        assert!(matches!(reader.join().unwrap(), Error::Closed));
    }

    #[test]
    fn close_is_logged() {
        let (ours, _theirs) = socketpair(
            AddressFamily::Unix,
            SockType::SeqPacket,
            None,
            SockFlag::empty(),
        )
        .unwrap();
        let logger = Arc::new(RecordingLogger::default());
        let device = Device::new(
            ours,
            ControllerInfo::new(3, "hci3"),
            Duration::from_millis(100),
            logger.clone(),
        );
        assert_eq!(device.index(), 3);
        assert_eq!(device.name(), "hci3");

        device.close().unwrap();
        assert!(logger.contains(Level::Debug, "dev: hci3 close"));

        assert!(matches!(device.close(), Err(Error::Closed)));
        let closes = logger
            .records()
            .iter()
            .filter(|(_, msg)| msg.contains("close"))
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn raw_fd_is_invalid_after_close() {
        let (device, _peer) = pair(Duration::from_millis(100));
        assert!(device.as_raw_fd() >= 0);

        device.close().unwrap();
        assert_eq!(device.as_raw_fd(), -1);
    }
}
