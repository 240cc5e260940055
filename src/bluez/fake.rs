// btleplug Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! A scripted transport for exercising the claim sequence without a kernel.

use std::os::unix::io::OwnedFd;
use std::sync::{Arc, Mutex};

use nix::errno::Errno;
use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};

use crate::api::{Channel, ControllerInfo};
use crate::bluez::transport::{HciControl, HciTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    List(u16),
    Info(u16),
    Up(u16),
    Reset(u16),
    Down(u16),
    Bind(u16, Channel),
}

impl Call {
    fn index(&self) -> Option<u16> {
        match *self {
            Call::List(_) => None,
            Call::Info(i) | Call::Up(i) | Call::Reset(i) | Call::Down(i) | Call::Bind(i, _) => {
                Some(i)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeController {
    pub info: ControllerInfo,
    pub info_error: Option<Errno>,
    pub up_error: Option<Errno>,
    pub reset_error: Option<Errno>,
    pub down_error: Option<Errno>,
    pub user_bind_error: Option<Errno>,
    pub raw_bind_error: Option<Errno>,
}

impl FakeController {
    /// A controller without LE support that accepts every request.
    pub fn classic(index: u16) -> Self {
        FakeController {
            info: ControllerInfo::new(index, format!("hci{}", index)),
            info_error: None,
            up_error: None,
            reset_error: None,
            down_error: None,
            user_bind_error: None,
            raw_bind_error: None,
        }
    }

    pub fn le(index: u16) -> Self {
        let mut controller = Self::classic(index);
        controller.info.features[4] = 0x40;
        controller
    }

    pub fn info_error(mut self, err: Errno) -> Self {
        self.info_error = Some(err);
        self
    }

    pub fn up_error(mut self, err: Errno) -> Self {
        self.up_error = Some(err);
        self
    }

    pub fn reset_error(mut self, err: Errno) -> Self {
        self.reset_error = Some(err);
        self
    }

    pub fn down_error(mut self, err: Errno) -> Self {
        self.down_error = Some(err);
        self
    }

    pub fn user_bind_error(mut self, err: Errno) -> Self {
        self.user_bind_error = Some(err);
        self
    }

    pub fn raw_bind_error(mut self, err: Errno) -> Self {
        self.raw_bind_error = Some(err);
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    controllers: Vec<FakeController>,
    open_error: Option<Errno>,
    list_error: Option<Errno>,
    calls: Mutex<Vec<Call>>,
    peers: Mutex<Vec<OwnedFd>>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<FakeState>,
}

impl FakeTransport {
    pub fn new(controllers: Vec<FakeController>) -> Self {
        Self::build(controllers, None, None)
    }

    pub fn failing_open(err: Errno) -> Self {
        Self::build(vec![], Some(err), None)
    }

    pub fn failing_list(err: Errno) -> Self {
        Self::build(vec![], None, Some(err))
    }

    fn build(
        controllers: Vec<FakeController>,
        open_error: Option<Errno>,
        list_error: Option<Errno>,
    ) -> Self {
        FakeTransport {
            state: Arc::new(FakeState {
                controllers,
                open_error,
                list_error,
                ..FakeState::default()
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, index: u16) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.index() == Some(index))
            .collect()
    }

    /// The other end of the most recently handed out device socket.
    pub fn take_peer(&self) -> Option<OwnedFd> {
        self.state.peers.lock().unwrap().pop()
    }
}

impl HciTransport for FakeTransport {
    type Control = FakeControl;

    fn open(&self) -> nix::Result<FakeControl> {
        match self.state.open_error {
            Some(err) => Err(err),
            None => Ok(FakeControl {
                state: self.state.clone(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct FakeControl {
    state: Arc<FakeState>,
}

impl FakeControl {
    fn record(&self, call: Call) {
        self.state.calls.lock().unwrap().push(call);
    }

    fn controller(&self, index: u16) -> nix::Result<&FakeController> {
        self.state
            .controllers
            .iter()
            .find(|c| c.info.index == index)
            .ok_or(Errno::ENODEV)
    }
}

fn result(err: Option<Errno>) -> nix::Result<()> {
    err.map_or(Ok(()), Err)
}

impl HciControl for FakeControl {
    fn device_list(&self, max: u16) -> nix::Result<Vec<u16>> {
        self.record(Call::List(max));
        if let Some(err) = self.state.list_error {
            return Err(err);
        }
        Ok(self
            .state
            .controllers
            .iter()
            .take(max as usize)
            .map(|c| c.info.index)
            .collect())
    }

    fn device_info(&self, index: u16) -> nix::Result<ControllerInfo> {
        self.record(Call::Info(index));
        let controller = self.controller(index)?;
        result(controller.info_error)?;
        Ok(controller.info.clone())
    }

    fn up(&self, index: u16) -> nix::Result<()> {
        self.record(Call::Up(index));
        result(self.controller(index)?.up_error)
    }

    fn down(&self, index: u16) -> nix::Result<()> {
        self.record(Call::Down(index));
        result(self.controller(index)?.down_error)
    }

    fn reset(&self, index: u16) -> nix::Result<()> {
        self.record(Call::Reset(index));
        result(self.controller(index)?.reset_error)
    }

    fn bind(&self, index: u16, channel: Channel) -> nix::Result<()> {
        self.record(Call::Bind(index, channel));
        let controller = self.controller(index)?;
        match channel {
            Channel::User => result(controller.user_bind_error),
            Channel::Raw => result(controller.raw_bind_error),
        }
    }

    fn into_fd(self) -> OwnedFd {
        let (ours, theirs) = socketpair(
            AddressFamily::Unix,
            SockType::SeqPacket,
            None,
            SockFlag::SOCK_CLOEXEC,
        )
        .expect("socketpair");
        self.state.peers.lock().unwrap().push(theirs);
        ours
    }
}
