//! The `platform` module re-exports the Linux implementations under stable names. Refer to the
//! [`api`](crate::api) module for the platform independent types.

pub use crate::bluez::{
    device::Device,
    manager::Manager,
    socket::{HciSocket, HciSocketTransport},
};
pub use crate::common::{
    logger::{LogFacade, Logger},
    pool::BytePool,
};

use static_assertions::assert_impl_all;
use std::{fmt::Debug, os::unix::io::AsRawFd};

// Ensure that the exported types implement all the expected traits.
assert_impl_all!(Device: AsRawFd, Debug, Send, Sized, Sync);
assert_impl_all!(Manager: Clone, Debug, Default, Send, Sized, Sync);
assert_impl_all!(BytePool: Debug, Send, Sized, Sync);
assert_impl_all!(HciSocket: AsRawFd, Debug, Send, Sync);
assert_impl_all!(LogFacade: Logger, Clone, Debug, Default);
