// btleplug Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use std::fmt::{self, Debug, Formatter};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};

/// A bounded store of fixed-width byte buffers, used to avoid an allocation per packet on the
/// read path.
///
/// `get` and `put` never wait: an empty store makes `get` allocate, a full store makes `put`
/// drop the buffer. Once [`shutdown`](BytePool::shutdown) has been called the pool stops
/// retaining returned buffers, and `put` quietly discards them. Producers may keep returning
/// in-flight buffers after a consumer decided to stop, and that is not an error.
///
/// Reused buffers are handed out as they were returned; their contents are not cleared.
pub struct BytePool {
    width: usize,
    capacity: usize,
    sender: mpsc::Sender<Vec<u8>>,
    receiver: Mutex<mpsc::Receiver<Vec<u8>>>,
}

impl BytePool {
    /// Creates a pool of `width`-byte buffers that retains at most `capacity` of them.
    pub fn new(width: usize, capacity: usize) -> Self {
        // tokio refuses zero-sized channels; `put` never sends when capacity is 0.
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        BytePool {
            width,
            capacity,
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers currently waiting for reuse.
    pub fn len(&self) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender.is_closed()
    }

    /// Returns a stored buffer, or a freshly allocated one if none is available right now.
    pub fn get(&self) -> Vec<u8> {
        let reused = match self.receiver.try_lock() {
            Ok(mut receiver) => receiver.try_recv().ok(),
            // Another caller is dequeuing; allocating is cheaper than waiting.
            Err(_) => None,
        };
        reused.unwrap_or_else(|| vec![0u8; self.width])
    }

    /// Hands a buffer back for reuse.
    pub fn put(&self, buf: Vec<u8>) {
        if buf.len() != self.width {
            trace!(
                "bytepool: dropping {} byte buffer, pool width is {}",
                buf.len(),
                self.width
            );
            return;
        }
        if self.capacity == 0 {
            return;
        }
        match self.sender.try_send(buf) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => {
                trace!("bytepool: buffer returned after shutdown");
            }
        }
    }

    /// Stops retaining returned buffers. Buffers already stored can still be handed out by
    /// [`get`](BytePool::get).
    pub fn shutdown(&self) {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close();
    }
}

impl Debug for BytePool {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("BytePool")
            .field("width", &self.width)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
