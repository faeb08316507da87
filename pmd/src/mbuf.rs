// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Packet buffer (mbuf) and memory pool contracts.

use crate::dev::SocketId;
use core::fmt::Debug;

/// An owned packet buffer borrowed from a pool.
///
/// Buffers are preallocated; the hot path only borrows and releases them.
/// Dropping the handle releases the buffer back to its pool.
pub trait Mbuf: Debug + Send + 'static {
    /// The frame contents.
    fn data(&self) -> &[u8];

    /// Length of the frame contents in octets.
    fn data_len(&self) -> usize {
        self.data().len()
    }

    /// Replace the frame contents, e.g. for injection.
    ///
    /// # Errors
    ///
    /// Fails when `frame` exceeds the buffer's data capacity.
    fn put(&mut self, frame: &[u8]) -> Result<(), FrameTooLong>;
}

/// A frame offered to [`Mbuf::put`] that does not fit the buffer.
#[derive(Debug, thiserror::Error)]
#[error("frame of {len} octets exceeds buffer capacity of {capacity}")]
pub struct FrameTooLong {
    /// Octets offered.
    pub len: usize,
    /// Data capacity of the buffer.
    pub capacity: usize,
}

/// The pool had no free buffer.
#[derive(Debug, thiserror::Error)]
#[error("memory pool exhausted")]
pub struct BufferAllocationError;

/// Parameters of a packet buffer pool.
///
/// The per-buffer data size is driver-defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Pool name, unique within the runtime.
    pub name: String,
    /// Number of buffers in the pool.
    pub size: u32,
    /// Per-core cache size.
    pub cache_size: u32,
    /// Socket to allocate the pool on.
    pub socket: SocketId,
}

/// A handle to a pool of packet buffers.
pub trait MbufPool {
    /// The buffer type this pool hands out.
    type Mbuf: Mbuf;

    /// Borrow one buffer from the pool.
    ///
    /// # Errors
    ///
    /// Fails when the pool is exhausted.
    fn alloc(&self) -> Result<Self::Mbuf, BufferAllocationError>;

    /// The pool's name.
    fn name(&self) -> &str;
}
