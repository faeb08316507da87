// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Poll-mode driver runtime contract.
//!
//! A DPDK-class fast path exposes ports, receive/transmit queues, and
//! memory pools of fixed-size packet buffers; receive is a non-blocking
//! poll that hands back bursts of owned buffers, transmit consumes an
//! in-order prefix of a burst and refuses the rest under back-pressure.
//! This crate pins those semantics down as traits so an acquisition module
//! can be driven by the real runtime in production and by the in-memory
//! [`TestDriver`] in tests.

#![forbid(unsafe_code)]
#![deny(clippy::all)]

mod dev;
mod mbuf;
#[cfg(any(doc, test, feature = "testing"))]
pub mod test_driver;

pub use dev::{
    Burst, DevConfig, Driver, DriverError, ETHER_MAX_LEN, MAX_BURST, PortId, QueueId, SocketId,
};
pub use mbuf::{BufferAllocationError, FrameTooLong, Mbuf, MbufPool, PoolConfig};
#[cfg(any(doc, test, feature = "testing"))]
pub use test_driver::{TestDriver, TestMbuf, TestPool};
