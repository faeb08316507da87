// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Device identifiers, configuration, and the driver runtime trait.

use crate::mbuf::{Mbuf, MbufPool, PoolConfig};
use arrayvec::ArrayVec;
use core::fmt::{self, Display};

/// Largest number of frames exchanged with a device in one burst call.
pub const MAX_BURST: usize = 32;

/// Standard maximum Ethernet frame length (untagged).
pub const ETHER_MAX_LEN: u32 = 1518;

/// A bounded batch of frames exchanged with a device.
pub type Burst<B> = ArrayVec<B, MAX_BURST>;

/// A device (port) index assigned by the driver runtime.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PortId(pub u16);

impl PortId {
    /// The index as a `u16`.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A receive or transmit queue index on a device.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct QueueId(pub u16);

impl QueueId {
    /// The index as a `u16`.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A NUMA socket index.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SocketId(pub u32);

impl SocketId {
    /// No socket preference.
    pub const ANY: SocketId = SocketId(u32::MAX);
}

impl Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device-level configuration applied before queue setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevConfig {
    /// Number of receive queues to configure.
    pub rx_queues: u16,
    /// Number of transmit queues to configure.
    pub tx_queues: u16,
    /// Largest receivable frame.
    pub max_frame_len: u32,
}

impl Default for DevConfig {
    fn default() -> DevConfig {
        DevConfig {
            rx_queues: 1,
            tx_queues: 1,
            max_frame_len: ETHER_MAX_LEN,
        }
    }
}

/// Failures reported by a driver runtime.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The runtime rejected its initialization arguments.
    #[error("invalid driver arguments: {0}")]
    InvalidArguments(String),
    /// The runtime was already initialized in this process.
    #[error("driver runtime already initialized")]
    AlreadyInitialized,
    /// The named port does not exist.
    #[error("no such device: port {0}")]
    NoSuchDevice(PortId),
    /// The runtime could not allocate memory.
    #[error("out of memory: {0}")]
    NoMemory(String),
    /// A parameter was out of range for the device.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The device failed an operation.
    #[error("device failure: {0}")]
    DeviceFailure(String),
}

/// The poll-mode driver runtime an acquisition module runs on.
///
/// Buffer ownership is part of the contract: [`Driver::rx_burst`] hands the
/// caller owned buffers drawn from the pool bound to the polled queue;
/// [`Driver::tx_burst`] consumes an in-order prefix of the offered burst
/// and returns the refused tail, which stays owned by the caller. Dropping
/// a buffer releases it to its pool.
pub trait Driver {
    /// Buffer handle produced by this runtime.
    type Mbuf: Mbuf;
    /// Pool handle produced by this runtime. Cloning shares the pool.
    type Pool: MbufPool<Mbuf = Self::Mbuf> + Clone;

    /// One-time runtime (EAL) initialization from an argument vector.
    ///
    /// # Errors
    ///
    /// Fails when the arguments are rejected or the runtime was already
    /// initialized.
    fn init(&mut self, args: &[String]) -> Result<(), DriverError>;

    /// Number of ports the runtime enumerated.
    fn dev_count(&self) -> u16;

    /// NUMA socket the given port is attached to.
    fn dev_socket(&self, port: PortId) -> SocketId;

    /// Create a packet buffer pool.
    ///
    /// # Errors
    ///
    /// Fails when the pool cannot be allocated or the name is taken.
    fn create_pool(&mut self, config: PoolConfig) -> Result<Self::Pool, DriverError>;

    /// Apply device-level configuration. Resets any previous queue setup.
    ///
    /// # Errors
    ///
    /// Fails when the port does not exist or rejects the configuration.
    fn dev_configure(&mut self, port: PortId, config: &DevConfig) -> Result<(), DriverError>;

    /// Set up one receive queue, drawing buffers from `pool`.
    ///
    /// # Errors
    ///
    /// Fails when the queue is out of range or the device is unconfigured.
    fn rx_queue_setup(
        &mut self,
        port: PortId,
        queue: QueueId,
        descriptors: u16,
        socket: SocketId,
        pool: &Self::Pool,
    ) -> Result<(), DriverError>;

    /// Set up one transmit queue.
    ///
    /// # Errors
    ///
    /// Fails when the queue is out of range or the device is unconfigured.
    fn tx_queue_setup(
        &mut self,
        port: PortId,
        queue: QueueId,
        descriptors: u16,
        socket: SocketId,
    ) -> Result<(), DriverError>;

    /// Start a configured device.
    ///
    /// # Errors
    ///
    /// Fails when the device is unconfigured or refuses to start.
    fn dev_start(&mut self, port: PortId) -> Result<(), DriverError>;

    /// Stop a device. Stopping an unknown or stopped device is a no-op.
    fn dev_stop(&mut self, port: PortId);

    /// Put a started device into promiscuous mode.
    fn promiscuous_enable(&mut self, port: PortId);

    /// Poll one receive queue for up to `max` frames. Non-blocking; an
    /// empty burst means nothing was waiting.
    fn rx_burst(&mut self, port: PortId, queue: QueueId, max: usize) -> Burst<Self::Mbuf>;

    /// Offer frames for transmission, in order. The device consumes a
    /// prefix and returns the refused tail.
    fn tx_burst(
        &mut self,
        port: PortId,
        queue: QueueId,
        frames: Burst<Self::Mbuf>,
    ) -> Burst<Self::Mbuf>;
}
