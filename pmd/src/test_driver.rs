// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Deterministic in-memory driver for tests.
//!
//! Emulates the runtime surface an acquisition module touches: enumerated
//! ports, queue setup bookkeeping, pools with outstanding-buffer
//! accounting, a per-port feed of frames to be received, a transmit sink,
//! and a configurable per-call transmit accept limit to provoke
//! back-pressure. Handles are cheap clones sharing one interior state, so
//! a test can keep inspecting the driver after handing it to a module.

use crate::dev::{Burst, DevConfig, Driver, DriverError, MAX_BURST, PortId, QueueId, SocketId};
use crate::mbuf::{BufferAllocationError, FrameTooLong, Mbuf, MbufPool, PoolConfig};
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Data capacity of a [`TestMbuf`], standing in for the driver-defined
/// default buffer size of a packet pool.
pub const TEST_MBUF_CAPACITY: usize = 2048;

#[derive(Debug)]
struct PoolState {
    name: String,
    capacity: u32,
    outstanding: AtomicUsize,
}

/// Buffer handle produced by a [`TestPool`].
///
/// Dropping it returns the buffer to the pool's accounting.
#[derive(Debug)]
pub struct TestMbuf {
    data: Vec<u8>,
    pool: Arc<PoolState>,
}

impl Mbuf for TestMbuf {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn put(&mut self, frame: &[u8]) -> Result<(), FrameTooLong> {
        if frame.len() > TEST_MBUF_CAPACITY {
            return Err(FrameTooLong {
                len: frame.len(),
                capacity: TEST_MBUF_CAPACITY,
            });
        }
        self.data.clear();
        self.data.extend_from_slice(frame);
        Ok(())
    }
}

impl Drop for TestMbuf {
    fn drop(&mut self) {
        self.pool.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Clonable handle to an in-memory buffer pool.
#[derive(Debug, Clone)]
pub struct TestPool(Arc<PoolState>);

impl MbufPool for TestPool {
    type Mbuf = TestMbuf;

    fn alloc(&self) -> Result<TestMbuf, BufferAllocationError> {
        let previous = self.0.outstanding.fetch_add(1, Ordering::AcqRel);
        if previous >= self.0.capacity as usize {
            self.0.outstanding.fetch_sub(1, Ordering::AcqRel);
            return Err(BufferAllocationError);
        }
        Ok(TestMbuf {
            data: Vec::with_capacity(TEST_MBUF_CAPACITY),
            pool: Arc::clone(&self.0),
        })
    }

    fn name(&self) -> &str {
        &self.0.name
    }
}

#[derive(Debug, Default)]
struct TestPort {
    config: Option<DevConfig>,
    rx_queues: Vec<QueueId>,
    tx_queues: Vec<QueueId>,
    rx_pool: Option<TestPool>,
    started: bool,
    promisc: bool,
    rx_pending: VecDeque<Vec<u8>>,
    tx_sink: Vec<Vec<u8>>,
    tx_accept_limit: Option<usize>,
}

#[derive(Debug, Default)]
struct DriverState {
    initialized: bool,
    eal_args: Vec<String>,
    ports: Vec<TestPort>,
    pools: Vec<TestPool>,
    rx_polled: BTreeSet<(u16, u16)>,
}

/// The in-memory driver double. Clones share one state.
#[derive(Debug, Clone, Default)]
pub struct TestDriver {
    state: Arc<Mutex<DriverState>>,
}

impl TestDriver {
    /// A driver with no ports.
    #[must_use]
    pub fn new() -> TestDriver {
        TestDriver::default()
    }

    /// A driver that enumerates `count` ports.
    #[must_use]
    pub fn with_ports(count: u16) -> TestDriver {
        let driver = TestDriver::new();
        driver.state().ports = (0..count).map(|_| TestPort::default()).collect();
        driver
    }

    fn state(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().expect("test driver state poisoned")
    }

    /// Queue a frame to be received on `port`.
    pub fn feed_rx(&self, port: PortId, frame: &[u8]) {
        self.state().ports[port.as_u16() as usize]
            .rx_pending
            .push_back(frame.to_vec());
    }

    /// Payload copies of every frame transmitted on `port`, in order.
    #[must_use]
    pub fn transmitted(&self, port: PortId) -> Vec<Vec<u8>> {
        self.state().ports[port.as_u16() as usize].tx_sink.clone()
    }

    /// Cap how many frames one `tx_burst` call accepts on `port`.
    /// `None` accepts everything, `Some(0)` refuses everything.
    pub fn set_tx_accept_limit(&self, port: PortId, limit: Option<usize>) {
        self.state().ports[port.as_u16() as usize].tx_accept_limit = limit;
    }

    /// Whether `port` is started.
    #[must_use]
    pub fn port_started(&self, port: PortId) -> bool {
        self.state().ports[port.as_u16() as usize].started
    }

    /// Whether promiscuous mode was enabled on `port`.
    #[must_use]
    pub fn promisc_enabled(&self, port: PortId) -> bool {
        self.state().ports[port.as_u16() as usize].promisc
    }

    /// The argument vector passed to [`Driver::init`].
    #[must_use]
    pub fn eal_args(&self) -> Vec<String> {
        self.state().eal_args.clone()
    }

    /// Names of the pools created so far, in creation order.
    #[must_use]
    pub fn pool_names(&self) -> Vec<String> {
        self.state()
            .pools
            .iter()
            .map(|pool| pool.name().to_string())
            .collect()
    }

    /// Buffers currently checked out of all pools.
    #[must_use]
    pub fn outstanding_mbufs(&self) -> usize {
        self.state()
            .pools
            .iter()
            .map(|pool| pool.0.outstanding.load(Ordering::Acquire))
            .sum()
    }

    /// Distinct `(port, queue)` pairs that have been receive-polled.
    #[must_use]
    pub fn rx_polled(&self) -> Vec<(PortId, QueueId)> {
        self.state()
            .rx_polled
            .iter()
            .map(|&(port, queue)| (PortId(port), QueueId(queue)))
            .collect()
    }
}

impl Driver for TestDriver {
    type Mbuf = TestMbuf;
    type Pool = TestPool;

    fn init(&mut self, args: &[String]) -> Result<(), DriverError> {
        let mut state = self.state();
        if state.initialized {
            return Err(DriverError::AlreadyInitialized);
        }
        if args.is_empty() {
            return Err(DriverError::InvalidArguments(
                "empty argument vector".to_string(),
            ));
        }
        state.eal_args = args.to_vec();
        state.initialized = true;
        debug!(args = ?state.eal_args, "test driver initialized");
        Ok(())
    }

    fn dev_count(&self) -> u16 {
        self.state().ports.len() as u16
    }

    fn dev_socket(&self, _port: PortId) -> SocketId {
        SocketId(0)
    }

    fn create_pool(&mut self, config: PoolConfig) -> Result<TestPool, DriverError> {
        let mut state = self.state();
        if state.pools.iter().any(|pool| pool.name() == config.name) {
            return Err(DriverError::InvalidArgument(format!(
                "pool '{}' already exists",
                config.name
            )));
        }
        let pool = TestPool(Arc::new(PoolState {
            name: config.name,
            capacity: config.size,
            outstanding: AtomicUsize::new(0),
        }));
        state.pools.push(pool.clone());
        Ok(pool)
    }

    fn dev_configure(&mut self, port: PortId, config: &DevConfig) -> Result<(), DriverError> {
        let mut state = self.state();
        let dev = state
            .ports
            .get_mut(port.as_u16() as usize)
            .ok_or(DriverError::NoSuchDevice(port))?;
        dev.config = Some(config.clone());
        dev.rx_queues.clear();
        dev.tx_queues.clear();
        Ok(())
    }

    fn rx_queue_setup(
        &mut self,
        port: PortId,
        queue: QueueId,
        _descriptors: u16,
        _socket: SocketId,
        pool: &TestPool,
    ) -> Result<(), DriverError> {
        let mut state = self.state();
        let dev = state
            .ports
            .get_mut(port.as_u16() as usize)
            .ok_or(DriverError::NoSuchDevice(port))?;
        let config = dev
            .config
            .as_ref()
            .ok_or_else(|| DriverError::InvalidArgument("device not configured".to_string()))?;
        if queue.as_u16() >= config.rx_queues {
            return Err(DriverError::InvalidArgument(format!(
                "rx queue {queue} out of range"
            )));
        }
        dev.rx_queues.push(queue);
        dev.rx_pool = Some(pool.clone());
        Ok(())
    }

    fn tx_queue_setup(
        &mut self,
        port: PortId,
        queue: QueueId,
        _descriptors: u16,
        _socket: SocketId,
    ) -> Result<(), DriverError> {
        let mut state = self.state();
        let dev = state
            .ports
            .get_mut(port.as_u16() as usize)
            .ok_or(DriverError::NoSuchDevice(port))?;
        let config = dev
            .config
            .as_ref()
            .ok_or_else(|| DriverError::InvalidArgument("device not configured".to_string()))?;
        if queue.as_u16() >= config.tx_queues {
            return Err(DriverError::InvalidArgument(format!(
                "tx queue {queue} out of range"
            )));
        }
        dev.tx_queues.push(queue);
        Ok(())
    }

    fn dev_start(&mut self, port: PortId) -> Result<(), DriverError> {
        let mut state = self.state();
        let dev = state
            .ports
            .get_mut(port.as_u16() as usize)
            .ok_or(DriverError::NoSuchDevice(port))?;
        if dev.config.is_none() {
            return Err(DriverError::InvalidArgument(
                "device not configured".to_string(),
            ));
        }
        dev.started = true;
        Ok(())
    }

    fn dev_stop(&mut self, port: PortId) {
        if let Some(dev) = self.state().ports.get_mut(port.as_u16() as usize) {
            dev.started = false;
        }
    }

    fn promiscuous_enable(&mut self, port: PortId) {
        if let Some(dev) = self.state().ports.get_mut(port.as_u16() as usize) {
            dev.promisc = true;
        }
    }

    fn rx_burst(&mut self, port: PortId, queue: QueueId, max: usize) -> Burst<TestMbuf> {
        let mut burst = Burst::new();
        let mut state = self.state();
        state.rx_polled.insert((port.as_u16(), queue.as_u16()));
        let Some(dev) = state.ports.get_mut(port.as_u16() as usize) else {
            return burst;
        };
        if !dev.started {
            return burst;
        }
        let Some(pool) = dev.rx_pool.clone() else {
            return burst;
        };
        let take = max.min(MAX_BURST);
        while burst.len() < take {
            let Some(frame) = dev.rx_pending.pop_front() else {
                break;
            };
            match pool.alloc() {
                Ok(mut mbuf) => {
                    if mbuf.put(&frame).is_err() {
                        // oversized feed frames are dropped, as a NIC would
                        continue;
                    }
                    burst.push(mbuf);
                }
                Err(BufferAllocationError) => {
                    // pool exhausted: leave the frame queued
                    dev.rx_pending.push_front(frame);
                    break;
                }
            }
        }
        burst
    }

    fn tx_burst(&mut self, port: PortId, _queue: QueueId, frames: Burst<TestMbuf>) -> Burst<TestMbuf> {
        let mut state = self.state();
        let Some(dev) = state.ports.get_mut(port.as_u16() as usize) else {
            return frames;
        };
        if !dev.started {
            return frames;
        }
        let accept = dev.tx_accept_limit.unwrap_or(frames.len()).min(frames.len());
        let mut refused = Burst::new();
        for (position, mbuf) in frames.into_iter().enumerate() {
            if position < accept {
                dev.tx_sink.push(mbuf.data().to_vec());
            } else {
                refused.push(mbuf);
            }
        }
        refused
    }
}
