// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! A poll-mode port and its deferred-transmit ring.

use crate::{BURST_SIZE, RX_RING_NUM, RX_RING_SIZE, TX_RING_NUM, TX_RING_SIZE};
use arrayvec::ArrayVec;
use pmd::{Burst, DevConfig, Driver, DriverError, MbufPool, PortId, QueueId};
use tracing::{debug, error};

/// Capacity of the deferred-transmit ring: one full receive burst per
/// receive ring always fits, so deferring after a receive never overflows.
pub(crate) const TX_BURST_CAPACITY: usize = BURST_SIZE * RX_RING_NUM as usize;

/// Name of the memory pool backing a port.
pub(crate) fn pool_name(port: PortId) -> String {
    format!("MBUF_POOL{}", port.as_u16())
}

/// Frames waiting on a bridged NIC that refused (part of) an earlier burst.
///
/// An owned ordered sequence of exactly the pending frames: a fully
/// drained ring is empty. Single producer (the engine while receiving) and
/// single consumer (the engine while draining), no synchronization needed.
#[derive(Debug)]
pub(crate) struct TxRing<B> {
    frames: ArrayVec<B, TX_BURST_CAPACITY>,
}

impl<B> TxRing<B> {
    pub(crate) fn new() -> TxRing<B> {
        TxRing {
            frames: ArrayVec::new(),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Queue a frame behind the ones already waiting.
    pub(crate) fn defer(&mut self, frame: B) {
        if let Err(err) = self.frames.try_push(frame) {
            // sized for one full receive burst per ring; getting here means
            // the drain-first policy was violated upstream
            error!("deferred-transmit ring overflow, releasing frame");
            drop(err.element());
        }
    }

    /// Remove every pending frame for one submission attempt.
    pub(crate) fn take(&mut self) -> Burst<B> {
        self.frames.drain(..).collect()
    }

    /// Put back the frames the device refused. Order is preserved.
    pub(crate) fn restore(&mut self, refused: Burst<B>) {
        self.frames.extend(refused);
    }

    /// Release every pending frame.
    pub(crate) fn clear(&mut self) {
        self.frames.clear();
    }
}

/// A NIC device owned by the context, shared by its instances.
pub(crate) struct Port<D: Driver> {
    pub id: PortId,
    pub pool: D::Pool,
    pub rx_rings: u16,
    pub tx_rings: u16,
    pub tx_pending: TxRing<D::Mbuf>,
    pub started: bool,
    pub refcnt: usize,
}

impl<D: Driver> std::fmt::Debug for Port<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("id", &self.id)
            .field("pool", &self.pool.name())
            .field("rx_rings", &self.rx_rings)
            .field("tx_rings", &self.tx_rings)
            .field("tx_pending", &self.tx_pending)
            .field("started", &self.started)
            .field("refcnt", &self.refcnt)
            .finish()
    }
}

impl<D: Driver> Port<D> {
    pub(crate) fn new(id: PortId, pool: D::Pool) -> Port<D> {
        Port {
            id,
            pool,
            rx_rings: RX_RING_NUM,
            tx_rings: TX_RING_NUM,
            tx_pending: TxRing::new(),
            started: false,
            refcnt: 1,
        }
    }

    /// Configure the fixed single-ring queue layout and start the device.
    pub(crate) fn start(&mut self, driver: &mut D, promisc: bool) -> Result<(), DriverError> {
        let config = DevConfig {
            rx_queues: RX_RING_NUM,
            tx_queues: TX_RING_NUM,
            ..DevConfig::default()
        };
        driver.dev_configure(self.id, &config)?;
        self.rx_rings = config.rx_queues;
        self.tx_rings = config.tx_queues;

        let socket = driver.dev_socket(self.id);
        for queue in 0..self.rx_rings {
            driver.rx_queue_setup(self.id, QueueId(queue), RX_RING_SIZE, socket, &self.pool)?;
        }
        for queue in 0..self.tx_rings {
            driver.tx_queue_setup(self.id, QueueId(queue), TX_RING_SIZE, socket)?;
        }
        driver.dev_start(self.id)?;
        self.started = true;
        if promisc {
            driver.promiscuous_enable(self.id);
        }
        debug!(port = %self.id, "device started");
        Ok(())
    }

    /// Release pending deferred frames and stop a started device.
    pub(crate) fn release(&mut self, driver: &mut D) {
        if self.started {
            self.tx_pending.clear();
            driver.dev_stop(self.id);
            self.started = false;
        }
    }
}
