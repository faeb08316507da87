// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! A logical interface: a (port, receive-queue) binding with a stable index.

use daq::InterfaceIndex;
use pmd::QueueId;

/// One logical interface exposed to the host.
///
/// `port` and `peer` are positions in the context's port and instance
/// lists; the context owns everything, peering is a non-owning index.
/// When `peer` is set, peering is symmetric.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Instance {
    /// Stable index reported in packet headers.
    pub index: InterfaceIndex,
    /// Owning port, as a position in the context's port list.
    pub port: usize,
    /// Receive (and transmit) queue used on that port.
    pub queue: QueueId,
    /// Bridge peer, as a position in the context's instance list.
    pub peer: Option<usize>,
}
