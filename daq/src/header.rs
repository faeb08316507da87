// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! The per-frame packet header handed to the analysis callback.

use core::fmt::{self, Display};
use std::time::SystemTime;

/// Stable index of a logical interface (module instance).
///
/// Assigned monotonically per context at instance creation and reported to
/// the host as the ingress/egress interface of every frame.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceIndex(pub u32);

impl InterfaceIndex {
    /// The index as a `u32`.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for InterfaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for InterfaceIndex {
    fn from(value: u32) -> InterfaceIndex {
        InterfaceIndex(value)
    }
}

/// Index of an interface group. Never assigned by this module.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupIndex(pub u32);

/// Metadata describing one acquired frame.
///
/// The callback receives the header together with a borrowed view of the
/// frame contents; ownership of the underlying buffer stays with the
/// engine, which decides the frame's disposition after the callback
/// returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PktHdr {
    /// Wall-clock timestamp, captured once at acquire-loop entry.
    pub ts: SystemTime,
    /// Captured length of the frame.
    pub caplen: u32,
    /// Original length of the frame on the wire.
    pub pktlen: u32,
    /// Interface the frame arrived on.
    pub ingress: Option<InterfaceIndex>,
    /// Interface a passed frame will leave on, when bridged.
    pub egress: Option<InterfaceIndex>,
    /// Group of the ingress interface. Unknown here.
    pub ingress_group: Option<GroupIndex>,
    /// Group of the egress interface. Unknown here.
    pub egress_group: Option<GroupIndex>,
    /// Per-frame flag bits. Always zero for this module.
    pub flags: u32,
    /// Opaque host cookie. Always zero for this module.
    pub opaque: u32,
    /// Address space of the originating traffic. Always zero here.
    pub address_space_id: u16,
}
