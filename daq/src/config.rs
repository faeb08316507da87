// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Host configuration handed to a module at initialization.

use std::collections::BTreeMap;

/// How the host wants to run the module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DaqMode {
    /// Tap: observe traffic, never forward.
    #[default]
    Passive,
    /// Bridge pairs of interfaces and forward passed frames between them.
    Inline,
}

bitflags::bitflags! {
    /// Boolean configuration switches.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
    pub struct ConfigFlags: u32 {
        /// Put every device into promiscuous mode after starting it.
        const PROMISC = 0x01;
    }
}

/// The configuration record a module is initialized from.
///
/// `values` is the free-form key/value dictionary of the host configuration
/// file; this module consumes `dpdk_args` (required) and `debug`
/// (presence enables verbose logging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaqConfig {
    /// Device specification string, e.g. `"dpdk0:dpdk1"`.
    pub name: String,
    /// Capture length passed to the filter compiler.
    pub snaplen: u32,
    /// Idle timeout of one acquire call in milliseconds; `<= 0` disables it.
    pub timeout_ms: i32,
    /// Passive tap or inline bridging.
    pub mode: DaqMode,
    /// Boolean switches.
    pub flags: ConfigFlags,
    /// Free-form configuration dictionary.
    pub values: BTreeMap<String, String>,
}

impl DaqConfig {
    /// A configuration for `name` with host-typical defaults: snaplen 1518,
    /// no timeout, passive mode, no flags, empty dictionary.
    #[must_use]
    pub fn new(name: impl Into<String>) -> DaqConfig {
        DaqConfig {
            name: name.into(),
            snaplen: 1518,
            timeout_ms: -1,
            mode: DaqMode::Passive,
            flags: ConfigFlags::empty(),
            values: BTreeMap::new(),
        }
    }

    /// Insert a dictionary entry, builder style.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> DaqConfig {
        self.values.insert(key.into(), value.into());
        self
    }
}
