// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! The module descriptor: what an acquisition module exposes to the host.

use crate::error::DaqError;
use crate::filter::DataLink;
use crate::header::{InterfaceIndex, PktHdr};
use crate::stats::DaqStats;
use crate::verdict::Verdict;

/// Version of the module API this crate describes.
pub const DAQ_API_VERSION: u32 = 0x0001_0002;

bitflags::bitflags! {
    /// Classification bits of a module.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ModuleKind: u32 {
        /// Can read traffic from a capture file.
        const FILE_CAPABLE = 0x01;
        /// Can source traffic from live interfaces.
        const INTF_CAPABLE = 0x02;
        /// Can operate inline and enforce block verdicts.
        const INLINE_CAPABLE = 0x04;
        /// Multiple contexts may coexist in one process.
        const MULTI_INSTANCE = 0x08;
        /// Requires privileges for the whole lifetime, not just startup.
        const NO_UNPRIV = 0x10;
    }
}

bitflags::bitflags! {
    /// Capability bits reported by a module context.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        /// Honors block verdicts.
        const BLOCK = 0x001;
        /// Honors replace verdicts.
        const REPLACE = 0x002;
        /// Supports packet injection.
        const INJECT = 0x004;
        /// Honors whitelist verdicts.
        const WHITELIST = 0x008;
        /// Honors blacklist verdicts.
        const BLACKLIST = 0x010;
        /// Can start without elevated privileges.
        const UNPRIV_START = 0x020;
        /// Supports interrupting the acquire loop.
        const BREAKLOOP = 0x040;
        /// Supports BPF filtering.
        const BPF = 0x080;
        /// Reports meaningful interface indexes in packet headers.
        const DEVICE_INDEX = 0x100;
    }
}

/// The constant descriptor record of a module.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module API version the module was built against.
    pub api_version: u32,
    /// Version of the module itself.
    pub module_version: u32,
    /// Short name the host selects the module by.
    pub name: &'static str,
    /// Classification bits.
    pub kind: ModuleKind,
}

/// Lifecycle state of a module context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DaqState {
    /// Freshly allocated, not yet configured.
    #[default]
    Uninitialized,
    /// Configured; devices exist but are not running.
    Initialized,
    /// Devices running; acquire may be called.
    Started,
    /// Devices released; only shutdown remains.
    Stopped,
}

/// The operations of an acquisition module, one per descriptor slot.
///
/// Context construction (`initialize`) is an inherent constructor on each
/// module type since its collaborators are module-specific. The optional
/// descriptor hooks (flow modification, hot-reload) are not part of this
/// trait; a module without them simply has nothing to implement.
pub trait DaqModule {
    /// Descriptor record of this module.
    const INFO: ModuleInfo;

    /// Compile `filter` and install it, replacing any previous program.
    ///
    /// # Errors
    ///
    /// Fails with [`DaqError::Failure`] when the expression does not
    /// compile; the previously installed program stays in effect.
    fn set_filter(&mut self, filter: &str) -> Result<(), DaqError>;

    /// Start every device owned by the context.
    ///
    /// # Errors
    ///
    /// Fails when a device cannot be configured or started; the context may
    /// be left partially started and should be shut down.
    fn start(&mut self) -> Result<(), DaqError>;

    /// Run the acquisition loop.
    ///
    /// Delivers up to `cnt` frames to `callback` (`cnt <= 0` means
    /// unbounded) and returns the number delivered. Returns early on
    /// breakloop, or after the configured idle timeout elapses without
    /// receive or transmit progress.
    ///
    /// # Errors
    ///
    /// Fails with [`DaqError::Invalid`] when the context is not started.
    fn acquire<F>(&mut self, cnt: i32, callback: F) -> Result<usize, DaqError>
    where
        F: FnMut(&PktHdr, &[u8]) -> Verdict;

    /// Transmit a host-supplied frame on the interface recorded in `hdr`,
    /// or on its bridge peer unless `reverse`.
    ///
    /// # Errors
    ///
    /// [`DaqError::NoDevice`] when the interface (or required peer) does
    /// not exist, [`DaqError::NoMemory`] when no buffer is available, and
    /// [`DaqError::Again`] when the device refuses the frame.
    fn inject(&mut self, hdr: &PktHdr, payload: &[u8], reverse: bool) -> Result<(), DaqError>;

    /// Ask a concurrently running acquire call to return at the next
    /// instance boundary.
    fn breakloop(&mut self);

    /// Release every device and interface; the context keeps only its
    /// statistics and error buffer.
    ///
    /// # Errors
    ///
    /// Fails with [`DaqError::Invalid`] when the context is not started.
    fn stop(&mut self) -> Result<(), DaqError>;

    /// Tear the context down.
    fn shutdown(self)
    where
        Self: Sized;

    /// Current lifecycle state.
    fn check_status(&self) -> DaqState;

    /// Snapshot of the statistics counters.
    fn stats(&self) -> DaqStats;

    /// Zero the statistics counters.
    fn reset_stats(&mut self);

    /// Configured capture length.
    fn snaplen(&self) -> u32;

    /// Capability bits of this context.
    fn capabilities(&self) -> Capabilities;

    /// Link-layer type of delivered frames.
    fn datalink_type(&self) -> DataLink;

    /// Description of the most recent failure.
    fn errbuf(&self) -> &str;

    /// Overwrite the error buffer with a host-supplied message.
    fn set_errbuf(&mut self, message: &str);

    /// Map a device name (e.g. `"dpdk0"`) to the index of the first
    /// interface on that device.
    ///
    /// # Errors
    ///
    /// Fails with [`DaqError::NoDevice`] for unknown or malformed names.
    fn device_index(&self, device: &str) -> Result<InterfaceIndex, DaqError>;
}
