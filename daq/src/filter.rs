// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Packet-filter (BPF) compiler contract.
//!
//! Compilation is delegated to an external compiler; this crate only pins
//! down the seam between it and an acquisition module. A compiled program
//! is consulted per frame before the analysis callback runs.

#[cfg(any(doc, test, feature = "testing"))]
pub mod test_filter;

/// Link-layer header type of the frames a filter runs over.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataLink {
    /// Ethernet II (`DLT_EN10MB`).
    Ethernet,
}

impl DataLink {
    /// The libpcap DLT value.
    #[must_use]
    pub const fn dlt(self) -> u32 {
        match self {
            DataLink::Ethernet => 1,
        }
    }
}

/// A filter expression that did not compile.
#[derive(Debug, thiserror::Error)]
#[error("filter compilation failed: {reason}")]
pub struct FilterCompileError {
    /// Compiler diagnostic.
    pub reason: String,
}

/// A compiled filter program.
pub trait FilterProgram {
    /// Decide whether a frame is of interest.
    ///
    /// `wirelen` is the original length of the frame on the wire; `frame`
    /// may be a truncated capture of it. Returning `false` filters the
    /// frame out before the analysis callback.
    fn matches(&self, frame: &[u8], wirelen: u32) -> bool;
}

/// The external filter compiler collaborating with a module.
pub trait FilterCompiler {
    /// The program type this compiler produces.
    type Program: FilterProgram;

    /// Compile `expr` for frames of `linktype` captured at `snaplen`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterCompileError`] when the expression does not compile.
    fn compile(
        &self,
        expr: &str,
        snaplen: u32,
        linktype: DataLink,
        optimize: bool,
    ) -> Result<Self::Program, FilterCompileError>;
}
