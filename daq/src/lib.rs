// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Host-side contracts of the data-acquisition (DAQ) framework.
//!
//! This crate defines what the host IDS/IPS engine and an acquisition module
//! agree on: packet verdicts and their translation, the per-frame packet
//! header, statistics, configuration, error kinds, capability bits, the
//! module descriptor trait, and the packet-filter compiler contract. It
//! deliberately contains no packet I/O of its own.

#![forbid(unsafe_code)]
#![deny(missing_docs, clippy::all)]

pub mod config;
pub mod error;
pub mod filter;
pub mod header;
pub mod module;
pub mod stats;
pub mod verdict;

pub use config::{ConfigFlags, DaqConfig, DaqMode};
pub use error::DaqError;
pub use filter::{DataLink, FilterCompileError, FilterCompiler, FilterProgram};
pub use header::{GroupIndex, InterfaceIndex, PktHdr};
pub use module::{
    Capabilities, DAQ_API_VERSION, DaqModule, DaqState, ModuleInfo, ModuleKind,
};
pub use stats::DaqStats;
pub use verdict::{Disposition, Verdict};
