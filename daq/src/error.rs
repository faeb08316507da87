// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Error kinds shared across the module API.

/// The error kinds a module operation may fail with.
///
/// Success is `Ok(_)`; a human-readable description of the most recent
/// failure is kept in the context's error buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DaqError {
    /// Unclassified failure.
    #[error("operation failed")]
    Failure,
    /// An allocation failed.
    #[error("out of memory")]
    NoMemory,
    /// A named device or interface does not exist.
    #[error("no such device")]
    NoDevice,
    /// Malformed argument or configuration, or an out-of-order operation.
    #[error("invalid argument")]
    Invalid,
    /// Transient condition; the caller may retry.
    #[error("try again")]
    Again,
}
